use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(string(Reviews::Id).primary_key())
                    .col(integer(Reviews::MovieId))
                    .col(string(Reviews::Username))
                    .col(double(Reviews::Rating))
                    .col(text(Reviews::Comment))
                    .col(big_integer(Reviews::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // One review per user per movie.
        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_movie_username")
                    .table(Reviews::Table)
                    .col(Reviews::MovieId)
                    .col(Reviews::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_username")
                    .table(Reviews::Table)
                    .col(Reviews::Username)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Favourites::Table)
                    .if_not_exists()
                    .col(pk_auto(Favourites::Id))
                    .col(string(Favourites::Username))
                    .col(integer(Favourites::MovieId))
                    .col(big_integer(Favourites::AddedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_favourites_username_movie")
                    .table(Favourites::Table)
                    .col(Favourites::Username)
                    .col(Favourites::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_favourites_movie")
                    .table(Favourites::Table)
                    .col(Favourites::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Favourites::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Reviews::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    MovieId,
    Username,
    Rating,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Favourites {
    Table,
    Id,
    Username,
    MovieId,
    AddedAt,
}
