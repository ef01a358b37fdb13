use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(string(Users::Username).primary_key())
                    .col(string(Users::PasswordHash))
                    .col(string(Users::DisplayName))
                    .col(string(Users::Email))
                    .col(string(Users::Role))
                    .col(string(Users::Status))
                    .col(big_integer(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(integer(Movies::ExternalId).primary_key())
                    .col(string(Movies::Title))
                    .col(string_null(Movies::OriginalTitle))
                    .col(string_null(Movies::ReleaseDate))
                    .col(integer_null(Movies::Runtime))
                    .col(text_null(Movies::Overview))
                    .col(string_null(Movies::Tagline))
                    .col(string_null(Movies::PosterPath))
                    .col(string_null(Movies::BackdropPath))
                    .col(double_null(Movies::VoteAverage))
                    .col(integer_null(Movies::VoteCount))
                    .col(double_null(Movies::Popularity))
                    .col(json(Movies::Genres))
                    .col(big_integer(Movies::ImportedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_title")
                    .table(Movies::Table)
                    .col(Movies::Title)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieCast::Table)
                    .if_not_exists()
                    .col(integer(MovieCast::MovieId).primary_key())
                    .col(json(MovieCast::Members))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieVideos::Table)
                    .if_not_exists()
                    .col(integer(MovieVideos::MovieId).primary_key())
                    .col(json(MovieVideos::Entries))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieVideos::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieCast::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Username,
    PasswordHash,
    DisplayName,
    Email,
    Role,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    ExternalId,
    Title,
    OriginalTitle,
    ReleaseDate,
    Runtime,
    Overview,
    Tagline,
    PosterPath,
    BackdropPath,
    VoteAverage,
    VoteCount,
    Popularity,
    Genres,
    ImportedAt,
}

#[derive(DeriveIden)]
enum MovieCast {
    Table,
    MovieId,
    Members,
}

#[derive(DeriveIden)]
enum MovieVideos {
    Table,
    MovieId,
    Entries,
}
