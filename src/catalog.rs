use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::{
    db::now_sec,
    entities::{movie, movie_cast, movie_videos},
    error::{AppError, AppResult},
    identity::is_unique_violation,
    models::{Category, Movie, MovieBundle, MoviePage},
};

const MAX_PAGE_SIZE: u64 = 100;
const MOVIES_PER_CATEGORY: usize = 10;

#[derive(Clone)]
pub struct CatalogStore {
    db: DatabaseConnection,
}

impl CatalogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn exists(&self, movie_id: i32) -> AppResult<bool> {
        Ok(movie::Entity::find_by_id(movie_id).one(&self.db).await?.is_some())
    }

    pub async fn list(&self, query: Option<&str>, page: u64, limit: u64) -> AppResult<MoviePage> {
        if page == 0 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        // The paginator multiplies page by limit for the OFFSET, which SQLite binds as i64.
        if (page - 1).checked_mul(limit).is_none_or(|offset| offset > i64::MAX as u64) {
            return Err(AppError::validation("page is out of range"));
        }

        let mut select = movie::Entity::find().order_by_asc(movie::Column::Title);
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            select = select.filter(movie::Column::Title.contains(q));
        }

        let paginator = select.paginate(&self.db, limit);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        Ok(MoviePage {
            page,
            results: rows.into_iter().map(Movie::try_from).collect::<Result<_, _>>()?,
            total_pages: totals.number_of_pages,
            total_results: totals.number_of_items,
        })
    }

    pub async fn bundle(&self, movie_id: i32) -> AppResult<MovieBundle> {
        let movie = movie::Entity::find_by_id(movie_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Movie not found in local database"))?;

        let cast = match movie_cast::Entity::find_by_id(movie_id).one(&self.db).await? {
            Some(row) => serde_json::from_value(row.members)?,
            None => Vec::new(),
        };
        let videos = match movie_videos::Entity::find_by_id(movie_id).one(&self.db).await? {
            Some(row) => serde_json::from_value(row.entries)?,
            None => Vec::new(),
        };

        Ok(MovieBundle { movie: Movie::try_from(movie)?, cast, videos })
    }

    /// Groups stored movies by genre for the landing page.
    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        let rows = movie::Entity::find()
            .order_by_desc(movie::Column::Popularity)
            .order_by_asc(movie::Column::Title)
            .all(&self.db)
            .await?;

        let mut categories: Vec<Category> = Vec::new();
        for row in rows {
            let movie = Movie::try_from(row)?;
            for genre in &movie.genres {
                let idx = match categories.iter().position(|c| c.genre == genre.name) {
                    Some(idx) => idx,
                    None => {
                        categories.push(Category { genre: genre.name.clone(), movies: Vec::new() });
                        categories.len() - 1
                    },
                };
                if categories[idx].movies.len() < MOVIES_PER_CATEGORY {
                    categories[idx].movies.push(movie.clone());
                }
            }
        }
        Ok(categories)
    }

    /// Stores an imported movie with its cast and videos in one transaction.
    pub async fn insert_bundle(&self, bundle: &MovieBundle) -> AppResult<()> {
        let m = &bundle.movie;
        let movie_id = m.id;

        let model = movie::ActiveModel {
            external_id: Set(movie_id),
            title: Set(m.title.clone()),
            original_title: Set(m.original_title.clone()),
            release_date: Set(m.release_date.clone()),
            runtime: Set(m.runtime),
            overview: Set(m.overview.clone()),
            tagline: Set(m.tagline.clone()),
            poster_path: Set(m.poster_path.clone()),
            backdrop_path: Set(m.backdrop_path.clone()),
            vote_average: Set(m.vote_average),
            vote_count: Set(m.vote_count),
            popularity: Set(m.popularity),
            genres: Set(serde_json::to_value(&m.genres)?),
            imported_at: Set(now_sec()),
        };
        let cast = movie_cast::ActiveModel {
            movie_id: Set(movie_id),
            members: Set(serde_json::to_value(&bundle.cast)?),
        };
        let videos = movie_videos::ActiveModel {
            movie_id: Set(movie_id),
            entries: Set(serde_json::to_value(&bundle.videos)?),
        };

        let txn = self.db.begin().await?;

        if let Err(err) = movie::Entity::insert(model).exec_without_returning(&txn).await {
            if is_unique_violation(&err) {
                return Err(AppError::conflict("Movie already exists in local database"));
            }
            return Err(err.into());
        }
        // Leftovers from a partially failed removal must not block a re-import.
        movie_cast::Entity::delete_by_id(movie_id).exec(&txn).await?;
        movie_videos::Entity::delete_by_id(movie_id).exec(&txn).await?;
        movie_cast::Entity::insert(cast).exec_without_returning(&txn).await?;
        movie_videos::Entity::insert(videos).exec_without_returning(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            movie_id,
            title = %m.title,
            cast = bundle.cast.len(),
            videos = bundle.videos.len(),
            "movie imported"
        );
        Ok(())
    }
}
