//! Favourite edges and per-movie review collections.
//!
//! Both invariants (one edge per user and movie, one review per user and
//! movie) are carried by unique indexes, so concurrent callers never produce
//! duplicates regardless of interleaving.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

use crate::{
    db::now_sec,
    entities::{favourite, review},
    error::{AppError, AppResult},
    identity::is_unique_violation,
    models::{ReviewEntry, ToggleOutcome},
};

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

#[derive(Clone)]
pub struct EngagementStore {
    db: DatabaseConnection,
}

impl EngagementStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Deletes the edge if present, otherwise creates it. Each call flips the
    /// state once; concurrent calls leave zero or one edge behind.
    pub async fn toggle_favorite(&self, username: &str, movie_id: i32) -> AppResult<ToggleOutcome> {
        let removed = favourite::Entity::delete_many()
            .filter(favourite::Column::Username.eq(username))
            .filter(favourite::Column::MovieId.eq(movie_id))
            .exec(&self.db)
            .await?
            .rows_affected;

        if removed > 0 {
            tracing::info!(username = %username, movie_id, "favourite removed");
            return Ok(ToggleOutcome { favorited: false });
        }

        let edge = favourite::ActiveModel {
            id: Default::default(),
            username: Set(username.to_string()),
            movie_id: Set(movie_id),
            added_at: Set(now_sec()),
        };
        let inserted = favourite::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([favourite::Column::Username, favourite::Column::MovieId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted == 0 {
            // A concurrent toggle created the edge first; the pair is favourited either way.
            tracing::debug!(username = %username, movie_id, "favourite already present");
        } else {
            tracing::info!(username = %username, movie_id, "favourite added");
        }
        Ok(ToggleOutcome { favorited: true })
    }

    pub async fn add_review(
        &self,
        username: &str,
        movie_id: i32,
        rating: f64,
        comment: &str,
    ) -> AppResult<ReviewEntry> {
        validate_review(rating, comment)?;

        let model = review::Model {
            id: uuid::Uuid::new_v4().to_string(),
            movie_id,
            username: username.to_string(),
            rating,
            comment: comment.trim().to_string(),
            created_at: now_sec(),
        };
        let active = review::ActiveModel {
            id: Set(model.id.clone()),
            movie_id: Set(model.movie_id),
            username: Set(model.username.clone()),
            rating: Set(model.rating),
            comment: Set(model.comment.clone()),
            created_at: Set(model.created_at),
        };

        match review::Entity::insert(active).exec_without_returning(&self.db).await {
            Ok(_) => {},
            Err(err) if is_unique_violation(&err) => {
                return Err(AppError::conflict("You have already reviewed this movie"));
            },
            Err(err) => return Err(err.into()),
        }

        tracing::info!(username = %username, movie_id, review_id = %model.id, "review added");
        Ok(model.into())
    }

    /// Removes one entry from a movie's reviews. An absent entry is NotFound.
    pub async fn remove_review(&self, movie_id: i32, review_id: &str) -> AppResult<()> {
        let removed = review::Entity::delete_many()
            .filter(review::Column::MovieId.eq(movie_id))
            .filter(review::Column::Id.eq(review_id))
            .exec(&self.db)
            .await?
            .rows_affected;

        if removed == 0 {
            return Err(AppError::not_found("Review not found or already removed"));
        }
        tracing::info!(movie_id, review_id = %review_id, "review removed");
        Ok(())
    }

    pub async fn reviews_for_movie(&self, movie_id: i32) -> AppResult<Vec<ReviewEntry>> {
        let rows = review::Entity::find()
            .filter(review::Column::MovieId.eq(movie_id))
            .order_by_asc(review::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ReviewEntry::from).collect())
    }

    pub async fn is_favorite(&self, username: &str, movie_id: i32) -> AppResult<bool> {
        let edge = favourite::Entity::find()
            .filter(favourite::Column::Username.eq(username))
            .filter(favourite::Column::MovieId.eq(movie_id))
            .one(&self.db)
            .await?;
        Ok(edge.is_some())
    }

    /// Movie ids the user has favourited, newest first.
    pub async fn list_favorites(&self, username: &str) -> AppResult<Vec<i32>> {
        let rows = favourite::Entity::find()
            .filter(favourite::Column::Username.eq(username))
            .order_by_desc(favourite::Column::AddedAt)
            .order_by_desc(favourite::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|f| f.movie_id).collect())
    }

    pub async fn list_reviews_by_user(&self, username: &str) -> AppResult<Vec<ReviewEntry>> {
        let rows = review::Entity::find()
            .filter(review::Column::Username.eq(username))
            .order_by_desc(review::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ReviewEntry::from).collect())
    }
}

pub fn validate_review(rating: f64, comment: &str) -> AppResult<()> {
    if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    if comment.trim().is_empty() {
        return Err(AppError::validation("comment is required"));
    }
    Ok(())
}
