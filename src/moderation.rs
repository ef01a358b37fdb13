use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, DeleteResult, EntityTrait, QueryFilter,
    sea_query::Expr,
};
use tracing::{info, warn};

use crate::{
    entities::{favourite, movie, movie_cast, movie_videos, review, user},
    error::{AppError, AppResult},
    models::{RemovalReport, Role, UserStatus},
};

/// Status flips race with each other only through the compare-and-set below.
const STATUS_CAS_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct ModerationService {
    db: DatabaseConnection,
}

impl ModerationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Removes a movie and everything referencing it. Each sub-delete is
    /// independent: a failure is recorded in the report and the remaining
    /// deletes still run. Removing an absent movie is a no-op.
    ///
    /// Dependents go first so a failure leaves the movie visible and the
    /// removal can simply be repeated.
    pub async fn remove_movie(&self, movie_id: i32) -> RemovalReport {
        let mut report = RemovalReport::default();

        let res = favourite::Entity::delete_many()
            .filter(favourite::Column::MovieId.eq(movie_id))
            .exec(&self.db)
            .await;
        report.counts.favorites = tally(&mut report.failed, "favorites", movie_id, res);

        let res = review::Entity::delete_many()
            .filter(review::Column::MovieId.eq(movie_id))
            .exec(&self.db)
            .await;
        report.counts.reviews = tally(&mut report.failed, "reviews", movie_id, res);

        let res = movie_videos::Entity::delete_by_id(movie_id).exec(&self.db).await;
        report.counts.videos = tally(&mut report.failed, "videos", movie_id, res);

        let res = movie_cast::Entity::delete_by_id(movie_id).exec(&self.db).await;
        report.counts.cast = tally(&mut report.failed, "cast", movie_id, res);

        let res = movie::Entity::delete_by_id(movie_id).exec(&self.db).await;
        report.counts.movie = tally(&mut report.failed, "movie", movie_id, res);

        info!(
            movie_id,
            movie = report.counts.movie,
            cast = report.counts.cast,
            videos = report.counts.videos,
            reviews = report.counts.reviews,
            favorites = report.counts.favorites,
            failed = report.failed.len(),
            "movie removed"
        );
        report
    }

    /// Flips a non-admin account between active and blocked. Existing
    /// favourites and reviews of the account are left untouched.
    pub async fn toggle_user_block(&self, username: &str) -> AppResult<UserStatus> {
        for _ in 0..STATUS_CAS_ATTEMPTS {
            let account = user::Entity::find_by_id(username.to_string())
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::not_found("User not found"))?;

            if Role::from_code(&account.role) != Some(Role::User) {
                return Err(AppError::forbidden("Admin accounts cannot be blocked"));
            }

            let current = UserStatus::from_code(&account.status).unwrap_or(UserStatus::Active);
            let next = current.toggled();

            let updated = user::Entity::update_many()
                .col_expr(user::Column::Status, Expr::value(next.as_code()))
                .filter(user::Column::Username.eq(username))
                .filter(user::Column::Status.eq(account.status.as_str()))
                .filter(user::Column::Role.eq(Role::User.as_code()))
                .exec(&self.db)
                .await?
                .rows_affected;

            if updated == 1 {
                info!(username = %username, status = next.as_code(), "account status changed");
                return Ok(next);
            }
        }

        Err(AppError::conflict("Account status changed concurrently, try again"))
    }
}

fn tally(
    failed: &mut Vec<&'static str>,
    entity: &'static str,
    movie_id: i32,
    res: Result<DeleteResult, DbErr>,
) -> u64 {
    match res {
        Ok(r) => r.rows_affected,
        Err(err) => {
            warn!(movie_id, entity, error = %err, "cascading delete step failed");
            failed.push(entity);
            0
        },
    }
}
