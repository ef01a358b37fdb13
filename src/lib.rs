pub mod access;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod engagement;
pub mod entities;
pub mod error;
pub mod extract;
pub mod identity;
pub mod import;
pub mod models;
pub mod moderation;
pub mod routes;
pub mod tmdb;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::AuthKeys, catalog::CatalogStore, config::Config, engagement::EngagementStore,
    identity::IdentityStore, moderation::ModerationService, tmdb::TmdbClient,
};

pub struct AppState {
    pub keys: AuthKeys,
    pub identity: IdentityStore,
    pub catalog: CatalogStore,
    pub engagement: EngagementStore,
    pub moderation: ModerationService,
    pub tmdb: TmdbClient,
}

impl AppState {
    pub fn new(config: &Config, db: DatabaseConnection, http: reqwest::Client) -> Self {
        let keys = AuthKeys::new(&config.jwt_secret, config.token_ttl_minutes);
        Self {
            identity: IdentityStore::new(db.clone(), keys.clone()),
            catalog: CatalogStore::new(db.clone()),
            engagement: EngagementStore::new(db.clone()),
            moderation: ModerationService::new(db),
            tmdb: TmdbClient::new(
                http,
                config.tmdb_access_token.clone(),
                config.tmdb_base_url.clone(),
                config.tmdb_rps,
            ),
            keys,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/account/signup", post(routes::signup))
        .route("/account/login", post(routes::login))
        .route("/main-page", get(routes::main_page))
        .route("/movies", get(routes::list_movies).delete(routes::remove_movie))
        .route("/movies/{movie_id}", get(routes::movie_details))
        .route("/favorites", get(routes::my_favorites))
        .route("/favorites/toggle", post(routes::toggle_favorite))
        .route("/reviews", post(routes::add_review).delete(routes::remove_review))
        .route("/reviews/mine", get(routes::my_reviews))
        .route("/users", get(routes::list_users))
        .route("/users/block-toggle", post(routes::toggle_user_block))
        .route("/tmdb/search", get(routes::tmdb_search))
        .route("/tmdb/movies", post(routes::import_movie))
        .route("/tmdb/movies/{movie_id}", get(routes::tmdb_preview))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}
