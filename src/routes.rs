use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    access::{Action, authorize},
    auth::{Caller, MaybeCaller},
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam, QueryParams},
    identity::NewAccount,
    models::{
        AddReviewRequest, BlockToggleRequest, LoginRequest, MovieDetails, MovieIdRequest,
        MoviePage, RemoveReviewRequest, Role, SignupRequest, TokenResponse, UserStatus,
    },
};

type AppStateRef = State<Arc<AppState>>;

fn require_movie_id(movie_id: Option<i32>) -> AppResult<i32> {
    movie_id.ok_or_else(|| AppError::validation("movieId is required"))
}

async fn require_stored_movie(state: &AppState, movie_id: i32) -> AppResult<()> {
    if state.catalog.exists(movie_id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Movie not found in local database"))
    }
}

pub async fn signup(
    State(state): AppStateRef,
    JsonBody(req): JsonBody<SignupRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let token = state
        .identity
        .signup(NewAccount {
            username: &req.username,
            password: &req.password,
            display_name: &req.name,
            email: &req.mail,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

pub async fn login(
    State(state): AppStateRef,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state.identity.login(&req.username, &req.password).await?;
    Ok(Json(TokenResponse { token }))
}

pub async fn main_page(State(state): AppStateRef) -> AppResult<Json<Value>> {
    authorize(None, Action::Browse)?;
    let categories = state.catalog.categories().await?;
    Ok(Json(json!({ "categories": categories })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    query: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

pub async fn list_movies(
    State(state): AppStateRef,
    QueryParams(q): QueryParams<ListQuery>,
) -> AppResult<Json<MoviePage>> {
    authorize(None, Action::Browse)?;
    let page = state
        .catalog
        .list(q.query.as_deref(), q.page.unwrap_or(1), q.limit.unwrap_or(10))
        .await?;
    Ok(Json(page))
}

pub async fn movie_details(
    State(state): AppStateRef,
    MaybeCaller(caller): MaybeCaller,
    PathParam(movie_id): PathParam<i32>,
) -> AppResult<Json<MovieDetails>> {
    authorize(caller.as_ref(), Action::ViewMovie)?;

    let bundle = state.catalog.bundle(movie_id).await?;
    let reviews = state.engagement.reviews_for_movie(movie_id).await?;
    let favourite = match &caller {
        Some(identity) => state.engagement.is_favorite(&identity.username, movie_id).await?,
        None => false,
    };

    Ok(Json(MovieDetails {
        movie: bundle.movie,
        cast: bundle.cast,
        videos: bundle.videos,
        reviews,
        favourite,
    }))
}

pub async fn toggle_favorite(
    State(state): AppStateRef,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<MovieIdRequest>,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::ToggleFavorite)?;
    let movie_id = require_movie_id(req.movie_id)?;
    require_stored_movie(&state, movie_id).await?;

    let outcome = state.engagement.toggle_favorite(&caller.username, movie_id).await?;
    let message = if outcome.favorited {
        "Movie added to favourites"
    } else {
        "Movie removed from favourites"
    };
    Ok(Json(json!({ "favorited": outcome.favorited, "message": message })))
}

pub async fn add_review(
    State(state): AppStateRef,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<AddReviewRequest>,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::AddReview)?;
    let movie_id = require_movie_id(req.movie_id)?;
    let rating = req.rating.ok_or_else(|| AppError::validation("rating is required"))?;
    crate::engagement::validate_review(rating, &req.comment)?;
    require_stored_movie(&state, movie_id).await?;

    let review = state
        .engagement
        .add_review(&caller.username, movie_id, rating, &req.comment)
        .await?;
    Ok(Json(json!({ "message": "Review added successfully", "review": review })))
}

pub async fn remove_review(
    State(state): AppStateRef,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<RemoveReviewRequest>,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::RemoveReview)?;
    let movie_id = require_movie_id(req.movie_id)?;
    if req.review_id.trim().is_empty() {
        return Err(AppError::validation("reviewId is required"));
    }

    state.engagement.remove_review(movie_id, req.review_id.trim()).await?;
    tracing::info!(
        admin = %caller.username,
        movie_id,
        review_id = %req.review_id,
        "review moderated"
    );
    Ok(Json(json!({ "message": "Review removed successfully" })))
}

pub async fn remove_movie(
    State(state): AppStateRef,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<MovieIdRequest>,
) -> AppResult<Response> {
    authorize(Some(&caller), Action::RemoveMovie)?;
    let movie_id = require_movie_id(req.movie_id)?;

    let report = state.moderation.remove_movie(movie_id).await;
    tracing::info!(admin = %caller.username, movie_id, "movie removal requested");
    let status = if report.failed.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(report)).into_response())
}

pub async fn toggle_user_block(
    State(state): AppStateRef,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<BlockToggleRequest>,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::BlockUser(Role::User))?;
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("username is required"));
    }

    let target = state
        .identity
        .identity(username)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    authorize(Some(&caller), Action::BlockUser(target.role))?;

    let status = state.moderation.toggle_user_block(username).await?;
    let message = match status {
        UserStatus::Blocked => "User blocked",
        UserStatus::Active => "User unblocked",
    };
    tracing::info!(
        admin = %caller.username,
        username = %username,
        status = status.as_code(),
        "block toggled"
    );
    Ok(Json(json!({ "status": status, "message": message })))
}

pub async fn list_users(
    State(state): AppStateRef,
    Caller(caller): Caller,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::ListUsers)?;
    let users = state.identity.list_users().await?;
    Ok(Json(json!({ "users": users })))
}

pub async fn my_favorites(
    State(state): AppStateRef,
    Caller(caller): Caller,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::ListOwnEngagement)?;
    let favorites = state.engagement.list_favorites(&caller.username).await?;
    Ok(Json(json!({ "favorites": favorites })))
}

pub async fn my_reviews(
    State(state): AppStateRef,
    Caller(caller): Caller,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::ListOwnEngagement)?;
    let reviews = state.engagement.list_reviews_by_user(&caller.username).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
    page: Option<u32>,
}

pub async fn tmdb_search(
    State(state): AppStateRef,
    Caller(caller): Caller,
    QueryParams(q): QueryParams<SearchQuery>,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::ImportMovie)?;
    let query = q
        .query
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("Query parameter is required"))?;
    Ok(Json(state.tmdb.search(query, q.page.unwrap_or(1)).await?))
}

pub async fn tmdb_preview(
    State(state): AppStateRef,
    Caller(caller): Caller,
    PathParam(movie_id): PathParam<i32>,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::ImportMovie)?;
    let bundle = state.tmdb.fetch_bundle(movie_id).await?;
    Ok(Json(serde_json::to_value(bundle)?))
}

pub async fn import_movie(
    State(state): AppStateRef,
    Caller(caller): Caller,
    JsonBody(req): JsonBody<MovieIdRequest>,
) -> AppResult<Json<Value>> {
    authorize(Some(&caller), Action::ImportMovie)?;
    let movie_id = require_movie_id(req.movie_id)?;

    let bundle = crate::import::import_movie(&state.catalog, &state.tmdb, movie_id).await?;
    Ok(Json(json!({
        "message": "Movie added successfully",
        "movie": bundle.movie,
        "cast": bundle.cast,
        "videos": bundle.videos,
    })))
}
