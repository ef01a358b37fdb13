//! End-to-end tests of the HTTP surface against an in-memory database.
//! Upstream imports run in mock mode (no TMDB token configured).

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use moviesflix::{AppState, app, config::Config, db};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    state: Arc<AppState>,
    router: Router,
    admin_token: String,
}

fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-secret".to_string(),
        token_ttl_minutes: 60,
        tmdb_access_token: String::new(),
        tmdb_base_url: "http://127.0.0.1:9".to_string(),
        tmdb_rps: 100,
        admin_username: Some("root".to_string()),
        admin_password: Some("rootpass".to_string()),
    }
}

async fn spawn_app() -> TestApp {
    let config = test_config();
    let db = db::connect_and_migrate(&config.database_url).await.expect("database");
    let state = Arc::new(AppState::new(&config, db, reqwest::Client::new()));
    state.identity.ensure_admin("root", "rootpass").await.expect("admin");

    let router = app(state.clone());
    let (status, body) = send(
        &router,
        Method::POST,
        "/account/login",
        None,
        Some(json!({"username": "root", "password": "rootpass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin_token = body["token"].as_str().unwrap().to_string();

    TestApp { state, router, admin_token }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

impl TestApp {
    async fn signup(&self, username: &str) -> String {
        let (status, body) = send(
            &self.router,
            Method::POST,
            "/account/signup",
            None,
            Some(json!({
                "username": username,
                "password": "pw",
                "name": username,
                "mail": format!("{username}@example.com"),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    async fn import(&self, movie_id: i32) {
        let (status, body) = send(
            &self.router,
            Method::POST,
            "/tmdb/movies",
            Some(&self.admin_token),
            Some(json!({"movieId": movie_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    async fn toggle_favorite(&self, token: &str, movie_id: i32) -> (StatusCode, Value) {
        send(
            &self.router,
            Method::POST,
            "/favorites/toggle",
            Some(token),
            Some(json!({"movieId": movie_id})),
        )
        .await
    }

    async fn user_status(&self, username: &str) -> Value {
        let (_, users) =
            send(&self.router, Method::GET, "/users", Some(&self.admin_token), None).await;
        let row = users["users"]
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["username"] == username)
            .unwrap();
        row["status"].clone()
    }
}

#[tokio::test]
async fn favourite_then_movie_removal_cascades() {
    let app = spawn_app().await;
    let alice = app.signup("alice").await;
    app.import(42).await;

    let (status, body) = app.toggle_favorite(&alice, 42).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorited"], json!(true));

    let (_, details) = send(&app.router, Method::GET, "/movies/42", Some(&alice), None).await;
    assert_eq!(details["favourite"], json!(true));
    let (_, anonymous) = send(&app.router, Method::GET, "/movies/42", None, None).await;
    assert_eq!(anonymous["favourite"], json!(false));

    let (status, body) = send(
        &app.router,
        Method::DELETE,
        "/movies",
        Some(&app.admin_token),
        Some(json!({"movieId": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["countsRemoved"]["favorites"], json!(1));
    assert_eq!(body["countsRemoved"]["movie"], json!(1));
    assert_eq!(body["countsRemoved"]["cast"], json!(1));
    assert_eq!(body["countsRemoved"]["videos"], json!(1));

    let (status, _) = send(&app.router, Method::GET, "/movies/42", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, favorites) = send(&app.router, Method::GET, "/favorites", Some(&alice), None).await;
    assert_eq!(favorites["favorites"], json!([]));
}

#[tokio::test]
async fn toggle_twice_unfavourites() {
    let app = spawn_app().await;
    let alice = app.signup("alice").await;
    app.import(7).await;

    for expected in [true, false] {
        let (_, body) = app.toggle_favorite(&alice, 7).await;
        assert_eq!(body["favorited"], json!(expected));
    }
    let (_, favorites) = send(&app.router, Method::GET, "/favorites", Some(&alice), None).await;
    assert_eq!(favorites["favorites"], json!([]));
}

#[tokio::test]
async fn review_lifecycle() {
    let app = spawn_app().await;
    let alice = app.signup("alice").await;
    app.import(42).await;

    for rating in [11, -1] {
        let (status, _) = send(
            &app.router,
            Method::POST,
            "/reviews",
            Some(&alice),
            Some(json!({"movieId": 42, "rating": rating, "comment": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/reviews",
        Some(&alice),
        Some(json!({"movieId": 42, "rating": 8.5, "comment": "great"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let review_id = body["review"]["_id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/reviews",
        Some(&alice),
        Some(json!({"movieId": 42, "rating": 2, "comment": "again"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, details) = send(&app.router, Method::GET, "/movies/42", None, None).await;
    assert_eq!(details["reviews"].as_array().unwrap().len(), 1);

    // Users cannot moderate.
    let (status, _) = send(
        &app.router,
        Method::DELETE,
        "/reviews",
        Some(&alice),
        Some(json!({"movieId": 42, "reviewId": review_id})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        "/reviews",
        Some(&app.admin_token),
        Some(json!({"movieId": 42, "reviewId": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        "/reviews",
        Some(&app.admin_token),
        Some(json!({"movieId": 42, "reviewId": review_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, mine) = send(&app.router, Method::GET, "/reviews/mine", Some(&alice), None).await;
    assert_eq!(mine["reviews"], json!([]));
}

#[tokio::test]
async fn malformed_input_is_a_validation_error() {
    let app = spawn_app().await;
    let alice = app.signup("alice").await;
    app.import(42).await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/reviews",
        Some(&alice),
        Some(json!({"movieId": 42, "rating": "abc", "comment": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/favorites/toggle",
        Some(&alice),
        Some(json!({"movieId": "forty-two"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(&app.router, Method::GET, "/movies/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(&app.router, Method::GET, "/movies?page=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    // Nothing was written by the rejected requests.
    let (_, mine) = send(&app.router, Method::GET, "/reviews/mine", Some(&alice), None).await;
    assert_eq!(mine["reviews"], json!([]));
}

#[tokio::test]
async fn engagement_with_unknown_movie_is_not_found() {
    let app = spawn_app().await;
    let alice = app.signup("alice").await;
    let (status, _) = app.toggle_favorite(&alice, 404).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn authentication_and_role_gates() {
    let app = spawn_app().await;
    let alice = app.signup("alice").await;
    app.import(42).await;

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/favorites/toggle",
        None,
        Some(json!({"movieId": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.toggle_favorite("garbage", 42).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        "/movies",
        Some(&alice),
        Some(json!({"movieId": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app.router, Method::GET, "/users", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/tmdb/movies",
        Some(&alice),
        Some(json!({"movieId": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Duplicate import.
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/tmdb/movies",
        Some(&app.admin_token),
        Some(json!({"movieId": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn blocking_denies_future_mutations_only() {
    let app = spawn_app().await;
    let alice = app.signup("alice").await;
    app.import(42).await;
    app.toggle_favorite(&alice, 42).await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/users/block-toggle",
        Some(&app.admin_token),
        Some(json!({"username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("blocked"));

    // Token issued before the block no longer works for mutations.
    let (status, _) = app.toggle_favorite(&alice, 42).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/account/login",
        None,
        Some(json!({"username": "alice", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Existing engagement survives the block.
    let (_, details) = send(&app.router, Method::GET, "/movies/42", Some(&alice), None).await;
    assert_eq!(details["favourite"], json!(true));
    assert_eq!(app.user_status("alice").await, json!("blocked"));

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/users/block-toggle",
        Some(&app.admin_token),
        Some(json!({"username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("active"));
}

#[tokio::test]
async fn admins_cannot_be_blocked() {
    let app = spawn_app().await;
    app.state.identity.ensure_admin("ops", "opspass").await.unwrap();

    for target in ["root", "ops"] {
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/users/block-toggle",
            Some(&app.admin_token),
            Some(json!({"username": target})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["message"].is_string());
        assert_eq!(app.user_status(target).await, json!("active"));
    }

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/users/block-toggle",
        Some(&app.admin_token),
        Some(json!({"username": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn browse_and_landing_page() {
    let app = spawn_app().await;
    for id in [1, 2, 3] {
        app.import(id).await;
    }

    let (status, page) =
        send(&app.router, Method::GET, "/movies?query=mock&page=1&limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_results"], json!(3));
    assert_eq!(page["total_pages"], json!(2));
    assert_eq!(page["results"].as_array().unwrap().len(), 2);

    let (_, landing) = send(&app.router, Method::GET, "/main-page", None, None).await;
    let categories = landing["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["genre"], json!("Drama"));
    assert_eq!(categories[0]["movies"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn out_of_range_page_is_rejected() {
    let app = spawn_app().await;
    app.import(1).await;

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/movies?page=18446744073709551615&limit=100",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}
