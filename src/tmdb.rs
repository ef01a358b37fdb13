use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{AppError, AppResult},
    models::{CastMember, Genre, Movie, MovieBundle, VideoEntry},
};

const MAX_CAST: usize = 10;
const MAX_VIDEOS: usize = 5;

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> Self {
        if access_token.trim().is_empty() {
            tracing::warn!("Using mock TMDB data - no TMDB_ACCESS_TOKEN provided");
        }

        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(rps.max(1)).unwrap_or(NonZeroU32::MIN),
        )));
        Self { client, access_token, base_url, limiter }
    }

    fn is_mock(&self) -> bool {
        self.access_token.trim().is_empty()
    }

    /// Upstream search results, passed through unchanged.
    pub async fn search(&self, query: &str, page: u32) -> AppResult<serde_json::Value> {
        if self.is_mock() {
            let movie = mock_movie(550);
            return Ok(serde_json::json!({
                "page": 1,
                "results": [{
                    "id": movie.id,
                    "title": movie.title,
                    "release_date": movie.release_date,
                }],
                "total_pages": 1,
                "total_results": 1,
            }));
        }

        let page = page.max(1).to_string();
        self.get("/search/movie", &[("query", query), ("page", page.as_str())]).await
    }

    /// Details, trimmed cast and selected videos for one upstream movie.
    pub async fn fetch_bundle(&self, movie_id: i32) -> AppResult<MovieBundle> {
        if self.is_mock() {
            return Ok(MovieBundle {
                movie: mock_movie(movie_id),
                cast: vec![CastMember {
                    id: 1,
                    name: "Mock Actor".to_string(),
                    character: Some("Mock Character".to_string()),
                    profile_path: None,
                    order: 0,
                }],
                videos: vec![VideoEntry {
                    key: "mock".to_string(),
                    site: "YouTube".to_string(),
                    kind: "Trailer".to_string(),
                    official: true,
                    name: Some("Mock trailer".to_string()),
                }],
            });
        }

        let movie_path = format!("/movie/{movie_id}");
        let credits_path = format!("{movie_path}/credits");
        let videos_path = format!("{movie_path}/videos");

        let (movie, credits, videos) = futures::try_join!(
            self.get::<Movie>(&movie_path, &[]),
            self.get::<CreditsResponse>(&credits_path, &[]),
            self.get::<VideosResponse>(&videos_path, &[]),
        )?;

        tracing::debug!(
            movie_id,
            cast = credits.cast.len(),
            videos = videos.results.len(),
            "fetched upstream movie"
        );
        Ok(MovieBundle {
            movie,
            cast: trim_cast(credits.cast),
            videos: select_videos(videos.results),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> AppResult<T> {
        self.limiter.until_ready().await;

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let resp = self.client.get(url).bearer_auth(&self.access_token).query(query).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found("Movie not found on TMDB"));
        }
        Ok(resp.error_for_status()?.json().await?)
    }
}

/// Keeps the first cast members by billing order.
pub fn trim_cast(mut cast: Vec<CastMember>) -> Vec<CastMember> {
    cast.sort_by_key(|c| c.order);
    cast.truncate(MAX_CAST);
    cast
}

/// YouTube videos only, led by the first official trailer, capped at five.
pub fn select_videos(videos: Vec<VideoEntry>) -> Vec<VideoEntry> {
    let mut videos: Vec<VideoEntry> = videos.into_iter().filter(|v| v.site == "YouTube").collect();
    if let Some(idx) = videos.iter().position(|v| v.kind == "Trailer" && v.official) {
        let trailer = videos.remove(idx);
        videos.insert(0, trailer);
    }
    videos.truncate(MAX_VIDEOS);
    videos
}

fn mock_movie(movie_id: i32) -> Movie {
    Movie {
        id: movie_id,
        title: format!("Mock Movie {movie_id}"),
        original_title: None,
        release_date: Some("1999-10-15".to_string()),
        runtime: Some(139),
        overview: Some("Mock overview".to_string()),
        tagline: None,
        poster_path: None,
        backdrop_path: None,
        vote_average: Some(8.4),
        vote_count: Some(1000),
        popularity: Some(50.0),
        genres: vec![Genre { id: 18, name: "Drama".to_string() }],
    }
}

#[derive(Debug, Deserialize)]
struct CreditsResponse {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    results: Vec<VideoEntry>,
}
