use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::entities::{movie, review, user};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_code(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Blocked,
}

impl UserStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(UserStatus::Active),
            "blocked" => Some(UserStatus::Blocked),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Blocked,
            UserStatus::Blocked => UserStatus::Active,
        }
    }
}

/// A caller whose token verified and whose account row was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub name: String,
    pub mail: String,
    pub role: Role,
    pub status: UserStatus,
}

impl From<user::Model> for UserSummary {
    fn from(m: user::Model) -> Self {
        Self {
            role: Role::from_code(&m.role).unwrap_or(Role::User),
            status: UserStatus::from_code(&m.status).unwrap_or(UserStatus::Active),
            username: m.username,
            name: m.display_name,
            mail: m.email,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl TryFrom<movie::Model> for Movie {
    type Error = serde_json::Error;

    fn try_from(m: movie::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            genres: serde_json::from_value(m.genres)?,
            id: m.external_id,
            title: m.title,
            original_title: m.original_title,
            release_date: m.release_date,
            runtime: m.runtime,
            overview: m.overview,
            tagline: m.tagline,
            poster_path: m.poster_path,
            backdrop_path: m.backdrop_path,
            vote_average: m.vote_average,
            vote_count: m.vote_count,
            popularity: m.popularity,
        })
    }
}

/// A movie with its cast and videos: what an import produces and stores.
#[derive(Clone, Debug, Serialize)]
pub struct MovieBundle {
    pub movie: Movie,
    pub cast: Vec<CastMember>,
    pub videos: Vec<VideoEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub movie_id: i32,
    pub username: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: Timestamp,
}

impl From<review::Model> for ReviewEntry {
    fn from(m: review::Model) -> Self {
        Self {
            id: m.id,
            movie_id: m.movie_id,
            username: m.username,
            rating: m.rating,
            comment: m.comment,
            created_at: Timestamp::from_second(m.created_at).unwrap_or(Timestamp::UNIX_EPOCH),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieDetails {
    pub movie: Movie,
    pub cast: Vec<CastMember>,
    pub videos: Vec<VideoEntry>,
    pub reviews: Vec<ReviewEntry>,
    pub favourite: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct MoviePage {
    pub page: u64,
    pub results: Vec<Movie>,
    pub total_pages: u64,
    pub total_results: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Category {
    pub genre: String,
    pub movies: Vec<Movie>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub favorited: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RemovalCounts {
    pub movie: u64,
    pub cast: u64,
    pub videos: u64,
    pub reviews: u64,
    pub favorites: u64,
}

/// Outcome of a cascading movie removal. Sub-deletes that failed are listed
/// by entity name; earlier sub-deletes are not rolled back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    #[serde(rename = "countsRemoved")]
    pub counts: RemovalCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mail: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieIdRequest {
    pub movie_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReviewRequest {
    pub movie_id: Option<i32>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveReviewRequest {
    pub movie_id: Option<i32>,
    #[serde(default)]
    pub review_id: String,
}

#[derive(Debug, Deserialize)]
pub struct BlockToggleRequest {
    #[serde(default)]
    pub username: String,
}
