use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Identity, Role},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material for bearer tokens, built from configuration.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl AuthKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: ttl_minutes.max(1).saturating_mul(60),
        }
    }

    pub fn issue(&self, username: &str, role: Role) -> AppResult<String> {
        let now = crate::db::now_sec();
        let claims = Claims {
            sub: username.to_string(),
            role,
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "token rejected");
                AppError::AuthenticationRequired("Invalid or expired token".to_string())
            })
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid password hash: {e}")))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Resolves the bearer token (if any) to the caller's current account state.
/// A missing header yields `None`; a present but bad token is an error.
async fn resolve(parts: &mut Parts, state: &Arc<AppState>) -> AppResult<Option<Identity>> {
    let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    else {
        return Ok(None);
    };

    let claims = state.keys.verify(bearer.token())?;
    match state.identity.identity(&claims.sub).await? {
        Some(identity) => Ok(Some(identity)),
        None => Err(AppError::AuthenticationRequired("Account no longer exists".to_string())),
    }
}

/// Authenticated caller. Rejects with 401 when no valid credential is sent.
#[derive(Clone, Debug)]
pub struct Caller(pub Identity);

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await?.map(Caller).ok_or_else(AppError::unauthenticated)
    }
}

/// Caller for read endpoints: anonymous access is fine, and an unusable
/// token degrades to anonymous rather than failing the read.
#[derive(Clone, Debug)]
pub struct MaybeCaller(pub Option<Identity>);

impl FromRequestParts<Arc<AppState>> for MaybeCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(identity) => Ok(MaybeCaller(identity)),
            Err(AppError::AuthenticationRequired(_)) => Ok(MaybeCaller(None)),
            Err(err) => Err(err),
        }
    }
}
