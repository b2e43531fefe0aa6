//! Password hashing and token authentication.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use sha2::Sha256;
use uuid::Uuid;

use super::models::{self, User};
use crate::error::{ApiError, AppError};
use crate::state::AppState;

const HASH_ALGORITHM: &str = "pbkdf2_sha256";
const HASH_ROUNDS: u32 = 10_000;

pub const TOKEN_HEADER: &str = "x-auth-token";
const AUTHORIZATION_KEYWORD: &str = "Token";

/// PBKDF2-HMAC-SHA256 in the form `pbkdf2_sha256$<rounds>$<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    encode(password, &salt, HASH_ROUNDS)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(algorithm), Some(rounds), Some(salt), Some(_), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if algorithm != HASH_ALGORITHM {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    constant_time_eq(encode(password, salt, rounds).as_bytes(), stored.as_bytes())
}

fn encode(password: &str, salt: &str, rounds: u32) -> String {
    let mut digest = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut digest);
    format!("{HASH_ALGORITHM}${rounds}${salt}${}", hex::encode(digest))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn new_token_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `X-Auth-Token: <key>` wins over `Authorization: Token <key>`.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        let key = key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }
    let value = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (keyword, key) = value.trim().split_once(' ')?;
    if keyword != AUTHORIZATION_KEYWORD {
        return None;
    }
    let key = key.trim();
    (!key.is_empty()).then(|| key.to_string())
}

/// The caller, if a token was presented. A token that matches nobody is rejected.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }

    pub fn require(self) -> Result<User, ApiError> {
        self.0.ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".into()).into()
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(key) = token_from_headers(&parts.headers) else {
            return Ok(MaybeUser(None));
        };
        let user = models::user_for_token(&*state.db.conn()?, &key)?
            .ok_or_else(|| AppError::Unauthorized("Invalid token.".into()))?;
        Ok(MaybeUser(Some(user)))
    }
}
