use crate::config::Config;
use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use cni_core::domain::User;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const KIND_ACCESS: &str = "access";
pub const KIND_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// "access" or "refresh"; the two are not interchangeable.
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub fn issue_pair(config: &Config, user_id: Uuid) -> Result<TokenPair, ApiError> {
    Ok(TokenPair {
        access_token: issue_token(
            config,
            user_id,
            KIND_ACCESS,
            Duration::minutes(config.access_ttl_minutes),
        )?,
        refresh_token: issue_token(
            config,
            user_id,
            KIND_REFRESH,
            Duration::days(config.refresh_ttl_days),
        )?,
    })
}

fn issue_token(
    config: &Config,
    user_id: Uuid,
    kind: &str,
    ttl: Duration,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        kind: kind.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("failed to sign token: {e}")))
}

pub fn decode_user_id(
    config: &Config,
    token: &str,
    expected_kind: &str,
) -> Result<Uuid, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::unauthorized("invalid or expired token"))?;

    if data.claims.kind != expected_kind {
        return Err(ApiError::unauthorized("wrong token type"));
    }

    Uuid::parse_str(&data.claims.sub).map_err(|_| ApiError::unauthorized("malformed token subject"))
}

/// Bearer-token extractor: validates the access token and loads the caller's
/// user row, so handlers receive a ready `User`.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;

        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("expected a bearer token"))?;

        let user_id = decode_user_id(&state.config, token, KIND_ACCESS)?;
        let user = state
            .storage
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("unknown user"))?;

        Ok(AuthUser(user))
    }
}
