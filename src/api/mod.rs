// src/api/mod.rs

pub mod auth;
pub mod cards;
pub mod chance;
pub mod community_chest;
pub mod health;
pub mod properties;
pub mod users;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use redis::aio::ConnectionManager;

use crate::{
    config::Config,
    constants::RATE_LIMIT_WINDOW_SECS,
    db::Database,
    error::{AppError, Result},
    models::User,
    services::{token_service, CacheService, TokenService},
};

// AppState definition
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub redis: ConnectionManager,
    pub config: Config,
}

impl AppState {
    pub fn cache(&self) -> CacheService {
        CacheService::new(self.redis.clone())
    }

    pub fn tokens(&self) -> TokenService {
        TokenService::new(self.db.clone(), self.config.clone())
    }
}

// ==================== AUTH GUARDS ====================

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;
    auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthError("Invalid Authorization scheme".to_string()))
}

/// Resolves the bearer access token to its user. A token whose user no
/// longer exists is treated the same as a bad token.
pub async fn require_user(headers: &HeaderMap, state: &AppState) -> Result<User> {
    let token = bearer_token(headers)?;
    let claims = token_service::decode_claims_of_type(
        token,
        &state.config.jwt_secret,
        token_service::TOKEN_TYPE_ACCESS,
    )?;
    let user = state
        .db
        .get_user(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid or expired token".to_string()))?;
    Ok(user)
}

pub async fn require_admin(headers: &HeaderMap, state: &AppState) -> Result<User> {
    let user = require_user(headers, state).await?;
    if !user.is_admin() {
        return Err(AppError::AuthError("Admin role required".to_string()));
    }
    Ok(user)
}

/// Best-effort caller identity for cache keys; anonymous when the header
/// is absent or bad.
pub async fn optional_user_id(headers: &HeaderMap, state: &AppState) -> Option<i32> {
    match require_user(headers, state).await {
        Ok(user) => Some(user.id),
        Err(_) => None,
    }
}

// ==================== RATE LIMITING ====================

/// Client identity for rate limiting: first x-forwarded-for hop, then
/// x-real-ip. Behind no proxy everything buckets into "unknown".
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let trimmed = real_ip.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    "unknown".to_string()
}

/// Fixed-window limiter keyed by client + route.
pub async fn enforce_rate_limit(
    state: &AppState,
    headers: &HeaderMap,
    route: &str,
    limit: u32,
) -> Result<()> {
    let key = format!("rate_limit:{}:{}", client_ip(headers), route);
    let current = state
        .cache()
        .increment_rate_limit(&key, RATE_LIMIT_WINDOW_SECS)
        .await?;

    if current > limit as i64 {
        return Err(AppError::RateLimitExceeded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc");
    }

    #[test]
    fn bearer_token_missing_header_is_an_error() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "198.51.100.2");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
