use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_CHAIN, MIN_PASSWORD_LEN},
    db::NewUser,
    error::{AppError, Result},
    models::{ApiResponse, User},
    services::token_service::{self, TokenPair},
};

use super::{require_user, AppState};

// ==================== REQUEST/RESPONSE TYPES ====================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub address: String,
    pub password: String,
    pub chain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

// ==================== HANDLERS ====================

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let user = register_user(&state, req).await?;
    let tokens = state.tokens().issue_token_pair(&user).await?;

    state
        .cache()
        .set_refresh_token(
            user.id,
            &tokens.refresh_token,
            state.config.jwt_refresh_expires_in_secs,
        )
        .await?;

    Ok(Json(ApiResponse::success(AuthResponse { tokens, user })))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    // One failure message for unknown user and bad password alike.
    let user = state
        .db
        .get_user_by_username(req.username.trim())
        .await?
        .filter(|u| token_service::verify_password(&req.password, &u.password_hash))
        .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

    let tokens = state.tokens().issue_token_pair(&user).await?;

    state
        .cache()
        .set_refresh_token(
            user.id,
            &tokens.refresh_token,
            state.config.jwt_refresh_expires_in_secs,
        )
        .await?;

    tracing::info!("User {} logged in", user.username);

    Ok(Json(ApiResponse::success(AuthResponse { tokens, user })))
}

/// POST /api/v1/auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let (user, tokens) = state
        .tokens()
        .rotate_refresh_token(&req.refresh_token)
        .await?;

    state
        .cache()
        .set_refresh_token(
            user.id,
            &tokens.refresh_token,
            state.config.jwt_refresh_expires_in_secs,
        )
        .await?;

    Ok(Json(ApiResponse::success(AuthResponse { tokens, user })))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<String>>> {
    let user = require_user(&headers, &state).await?;

    let revoked = state.tokens().revoke_all(user.id).await?;
    state.cache().delete_refresh_token(user.id).await?;

    tracing::info!("User {} logged out ({} tokens revoked)", user.username, revoked);

    Ok(Json(ApiResponse::success("Logged out".to_string())))
}

// ==================== HELPER FUNCTIONS ====================

/// Shared by auth/register and POST /users: validates, checks duplicates,
/// hashes the password and inserts.
pub(crate) async fn register_user(state: &AppState, req: RegisterRequest) -> Result<User> {
    let username = req.username.trim().to_string();
    let address = req.address.trim().to_string();
    let chain = req
        .chain
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CHAIN)
        .to_string();

    validate_registration(&username, &address, &chain, &req.password)?;

    if state.db.get_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }
    if state.db.get_user_by_address(&address).await?.is_some() {
        return Err(AppError::Conflict("Address already registered".to_string()));
    }

    let password_hash = token_service::hash_password(&req.password, state.config.bcrypt_cost)?;

    let user = state
        .db
        .create_user(&NewUser {
            username,
            address,
            chain,
            password_hash,
        })
        .await?;

    tracing::info!("Created user {} ({})", user.username, user.address);
    Ok(user)
}

fn validate_registration(
    username: &str,
    address: &str,
    chain: &str,
    password: &str,
) -> Result<()> {
    if username.len() < 3 || username.len() > 100 {
        return Err(AppError::Validation(
            "username must be 3-100 characters".to_string(),
        ));
    }
    if address.len() < 3 || address.len() > 100 {
        return Err(AppError::Validation(
            "address must be 3-100 characters".to_string(),
        ));
    }
    if chain.len() < 3 || chain.len() > 50 {
        return Err(AppError::Validation(
            "chain must be 3-50 characters".to_string(),
        ));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_accepts_a_typical_payload() {
        assert!(validate_registration("player_one", "0xabc123", "BASE", "hunter2!").is_ok());
    }

    #[test]
    fn registration_rejects_short_fields() {
        assert!(validate_registration("ab", "0xabc123", "BASE", "hunter2!").is_err());
        assert!(validate_registration("player_one", "0x", "BASE", "hunter2!").is_err());
        assert!(validate_registration("player_one", "0xabc123", "XX", "hunter2!").is_err());
        assert!(validate_registration("player_one", "0xabc123", "BASE", "pw").is_err());
    }

    #[test]
    fn registration_rejects_oversized_username() {
        let long = "a".repeat(101);
        assert!(validate_registration(&long, "0xabc123", "BASE", "hunter2!").is_err());
    }
}
