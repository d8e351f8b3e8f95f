use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::{
    constants::{RATE_LIMIT_CREATE_USER, RATE_LIMIT_GET_USER, RATE_LIMIT_LIST_USERS},
    db::UserUpdate,
    error::{AppError, Result},
    models::{ApiResponse, User},
    services::{CacheService, Paginated, PaginationQuery},
    utils::ensure_page_limit,
};

use super::{auth, enforce_rate_limit, optional_user_id, AppState};

// ==================== REQUEST TYPES ====================

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub chain: Option<String>,
    pub games_played: Option<i32>,
    pub game_won: Option<i32>,
    pub game_lost: Option<i32>,
    pub total_staked: Option<rust_decimal::Decimal>,
    pub total_earned: Option<rust_decimal::Decimal>,
    pub total_withdrawn: Option<rust_decimal::Decimal>,
}

// ==================== HANDLERS ====================

/// POST /api/v1/users
/// Stricter window than the read routes; registration is expensive.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<auth::RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>)> {
    enforce_rate_limit(&state, &headers, "/api/v1/users:create", RATE_LIMIT_CREATE_USER).await?;

    let user = auth::register_user(&state, req).await?;
    invalidate_users_cache(&state).await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PaginationQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<ApiResponse<Paginated<User>>>> {
    enforce_rate_limit(&state, &headers, "/api/v1/users", RATE_LIMIT_LIST_USERS).await?;
    ensure_page_limit(query.limit(), state.config.rate_limit_authenticated)?;

    let user_id = optional_user_id(&headers, &state).await;
    let cache_key = CacheService::request_key(
        "GET",
        "/api/v1/users",
        user_id,
        raw_query.as_deref().unwrap_or(""),
    );

    if let Some(cached) = state.cache().get_json::<Paginated<User>>(&cache_key).await {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let (users, total) = state.db.list_users(&query).await?;
    let page = Paginated::new(users, &query, total);

    state
        .cache()
        .set_json(&cache_key, &page, state.config.cache_ttl_secs)
        .await;

    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/v1/users/{id}
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>> {
    enforce_rate_limit(&state, &headers, "/api/v1/users/:id", RATE_LIMIT_GET_USER).await?;

    let user_id = optional_user_id(&headers, &state).await;
    let cache_key =
        CacheService::request_key("GET", &format!("/api/v1/users/{}", id), user_id, "");

    if let Some(cached) = state.cache().get_json::<User>(&cache_key).await {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let user = state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found", id)))?;

    state
        .cache()
        .set_json(&cache_key, &user, state.config.cache_ttl_secs)
        .await;

    Ok(Json(ApiResponse::success(user)))
}

/// PATCH /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>> {
    let update = build_user_update(req)?;

    let user = state
        .db
        .update_user(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found", id)))?;

    invalidate_users_cache(&state).await;

    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /api/v1/users/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let deleted = state.db.delete_user(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("User with ID {} not found", id)));
    }

    invalidate_users_cache(&state).await;

    Ok(StatusCode::NO_CONTENT)
}

// ==================== HELPER FUNCTIONS ====================

fn build_user_update(req: UpdateUserRequest) -> Result<UserUpdate> {
    let username = match req.username.as_deref().map(str::trim) {
        Some(name) if name.len() < 3 || name.len() > 100 => {
            return Err(AppError::Validation(
                "username must be 3-100 characters".to_string(),
            ));
        }
        Some(name) => Some(name.to_string()),
        None => None,
    };

    for (field, value) in [
        ("games_played", req.games_played),
        ("game_won", req.game_won),
        ("game_lost", req.game_lost),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(AppError::Validation(format!(
                "{} cannot be negative",
                field
            )));
        }
    }

    Ok(UserUpdate {
        username,
        chain: req.chain,
        games_played: req.games_played,
        game_won: req.game_won,
        game_lost: req.game_lost,
        total_staked: req.total_staked,
        total_earned: req.total_earned,
        total_withdrawn: req.total_withdrawn,
    })
}

/// Drops every cached users response, list and single alike.
async fn invalidate_users_cache(state: &AppState) {
    if let Err(e) = state.cache().delete_pattern("cache:GET:/api/v1/users*").await {
        tracing::warn!("Users cache invalidation failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_update() -> UpdateUserRequest {
        UpdateUserRequest {
            username: None,
            chain: None,
            games_played: None,
            game_won: None,
            game_lost: None,
            total_staked: None,
            total_earned: None,
            total_withdrawn: None,
        }
    }

    #[test]
    fn build_user_update_passes_through_partial_fields() {
        let update = build_user_update(UpdateUserRequest {
            username: Some("  new_name  ".to_string()),
            games_played: Some(4),
            ..empty_update()
        })
        .unwrap();
        assert_eq!(update.username.as_deref(), Some("new_name"));
        assert_eq!(update.games_played, Some(4));
        assert!(update.chain.is_none());
    }

    #[test]
    fn build_user_update_rejects_short_username() {
        let result = build_user_update(UpdateUserRequest {
            username: Some("ab".to_string()),
            ..empty_update()
        });
        assert!(result.is_err());
    }

    #[test]
    fn build_user_update_rejects_negative_counters() {
        let result = build_user_update(UpdateUserRequest {
            game_lost: Some(-1),
            ..empty_update()
        });
        assert!(result.is_err());
    }
}
