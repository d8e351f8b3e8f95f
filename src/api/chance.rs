use axum::{
    extract::{Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::{
    constants::DEFAULT_CARD_PAGE_SIZE,
    error::Result,
    models::{ApiResponse, Card, Deck},
    services::CacheService,
    utils::ensure_page_limit,
};

use super::{cards, optional_user_id, AppState};

#[derive(Debug, Deserialize)]
pub struct ListChancesQuery {
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

/// GET /api/v1/chances
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListChancesQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<ApiResponse<Vec<Card>>>> {
    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_CARD_PAGE_SIZE);
    ensure_page_limit(limit, state.config.rate_limit_public)?;

    let user_id = optional_user_id(&headers, &state).await;
    let cache_key = CacheService::request_key(
        "GET",
        "/api/v1/chances",
        user_id,
        raw_query.as_deref().unwrap_or(""),
    );

    if let Some(cached) = state.cache().get_json::<Vec<Card>>(&cache_key).await {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let offset = (page - 1) * limit;
    let chances = state
        .db
        .list_cards_paged(Deck::Chance, limit as i64, offset as i64)
        .await?;

    state
        .cache()
        .set_json(&cache_key, &chances, state.config.cache_ttl_secs)
        .await;

    Ok(Json(ApiResponse::success(chances)))
}

/// GET /api/v1/chances/draw
pub async fn draw(State(state): State<AppState>) -> Result<Json<ApiResponse<Card>>> {
    let card = cards::draw_card(&state, Deck::Chance).await?;
    Ok(Json(ApiResponse::success(card)))
}

/// POST /api/v1/chances
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<cards::CreateCardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Card>>)> {
    let card = cards::create_card(&state, &headers, Deck::Chance, req).await?;
    cards::invalidate_deck_cache(&state, "/api/v1/chances").await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(card))))
}
