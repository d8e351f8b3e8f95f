use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, Card, CardType, Deck},
    services::{
        pagination::{PaginationQuery, SortOrder, CARD_SORT_COLUMNS},
        CacheService,
    },
};

use super::{cards, optional_user_id, AppState};

#[derive(Debug, Deserialize)]
pub struct ListCommunityChestQuery {
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(rename = "type")]
    pub card_type: Option<String>,
}

/// GET /api/v1/community-chest
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListCommunityChestQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<ApiResponse<Vec<Card>>>> {
    // An unknown type filter can never match anything; call it out.
    let card_type = match query.card_type.as_deref() {
        Some(raw) => Some(
            CardType::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown card type '{}'", raw)))?,
        ),
        None => None,
    };

    let user_id = optional_user_id(&headers, &state).await;
    let cache_key = CacheService::request_key(
        "GET",
        "/api/v1/community-chest",
        user_id,
        raw_query.as_deref().unwrap_or(""),
    );

    if let Some(cached) = state.cache().get_json::<Vec<Card>>(&cache_key).await {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let sort = PaginationQuery {
        sort_by: query.sort_by.clone(),
        sort_order: query.sort_order,
        ..Default::default()
    };
    let order_clause = sort.order_clause(CARD_SORT_COLUMNS, "id");

    let chests = state
        .db
        .list_cards_sorted(Deck::CommunityChest, &order_clause, card_type)
        .await?;

    state
        .cache()
        .set_json(&cache_key, &chests, state.config.cache_ttl_secs)
        .await;

    Ok(Json(ApiResponse::success(chests)))
}

/// GET /api/v1/community-chest/draw
pub async fn draw(State(state): State<AppState>) -> Result<Json<ApiResponse<Card>>> {
    let card = cards::draw_card(&state, Deck::CommunityChest).await?;
    Ok(Json(ApiResponse::success(card)))
}

/// GET /api/v1/community-chest/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Card>>> {
    let card = state
        .db
        .get_card(Deck::CommunityChest, id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Community Chest card with ID {} not found", id))
        })?;
    Ok(Json(ApiResponse::success(card)))
}

/// POST /api/v1/community-chest
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<cards::CreateCardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Card>>)> {
    let card = cards::create_card(&state, &headers, Deck::CommunityChest, req).await?;
    cards::invalidate_deck_cache(&state, "/api/v1/community-chest").await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(card))))
}
