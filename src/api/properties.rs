use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::{
        property::{validate_board_placement, validate_rent_value},
        ApiResponse, Property, RentStructureResponse,
    },
    services::CacheService,
};

use super::{optional_user_id, AppState};

// ==================== REQUEST TYPES ====================

#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub id: i32,
    #[serde(rename = "type")]
    pub property_type: String,
    pub name: String,
    pub group_id: Option<i32>,
    pub position: String,
    pub grid_row: i32,
    pub grid_col: i32,
    pub price: Option<i32>,
    pub rent_site_only: Option<i32>,
    pub rent_one_house: Option<i32>,
    pub rent_two_houses: Option<i32>,
    pub rent_three_houses: Option<i32>,
    pub rent_four_houses: Option<i32>,
    pub rent_hotel: Option<i32>,
    pub cost_of_house: Option<i32>,
    pub is_mortgaged: Option<bool>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPropertiesQuery {
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub group_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleMortgageRequest {
    pub is_mortgaged: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRentStructureRequest {
    pub rent_site_only: Option<i32>,
    pub rent_one_house: Option<i32>,
    pub rent_two_houses: Option<i32>,
    pub rent_three_houses: Option<i32>,
    pub rent_four_houses: Option<i32>,
    pub rent_hotel: Option<i32>,
    pub cost_of_house: Option<i32>,
}

impl UpdateRentStructureRequest {
    fn tiers(&self) -> [(&'static str, Option<i32>); 7] {
        [
            ("rent_site_only", self.rent_site_only),
            ("rent_one_house", self.rent_one_house),
            ("rent_two_houses", self.rent_two_houses),
            ("rent_three_houses", self.rent_three_houses),
            ("rent_four_houses", self.rent_four_houses),
            ("rent_hotel", self.rent_hotel),
            ("cost_of_house", self.cost_of_house),
        ]
    }
}

// ==================== HANDLERS ====================

/// POST /api/v1/properties
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Property>>)> {
    let property = build_property(req)?;

    // Board slots are fixed ids; re-creating one is a caller mistake.
    if state.db.get_property(property.id).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "Property with ID {} already exists",
            property.id
        )));
    }

    let created = state.db.create_property(&property).await?;
    invalidate_properties_cache(&state).await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// GET /api/v1/properties
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListPropertiesQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<ApiResponse<Vec<Property>>>> {
    let user_id = optional_user_id(&headers, &state).await;
    let cache_key = CacheService::request_key(
        "GET",
        "/api/v1/properties",
        user_id,
        raw_query.as_deref().unwrap_or(""),
    );

    if let Some(cached) = state.cache().get_json::<Vec<Property>>(&cache_key).await {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let properties = state
        .db
        .list_properties(query.property_type.as_deref(), query.group_id)
        .await?;

    state
        .cache()
        .set_json(&cache_key, &properties, state.config.cache_ttl_secs)
        .await;

    Ok(Json(ApiResponse::success(properties)))
}

/// GET /api/v1/properties/{id}
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Property>>> {
    let user_id = optional_user_id(&headers, &state).await;
    let cache_key =
        CacheService::request_key("GET", &format!("/api/v1/properties/{}", id), user_id, "");

    if let Some(cached) = state.cache().get_json::<Property>(&cache_key).await {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let property = state
        .db
        .get_property(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property with ID {} not found", id)))?;

    state
        .cache()
        .set_json(&cache_key, &property, state.config.cache_ttl_secs)
        .await;

    Ok(Json(ApiResponse::success(property)))
}

/// PATCH /api/v1/properties/{id}/mortgage
pub async fn toggle_mortgage(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<ToggleMortgageRequest>,
) -> Result<Json<ApiResponse<Property>>> {
    let property = state
        .db
        .set_property_mortgaged(id, req.is_mortgaged)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property with ID {} not found", id)))?;

    invalidate_properties_cache(&state).await;

    Ok(Json(ApiResponse::success(property)))
}

/// PATCH /api/v1/properties/{id}/rent
pub async fn update_rent_structure(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateRentStructureRequest>,
) -> Result<Json<ApiResponse<RentStructureResponse>>> {
    for (field, value) in req.tiers() {
        if let Some(value) = value {
            validate_rent_value(field, value)?;
        }
    }

    let update = crate::db::RentStructureUpdate {
        rent_site_only: req.rent_site_only,
        rent_one_house: req.rent_one_house,
        rent_two_houses: req.rent_two_houses,
        rent_three_houses: req.rent_three_houses,
        rent_four_houses: req.rent_four_houses,
        rent_hotel: req.rent_hotel,
        cost_of_house: req.cost_of_house,
    };

    let property = state
        .db
        .update_rent_structure(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property with ID {} not found", id)))?;

    invalidate_properties_cache(&state).await;

    Ok(Json(ApiResponse::success(RentStructureResponse::from(
        &property,
    ))))
}

// ==================== HELPER FUNCTIONS ====================

fn build_property(req: CreatePropertyRequest) -> Result<Property> {
    validate_board_placement(&req.position, req.grid_row, req.grid_col)?;

    let rents = [
        ("price", req.price),
        ("rent_site_only", req.rent_site_only),
        ("rent_one_house", req.rent_one_house),
        ("rent_two_houses", req.rent_two_houses),
        ("rent_three_houses", req.rent_three_houses),
        ("rent_four_houses", req.rent_four_houses),
        ("rent_hotel", req.rent_hotel),
        ("cost_of_house", req.cost_of_house),
    ];
    for (field, value) in rents {
        if let Some(value) = value {
            validate_rent_value(field, value)?;
        }
    }

    if req.property_type.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::Validation(
            "type and name are required".to_string(),
        ));
    }

    Ok(Property {
        id: req.id,
        property_type: req.property_type,
        name: req.name,
        group_id: req.group_id.unwrap_or(0),
        position: req.position,
        grid_row: req.grid_row,
        grid_col: req.grid_col,
        price: req.price.unwrap_or(0),
        rent_site_only: req.rent_site_only.unwrap_or(0),
        rent_one_house: req.rent_one_house.unwrap_or(0),
        rent_two_houses: req.rent_two_houses.unwrap_or(0),
        rent_three_houses: req.rent_three_houses.unwrap_or(0),
        rent_four_houses: req.rent_four_houses.unwrap_or(0),
        rent_hotel: req.rent_hotel.unwrap_or(0),
        cost_of_house: req.cost_of_house.unwrap_or(0),
        is_mortgaged: req.is_mortgaged.unwrap_or(false),
        color: req.color.unwrap_or_else(|| "#FFFFFF".to_string()),
        icon: req.icon,
    })
}

/// Board data changes invalidate the cached board reads.
async fn invalidate_properties_cache(state: &AppState) {
    if let Err(e) = state
        .cache()
        .delete_pattern("cache:GET:/api/v1/properties*")
        .await
    {
        tracing::warn!("Properties cache invalidation failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CreatePropertyRequest {
        CreatePropertyRequest {
            id: 1,
            property_type: "street".to_string(),
            name: "Old Kent Road".to_string(),
            group_id: Some(1),
            position: "bottom".to_string(),
            grid_row: 0,
            grid_col: 3,
            price: Some(60),
            rent_site_only: Some(2),
            rent_one_house: Some(10),
            rent_two_houses: Some(30),
            rent_three_houses: Some(90),
            rent_four_houses: Some(160),
            rent_hotel: Some(250),
            cost_of_house: Some(50),
            is_mortgaged: None,
            color: None,
            icon: None,
        }
    }

    #[test]
    fn build_property_applies_entity_defaults() {
        let property = build_property(CreatePropertyRequest {
            price: None,
            rent_hotel: None,
            color: None,
            ..sample_request()
        })
        .unwrap();
        assert_eq!(property.price, 0);
        assert_eq!(property.rent_hotel, 0);
        assert_eq!(property.color, "#FFFFFF");
        assert!(!property.is_mortgaged);
    }

    #[test]
    fn build_property_rejects_bad_grid() {
        let result = build_property(CreatePropertyRequest {
            grid_row: 12,
            ..sample_request()
        });
        assert!(result.is_err());
    }

    #[test]
    fn build_property_rejects_oversized_rent() {
        let result = build_property(CreatePropertyRequest {
            rent_hotel: Some(2_000_000),
            ..sample_request()
        });
        assert!(result.is_err());
    }

    #[test]
    fn build_property_rejects_blank_name() {
        let result = build_property(CreatePropertyRequest {
            name: " ".to_string(),
            ..sample_request()
        });
        assert!(result.is_err());
    }
}
