use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    constants::{BOARD_GRID_MAX, BOARD_GRID_MIN, MAX_RENT_VALUE},
    error::{AppError, Result},
};

// ==================== PROPERTY ====================
/// A board slot. The id is the fixed slot number assigned by the board
/// layout, not a generated key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub property_type: String,
    pub name: String,
    pub group_id: i32,
    pub position: String,
    pub grid_row: i32,
    pub grid_col: i32,
    pub price: i32,
    pub rent_site_only: i32,
    pub rent_one_house: i32,
    pub rent_two_houses: i32,
    pub rent_three_houses: i32,
    pub rent_four_houses: i32,
    pub rent_hotel: i32,
    pub cost_of_house: i32,
    pub is_mortgaged: bool,
    pub color: String,
    pub icon: Option<String>,
}

/// Board-placement invariants: position is non-empty and both grid axes
/// stay inside the 10x10 board.
pub fn validate_board_placement(position: &str, grid_row: i32, grid_col: i32) -> Result<()> {
    if position.trim().is_empty() {
        return Err(AppError::Validation("Position is required".to_string()));
    }
    if !(BOARD_GRID_MIN..=BOARD_GRID_MAX).contains(&grid_row) {
        return Err(AppError::Validation(format!(
            "Grid row must be a number between {} and {}",
            BOARD_GRID_MIN, BOARD_GRID_MAX
        )));
    }
    if !(BOARD_GRID_MIN..=BOARD_GRID_MAX).contains(&grid_col) {
        return Err(AppError::Validation(format!(
            "Grid column must be a number between {} and {}",
            BOARD_GRID_MIN, BOARD_GRID_MAX
        )));
    }
    Ok(())
}

/// Range check for a single rent tier or the house cost.
pub fn validate_rent_value(field: &str, value: i32) -> Result<()> {
    if value < 0 {
        return Err(AppError::Validation(format!("{} cannot be negative", field)));
    }
    if value > MAX_RENT_VALUE {
        return Err(AppError::Validation(format!(
            "{} cannot exceed 1,000,000",
            field
        )));
    }
    Ok(())
}

// ==================== RENT STRUCTURE ====================
#[derive(Debug, Serialize)]
pub struct RentStructureResponse {
    pub property_id: i32,
    pub rent_site_only: i32,
    pub rent_one_house: i32,
    pub rent_two_houses: i32,
    pub rent_three_houses: i32,
    pub rent_four_houses: i32,
    pub rent_hotel: i32,
    pub cost_of_house: i32,
}

impl From<&Property> for RentStructureResponse {
    fn from(property: &Property) -> Self {
        Self {
            property_id: property.id,
            rent_site_only: property.rent_site_only,
            rent_one_house: property.rent_one_house,
            rent_two_houses: property.rent_two_houses,
            rent_three_houses: property.rent_three_houses,
            rent_four_houses: property.rent_four_houses,
            rent_hotel: property.rent_hotel,
            cost_of_house: property.cost_of_house,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_placement_accepts_the_grid_corners() {
        assert!(validate_board_placement("GO", 0, 0).is_ok());
        assert!(validate_board_placement("Mayfair", 9, 9).is_ok());
    }

    #[test]
    fn board_placement_rejects_out_of_range_axes() {
        assert!(validate_board_placement("GO", -1, 0).is_err());
        assert!(validate_board_placement("GO", 0, 10).is_err());
    }

    #[test]
    fn board_placement_rejects_blank_position() {
        assert!(validate_board_placement("   ", 1, 1).is_err());
    }

    #[test]
    fn rent_value_bounds_are_inclusive() {
        assert!(validate_rent_value("rent_hotel", 0).is_ok());
        assert!(validate_rent_value("rent_hotel", 1_000_000).is_ok());
        assert!(validate_rent_value("rent_hotel", 1_000_001).is_err());
        assert!(validate_rent_value("rent_hotel", -1).is_err());
    }

    #[test]
    fn property_type_column_serializes_as_type() {
        let property = Property {
            id: 1,
            property_type: "street".to_string(),
            name: "Old Kent Road".to_string(),
            group_id: 1,
            position: "bottom".to_string(),
            grid_row: 0,
            grid_col: 3,
            price: 60,
            rent_site_only: 2,
            rent_one_house: 10,
            rent_two_houses: 30,
            rent_three_houses: 90,
            rent_four_houses: 160,
            rent_hotel: 250,
            cost_of_house: 50,
            is_mortgaged: false,
            color: "#8B4513".to_string(),
            icon: None,
        };
        let json = serde_json::to_value(&property).unwrap();
        assert_eq!(json["type"], "street");
        assert!(json.get("property_type").is_none());
    }
}
