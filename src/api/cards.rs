// Shared plumbing for the two card decks. The decks have identical
// mechanics; only routes and tables differ (see models::Deck).

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::{
    db::NewCard,
    error::{AppError, Result},
    models::{Card, CardType, Deck},
};

use super::{require_admin, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub instruction: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub amount: Option<i32>,
    pub position: Option<i32>,
    pub extra: Option<serde_json::Value>,
}

/// Admin-only card creation with a duplicate-instruction check; the
/// unique index backstops the race.
pub(super) async fn create_card(
    state: &AppState,
    headers: &HeaderMap,
    deck: Deck,
    req: CreateCardRequest,
) -> Result<Card> {
    require_admin(headers, state).await?;

    let instruction = req.instruction.trim().to_string();
    validate_card(&instruction, req.amount, req.position)?;

    if state
        .db
        .get_card_by_instruction(deck, &instruction)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "A {} card with this instruction already exists",
            deck.label()
        )));
    }

    let card = state
        .db
        .create_card(
            deck,
            &NewCard {
                instruction,
                card_type: req.card_type,
                amount: req.amount,
                position: req.position,
                extra: req.extra,
            },
        )
        .await?;

    tracing::info!("Created {} card {}", deck.label(), card.id);
    Ok(card)
}

pub(super) async fn draw_card(state: &AppState, deck: Deck) -> Result<Card> {
    state
        .db
        .draw_card(deck)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("The {} deck is empty", deck.label())))
}

fn validate_card(instruction: &str, amount: Option<i32>, position: Option<i32>) -> Result<()> {
    if instruction.is_empty() {
        return Err(AppError::Validation(
            "instruction must not be empty".to_string(),
        ));
    }
    if amount.is_some_and(|a| a < 0) {
        return Err(AppError::Validation(
            "Amount must be a non-negative number".to_string(),
        ));
    }
    if position.is_some_and(|p| p < 0) {
        return Err(AppError::Validation(
            "Position must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

pub(super) async fn invalidate_deck_cache(state: &AppState, route: &str) {
    let pattern = format!("cache:GET:{}*", route);
    if let Err(e) = state.cache().delete_pattern(&pattern).await {
        tracing::warn!("Deck cache invalidation failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_card_rejects_blank_instruction() {
        assert!(validate_card("", None, None).is_err());
        assert!(validate_card("Advance to GO", None, None).is_ok());
    }

    #[test]
    fn validate_card_rejects_negative_amount_and_position() {
        assert!(validate_card("Pay school fees", Some(-50), None).is_err());
        assert!(validate_card("Advance to GO", None, Some(-1)).is_err());
        assert!(validate_card("Bank pays you dividend", Some(50), Some(0)).is_ok());
    }
}
