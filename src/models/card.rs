use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ==================== CARD DECKS ====================
/// The two Monopoly card decks. Identical row shape, separate tables
/// and routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deck {
    Chance,
    CommunityChest,
}

impl Deck {
    pub fn table(&self) -> &'static str {
        match self {
            Deck::Chance => "chances",
            Deck::CommunityChest => "community_chests",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Deck::Chance => "Chance",
            Deck::CommunityChest => "Community Chest",
        }
    }
}

/// What drawing the card makes the player do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "card_type", rename_all = "snake_case")]
pub enum CardType {
    Collect,
    Pay,
    Move,
    GoToJail,
    GetOutOfJail,
}

impl CardType {
    pub const ALL: [CardType; 5] = [
        CardType::Collect,
        CardType::Pay,
        CardType::Move,
        CardType::GoToJail,
        CardType::GetOutOfJail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Collect => "collect",
            CardType::Pay => "pay",
            CardType::Move => "move",
            CardType::GoToJail => "go_to_jail",
            CardType::GetOutOfJail => "get_out_of_jail",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: i32,
    pub instruction: String,
    pub card_type: CardType,
    pub amount: Option<i32>,
    pub position: Option<i32>,
    pub extra: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(CardType::GoToJail).unwrap(),
            serde_json::json!("go_to_jail")
        );
        let parsed: CardType = serde_json::from_value(serde_json::json!("collect")).unwrap();
        assert_eq!(parsed, CardType::Collect);
    }

    #[test]
    fn card_type_parse_round_trips_every_variant() {
        for card_type in CardType::ALL {
            assert_eq!(CardType::parse(card_type.as_str()), Some(card_type));
        }
        assert_eq!(CardType::parse("teleport"), None);
    }

    #[test]
    fn deck_tables_are_distinct() {
        assert_ne!(Deck::Chance.table(), Deck::CommunityChest.table());
    }
}
