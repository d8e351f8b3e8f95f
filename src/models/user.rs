use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ==================== USER ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub address: String,
    pub chain: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
    pub games_played: i32,
    pub game_won: i32,
    pub game_lost: i32,
    pub total_staked: Decimal,
    pub total_earned: Decimal,
    pub total_withdrawn: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

// ==================== REFRESH TOKEN ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub token: String,
    pub user_id: i32,
    pub is_revoked: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_user() -> User {
        User {
            id: 1,
            username: "player_one".to_string(),
            address: "0xabc123".to_string(),
            chain: "BASE".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            role: "user".to_string(),
            games_played: 3,
            game_won: 1,
            game_lost: 2,
            total_staked: Decimal::ZERO,
            total_earned: Decimal::ZERO,
            total_withdrawn: Decimal::ZERO,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "player_one");
    }

    #[test]
    fn is_admin_checks_role() {
        let mut user = sample_user();
        assert!(!user.is_admin());
        user.role = "admin".to_string();
        assert!(user.is_admin());
    }

    #[test]
    fn refresh_token_expiry_is_exclusive_of_the_deadline() {
        let expires_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let token = RefreshToken {
            id: Uuid::nil(),
            token: "tok".to_string(),
            user_id: 1,
            is_revoked: false,
            expires_at,
            created_at: expires_at - Duration::days(7),
        };
        assert!(!token.is_expired(expires_at));
        assert!(token.is_expired(expires_at + Duration::seconds(1)));
    }
}
