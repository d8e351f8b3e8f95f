use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    db::Database,
    error::{AppError, Result},
    models::{RefreshToken, User},
};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub role: String,
    pub token_type: String,
    pub jti: String, // keeps tokens minted in the same second distinct
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32> {
        self.sub.parse().map_err(|_| AppError::InvalidToken)
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

// ==================== PASSWORD HASHING ====================

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// ==================== JWT HELPERS ====================

fn sign_token(user: &User, token_type: &str, ttl_secs: u64, secret: &str) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::seconds(ttl_secs as i64))
        .ok_or_else(|| AppError::Internal("Token expiry overflow".to_string()))?;

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role.clone(),
        token_type: token_type.to_string(),
        jti: uuid::Uuid::new_v4().to_string(),
        exp: expiration.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

pub fn sign_access_token(user: &User, config: &Config) -> Result<String> {
    sign_token(
        user,
        TOKEN_TYPE_ACCESS,
        config.jwt_expires_in_secs,
        &config.jwt_secret,
    )
}

pub fn sign_refresh_token(user: &User, config: &Config) -> Result<String> {
    sign_token(
        user,
        TOKEN_TYPE_REFRESH,
        config.jwt_refresh_expires_in_secs,
        &config.jwt_secret,
    )
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

/// Decodes and checks the token_type claim; an access token presented
/// where a refresh token is expected (or vice versa) is rejected.
pub fn decode_claims_of_type(token: &str, secret: &str, expected_type: &str) -> Result<Claims> {
    let claims = decode_claims(token, secret)?;
    if claims.token_type != expected_type {
        return Err(AppError::InvalidToken);
    }
    Ok(claims)
}

// ==================== TOKEN SERVICE ====================

/// Issues token pairs and drives refresh rotation against the database.
pub struct TokenService {
    db: Database,
    config: Config,
}

impl TokenService {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config }
    }

    /// Access + refresh pair; the refresh token is persisted for rotation.
    pub async fn issue_token_pair(&self, user: &User) -> Result<TokenPair> {
        let access_token = sign_access_token(user, &self.config)?;
        let refresh_token = self.create_refresh_token(user).await?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.token,
            expires_in: self.config.jwt_expires_in_secs as i64,
        })
    }

    async fn create_refresh_token(&self, user: &User) -> Result<RefreshToken> {
        let token = sign_refresh_token(user, &self.config)?;
        let expires_at: DateTime<Utc> = Utc::now()
            + Duration::seconds(self.config.jwt_refresh_expires_in_secs as i64);
        self.db
            .insert_refresh_token(user.id, &token, expires_at)
            .await
    }

    /// Rotation: the presented token must be known, unrevoked, unexpired
    /// and carry the refresh type claim. The old token is revoked before
    /// the new pair is issued.
    pub async fn rotate_refresh_token(&self, token: &str) -> Result<(User, TokenPair)> {
        decode_claims_of_type(token, &self.config.jwt_secret, TOKEN_TYPE_REFRESH)?;

        let stored = self
            .db
            .get_active_refresh_token(token)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid refresh token".to_string()))?;

        if stored.is_expired(Utc::now()) {
            return Err(AppError::AuthError("Refresh token expired".to_string()));
        }

        self.db.revoke_refresh_token(stored.id).await?;

        let user = self
            .db
            .get_user(stored.user_id)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid refresh token".to_string()))?;

        let pair = self.issue_token_pair(&user).await?;
        Ok((user, pair))
    }

    /// Revokes every outstanding refresh token for the user.
    pub async fn revoke_all(&self, user_id: i32) -> Result<u64> {
        self.db.revoke_user_refresh_tokens(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn sample_user() -> User {
        User {
            id: 42,
            username: "player_one".to_string(),
            address: "0xabc123".to_string(),
            chain: "BASE".to_string(),
            password_hash: String::new(),
            role: "user".to_string(),
            games_played: 0,
            game_won: 0,
            game_lost: 0,
            total_staked: Decimal::ZERO,
            total_earned: Decimal::ZERO,
            total_withdrawn: Decimal::ZERO,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let config = test_config();
        let user = sample_user();
        let token = sign_access_token(&user, &config).unwrap();
        let claims = decode_claims(&token, &config.jwt_secret).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username, "player_one");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
    }

    #[test]
    fn access_token_is_rejected_where_refresh_is_expected() {
        let config = test_config();
        let token = sign_access_token(&sample_user(), &config).unwrap();
        let result = decode_claims_of_type(&token, &config.jwt_secret, TOKEN_TYPE_REFRESH);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn refresh_token_carries_refresh_type() {
        let config = test_config();
        let token = sign_refresh_token(&sample_user(), &config).unwrap();
        let claims =
            decode_claims_of_type(&token, &config.jwt_secret, TOKEN_TYPE_REFRESH).unwrap();
        assert_eq!(claims.token_type, TOKEN_TYPE_REFRESH);
    }

    #[test]
    fn consecutive_tokens_for_one_user_are_distinct() {
        let config = test_config();
        let user = sample_user();
        let first = sign_refresh_token(&user, &config).unwrap();
        let second = sign_refresh_token(&user, &config).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn decode_rejects_a_foreign_secret() {
        let config = test_config();
        let token = sign_access_token(&sample_user(), &config).unwrap();
        assert!(decode_claims(&token, "some_other_secret").is_err());
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("hunter2!", crate::constants::BCRYPT_MIN_COST).unwrap();
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("hunter3!", &hash));
        assert!(!verify_password("hunter2!", "not-a-bcrypt-hash"));
    }

    #[test]
    fn claims_with_non_numeric_subject_fail_user_id() {
        let claims = Claims {
            sub: "abc".to_string(),
            username: "x".to_string(),
            role: "user".to_string(),
            token_type: TOKEN_TYPE_ACCESS.to_string(),
            jti: "test".to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(claims.user_id().is_err());
    }
}
