use serde::Deserialize;
use std::env;

use crate::constants::{
    ACCESS_TOKEN_TTL_SECS, BCRYPT_COST_DEFAULT, BCRYPT_MAX_COST, BCRYPT_MIN_COST, CACHE_TTL_SECS,
    REFRESH_TOKEN_TTL_SECS,
};
use crate::utils::parse_duration_secs;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Redis
    pub redis_url: String,

    // JWT
    pub jwt_secret: String,
    pub jwt_expires_in_secs: u64,
    pub jwt_refresh_expires_in_secs: u64,

    // Password hashing
    pub bcrypt_cost: u32,

    // Caching
    pub cache_ttl_secs: u64,

    // Rate Limiting
    pub rate_limit_public: u32,
    pub rate_limit_authenticated: u32,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            jwt_secret: env::var("JWT_SECRET")?,
            // Duration strings like "15m" / "7d"; malformed values fall back.
            jwt_expires_in_secs: parse_duration_secs(
                env::var("JWT_EXPIRES_IN").ok().as_deref(),
                ACCESS_TOKEN_TTL_SECS,
            ),
            jwt_refresh_expires_in_secs: parse_duration_secs(
                env::var("JWT_REFRESH_EXPIRES_IN").ok().as_deref(),
                REFRESH_TOKEN_TTL_SECS,
            ),

            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(BCRYPT_COST_DEFAULT),

            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(CACHE_TTL_SECS),

            rate_limit_public: env::var("RATE_LIMIT_PUBLIC")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            rate_limit_authenticated: env::var("RATE_LIMIT_AUTHENTICATED")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET is empty");
        }
        if self.jwt_expires_in_secs >= self.jwt_refresh_expires_in_secs {
            anyhow::bail!("JWT_EXPIRES_IN must be shorter than JWT_REFRESH_EXPIRES_IN");
        }
        if self.bcrypt_cost < BCRYPT_MIN_COST || self.bcrypt_cost > BCRYPT_MAX_COST {
            anyhow::bail!("BCRYPT_COST out of range");
        }

        if self.jwt_secret.contains("change-this") || self.jwt_secret.contains("super_secret") {
            tracing::warn!("Detected dev credentials in config");
        }
        if self.rate_limit_public == 0 || self.rate_limit_authenticated == 0 {
            tracing::warn!("Rate limit values should be > 0");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "0.0.0.0".to_string(),
        port: 3000,
        environment: "development".to_string(),
        database_url: "postgres://localhost/tycoon_test".to_string(),
        database_max_connections: 1,
        redis_url: "redis://localhost:6379".to_string(),
        jwt_secret: "test_secret".to_string(),
        jwt_expires_in_secs: 900,
        jwt_refresh_expires_in_secs: 604800,
        bcrypt_cost: BCRYPT_MIN_COST,
        cache_ttl_secs: 300,
        rate_limit_public: 100,
        rate_limit_authenticated: 300,
        cors_allowed_origins: "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_test_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_jwt_secret() {
        let mut config = test_config();
        config.jwt_secret = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_access_ttl_longer_than_refresh() {
        let mut config = test_config();
        config.jwt_expires_in_secs = config.jwt_refresh_expires_in_secs;
        assert!(config.validate().is_err());
    }

    #[test]
    fn is_production_only_for_production_environment() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "production".to_string();
        assert!(config.is_production());
    }
}
