use axum::{extract::State, Json};
use redis::AsyncCommands;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub redis: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_status = if state.db.pool().acquire().await.is_ok() {
        "connected".to_string()
    } else {
        "disconnected".to_string()
    };

    // Round-trip a short-lived key so a half-broken connection shows up.
    let redis_status = {
        let mut conn = state.redis.clone();
        let write: std::result::Result<(), redis::RedisError> =
            conn.set_ex("health-check", "ok", 10).await;
        let read: std::result::Result<Option<String>, redis::RedisError> =
            conn.get("health-check").await;
        match (write, read) {
            (Ok(()), Ok(Some(value))) if value == "ok" => "connected".to_string(),
            _ => "disconnected".to_string(),
        }
    };

    let status = if db_status == "connected" && redis_status == "connected" {
        "ok".to_string()
    } else {
        "degraded".to_string()
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        redis: redis_status,
    })
}
