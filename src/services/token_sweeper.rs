use std::sync::Arc;

use crate::{constants::TOKEN_SWEEP_INTERVAL_SECS, db::Database, error::Result};

/// Periodically deletes refresh tokens that are expired or already
/// revoked, so rotation history does not accumulate forever.
pub struct TokenSweeper {
    db: Database,
}

impl TokenSweeper {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Start the sweep loop.
    pub async fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                if let Err(e) = self.sweep_once().await {
                    tracing::error!("Refresh token sweep error: {}", e);
                }

                tokio::time::sleep(tokio::time::Duration::from_secs(
                    TOKEN_SWEEP_INTERVAL_SECS,
                ))
                .await;
            }
        });
    }

    async fn sweep_once(&self) -> Result<()> {
        let purged = self
            .db
            .purge_stale_refresh_tokens(chrono::Utc::now())
            .await?;
        if purged > 0 {
            tracing::info!("Purged {} stale refresh tokens", purged);
        }
        Ok(())
    }
}
