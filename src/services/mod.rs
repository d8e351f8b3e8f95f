// All service modules
pub mod cache_service;
pub mod pagination;
pub mod token_service;
pub mod token_sweeper;

// Re-export for convenience
pub use cache_service::CacheService;
pub use pagination::{Paginated, PaginationQuery};
pub use token_service::TokenService;
pub use token_sweeper::TokenSweeper;

use crate::db::Database;
use std::sync::Arc;

/// Start all background services
pub async fn start_background_services(db: Database) {
    tracing::info!("Starting background services...");

    let sweeper = Arc::new(TokenSweeper::new(db));
    sweeper.start().await;

    tracing::info!("All background services started successfully");
}
