pub mod aggregation;
pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod explorer;
pub mod models;
pub mod registry;
pub mod state;
pub mod sync;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
pub use explorer::{ClientError, ExplorerClient};
pub use models::{SyncStatus, Transaction, TxKind};
pub use state::AppState;
pub use validation::{normalize_address, validate_address};
