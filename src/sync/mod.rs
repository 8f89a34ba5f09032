pub mod orchestrator;
pub mod scheduler;

// Re-exports for convenience
pub use orchestrator::{begin_backfill, begin_sync, sync_contract, SyncError};
pub use scheduler::{run_sweep, start_scheduler};
