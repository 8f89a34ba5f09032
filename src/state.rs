use crate::cache::QueryCache;
use crate::config::Config;
use crate::explorer::ExplorerClient;
use crate::registry::Registry;
use sqlx::SqlitePool;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub registry: Registry,
    pub db_pool: SqlitePool,
    pub cache: QueryCache,
    pub explorer: Arc<ExplorerClient>,
    /// Non-durable guard: at most one full sweep runs per process.
    /// Restart loses the flag (harmless); per-contract watermarks are
    /// the persisted recovery state.
    pub sweep_active: AtomicBool,
}
