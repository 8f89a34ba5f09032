pub mod keys;

use crate::{config::Config, models::TransactionPage};
use moka::future::Cache;
use std::sync::Arc;

pub use keys::QueryKey;

/// Short-TTL result cache in front of paginated transaction reads.
/// Writers never invalidate entries; staleness up to the TTL is the
/// accepted trade-off. In-flight coalescing comes from moka's
/// `try_get_with` at the call site.
pub type QueryCache = Cache<QueryKey, Arc<TransactionPage>>;

pub fn init_cache(config: &Config) -> QueryCache {
    Cache::builder()
        .time_to_live(config.cache_ttl)
        .max_capacity(config.cache_max_capacity)
        .build()
}
