//! Cache key generation for read-side query results

use std::fmt;

/// Structured key for one paginated, time-filtered transaction read.
/// Identical dashboard polls and "load more" races hash to the same key
/// and coalesce onto one store query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub address: String,
    pub page: i64,
    pub page_size: i64,
    pub start_time: i64,
    pub end_time: i64,
}

impl QueryKey {
    pub fn new(address: &str, page: i64, page_size: i64, start_time: i64, end_time: i64) -> Self {
        Self {
            address: address.to_string(),
            page,
            page_size,
            start_time,
            end_time,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx:{}:{}:{}:{}:{}",
            self.address, self.page, self.page_size, self.start_time, self.end_time
        )
    }
}
