use dotenv::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub explorer_api_url: String,
    pub explorer_api_key: String,
    /// Minimum spacing between explorer requests, shared by the whole client.
    pub min_request_interval: Duration,
    /// Base delay for exponential backoff (doubles per attempt).
    pub retry_base_delay: Duration,
    pub sweep_interval: Duration,
    pub contract_delay: Duration,
    pub cache_ttl: Duration,
    pub cache_max_capacity: u64,
    pub insert_batch_size: usize,
    /// Block-window width for backward deep-history sync.
    pub backfill_window_blocks: u64,
    /// Windows walked per backfill invocation before yielding.
    pub backfill_max_windows: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:treasury.db".to_string());
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);
        let explorer_api_url = env::var("EXPLORER_API_URL")
            .unwrap_or_else(|_| "https://api.etherscan.io/api".to_string());
        let explorer_api_key = env::var("EXPLORER_API_KEY").unwrap_or_default();
        let min_request_interval = env::var("MIN_REQUEST_INTERVAL_MS")
            .unwrap_or_else(|_| "250".to_string())
            .parse()
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(250));
        let retry_base_delay = env::var("RETRY_BASE_DELAY_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(1));
        let sweep_interval = env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(900));
        let contract_delay = env::var("CONTRACT_DELAY_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));
        let cache_ttl = env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(300));
        let cache_max_capacity = env::var("CACHE_MAX_CAPACITY")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .unwrap_or(1000);
        let insert_batch_size = env::var("INSERT_BATCH_SIZE")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .unwrap_or(1000);
        let backfill_window_blocks = env::var("BACKFILL_WINDOW_BLOCKS")
            .unwrap_or_else(|_| "100000".to_string())
            .parse()
            .unwrap_or(100_000);
        let backfill_max_windows = env::var("BACKFILL_MAX_WINDOWS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        Self {
            database_url,
            server_host,
            server_port,
            explorer_api_url,
            explorer_api_key,
            min_request_interval,
            retry_base_delay,
            sweep_interval,
            contract_delay,
            cache_ttl,
            cache_max_capacity,
            insert_batch_size,
            backfill_window_blocks,
            backfill_max_windows,
        }
    }
}
