use crate::config::Config;
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Explorer API error: {0}")]
    Api(String),

    #[error("Failed to decode explorer response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected explorer response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Transient failures are worth retrying; decode failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api(_))
    }
}

/// The explorer signals rate limits and empty result sets in the
/// response body, not the HTTP status, so every response goes through
/// this classification before the retry loop sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Empty,
    RateLimited,
    Error(String),
}

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

pub fn classify_response(envelope: &ApiEnvelope) -> ResponseClass {
    if envelope.status == "1" {
        return ResponseClass::Success;
    }

    let message = envelope.message.to_lowercase();
    let result_text = envelope
        .result
        .as_str()
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    if message.contains("rate limit") || result_text.contains("rate limit") {
        return ResponseClass::RateLimited;
    }
    if message.contains("no transactions found") || message.contains("no records found") {
        return ResponseClass::Empty;
    }

    if result_text.is_empty() {
        ResponseClass::Error(envelope.message.clone())
    } else {
        ResponseClass::Error(format!("{}: {}", envelope.message, result_text))
    }
}

/// Exponential backoff: `base * 2^attempt`, saturating.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Rate-limited, retrying client over the block-explorer HTTP API.
/// One instance owns one rate budget: the governor limiter enforces the
/// minimum inter-request spacing across every endpoint and kind.
pub struct ExplorerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: DefaultDirectRateLimiter,
    retry_base_delay: Duration,
}

impl ExplorerClient {
    pub fn new(config: &Config) -> Self {
        let interval = if config.min_request_interval.is_zero() {
            Duration::from_millis(1)
        } else {
            config.min_request_interval
        };
        let quota =
            Quota::with_period(interval).unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));

        info!(
            "Initializing explorer client for {} (min request interval {:?})",
            config.explorer_api_url, interval
        );

        Self {
            http: reqwest::Client::new(),
            base_url: config.explorer_api_url.clone(),
            api_key: config.explorer_api_key.clone(),
            limiter: RateLimiter::direct(quota),
            retry_base_delay: config.retry_base_delay,
        }
    }

    /// Latest chain block number (`proxy/eth_blockNumber`, hex result).
    pub async fn get_latest_block(&self) -> Result<u64, ClientError> {
        let params = vec![
            ("module", "proxy".to_string()),
            ("action", "eth_blockNumber".to_string()),
        ];
        let raw = (|| self.proxy_call(&params))
            .retry(self.retry_policy())
            .when(ClientError::is_transient)
            .notify(|err, dur| warn!("eth_blockNumber failed: {}, retrying in {:?}", err, dur))
            .await?;

        let hex = raw
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::InvalidResponse("missing result field".to_string()))?;
        u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|_| ClientError::InvalidResponse(format!("bad block number: {}", hex)))
    }

    /// Point-in-time native balance in wei, as a decimal string.
    pub async fn get_balance(&self, address: &str) -> Result<String, ClientError> {
        let params = vec![
            ("module", "account".to_string()),
            ("action", "balance".to_string()),
            ("address", address.to_string()),
            ("tag", "latest".to_string()),
        ];
        match self.call_with_retry(&params).await? {
            Some(result) => result
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ClientError::InvalidResponse("non-string balance".to_string())),
            None => Ok("0".to_string()),
        }
    }

    pub async fn get_native_transactions(
        &self,
        address: &str,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<super::models::NativeTxRecord>, ClientError> {
        self.fetch_list("txlist", address, start_block, end_block).await
    }

    pub async fn get_internal_transactions(
        &self,
        address: &str,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<super::models::InternalTxRecord>, ClientError> {
        self.fetch_list("txlistinternal", address, start_block, end_block).await
    }

    pub async fn get_token_transfers(
        &self,
        address: &str,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<super::models::TokenTxRecord>, ClientError> {
        self.fetch_list("tokentx", address, start_block, end_block).await
    }

    pub async fn get_nft_transfers(
        &self,
        address: &str,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<super::models::NftTxRecord>, ClientError> {
        self.fetch_list("tokennfttx", address, start_block, end_block).await
    }

    pub async fn get_multi_token_transfers(
        &self,
        address: &str,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<super::models::MultiTokenTxRecord>, ClientError> {
        self.fetch_list("token1155tx", address, start_block, end_block).await
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        action: &str,
        address: &str,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<T>, ClientError> {
        let params = vec![
            ("module", "account".to_string()),
            ("action", action.to_string()),
            ("address", address.to_string()),
            ("startblock", start_block.to_string()),
            ("endblock", end_block.to_string()),
            ("sort", "asc".to_string()),
        ];
        match self.call_with_retry(&params).await? {
            Some(result) => Ok(serde_json::from_value(result)?),
            None => Ok(Vec::new()),
        }
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.retry_base_delay)
            .with_max_times(5)
    }

    /// Bounded retries for outright errors. Rate-limit responses are
    /// handled inside `call` and never count against this cap.
    async fn call_with_retry(
        &self,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, ClientError> {
        (|| self.call(params))
            .retry(self.retry_policy())
            .when(ClientError::is_transient)
            .notify(|err, dur| warn!("explorer request failed: {}, retrying in {:?}", err, dur))
            .await
    }

    /// One logical request: waits for the rate budget, sends, classifies.
    /// On a rate-limit signal, backs off and retries the same request
    /// without an attempt cap; an empty result set returns `None`.
    async fn call(&self, params: &[(&str, String)]) -> Result<Option<Value>, ClientError> {
        let mut attempt: u32 = 0;
        loop {
            let raw = self.raw_request(params).await?;
            let envelope: ApiEnvelope = serde_json::from_value(raw)?;
            match classify_response(&envelope) {
                ResponseClass::Success => return Ok(Some(envelope.result)),
                ResponseClass::Empty => {
                    debug!("explorer returned no records");
                    return Ok(None);
                }
                ResponseClass::RateLimited => {
                    let delay = backoff_delay(self.retry_base_delay, attempt);
                    warn!("explorer rate limit hit, waiting {:?} before retry", delay);
                    sleep(delay).await;
                    attempt += 1;
                }
                ResponseClass::Error(message) => return Err(ClientError::Api(message)),
            }
        }
    }

    /// Proxy endpoints answer with a JSON-RPC envelope, but a throttled
    /// reply still arrives as a status/message body. Classify those so
    /// the rate-limit backoff applies here too.
    async fn proxy_call(&self, params: &[(&str, String)]) -> Result<Value, ClientError> {
        let mut attempt: u32 = 0;
        loop {
            let raw = self.raw_request(params).await?;
            if raw.get("status").is_none() {
                return Ok(raw);
            }
            let envelope: ApiEnvelope = serde_json::from_value(raw)?;
            match classify_response(&envelope) {
                ResponseClass::RateLimited => {
                    let delay = backoff_delay(self.retry_base_delay, attempt);
                    warn!("explorer rate limit hit, waiting {:?} before retry", delay);
                    sleep(delay).await;
                    attempt += 1;
                }
                ResponseClass::Error(message) => return Err(ClientError::Api(message)),
                ResponseClass::Success | ResponseClass::Empty => {
                    return Ok(serde_json::json!({ "result": envelope.result }));
                }
            }
        }
    }

    async fn raw_request(&self, params: &[(&str, String)]) -> Result<Value, ClientError> {
        self.limiter.until_ready().await;

        let mut request = self.http.get(&self.base_url).query(params);
        if !self.api_key.is_empty() {
            request = request.query(&[("apikey", self.api_key.as_str())]);
        }

        let response = request.send().await?;
        Ok(response.json::<Value>().await?)
    }
}
