pub mod cache_tests;
pub mod sync_tests;
pub mod validation_tests;

use crate::config::Config;
use crate::db::connection;
use crate::models::{ContractCategory, Transaction, TxKind};
use crate::registry::{MonitoredContract, Registry};
use axum::Router;
use sqlx::SqlitePool;
use std::time::Duration;

pub const TREASURY_ADDRESS: &str = "0x0bc3807ec262cb779b38d65b38158acc3bfede10";
pub const AUCTION_ADDRESS: &str = "0x830bd73e4184cef73443c15111a1df14e495c706";
pub const OUTSIDE_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
pub const USDC_ADDRESS: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
pub const STETH_ADDRESS: &str = "0xae7ab96520de3a18e5e111b5eaab095312d7fe84";

/// Serves an explorer stub on an ephemeral local port and returns its
/// base URL.
pub async fn serve_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub listener");
    let addr = listener.local_addr().expect("stub listener has no address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

/// Config pointed at a stub explorer, with delays shrunk so retry and
/// rate-limit paths run in milliseconds.
pub fn test_config(explorer_url: &str) -> Config {
    let mut config = Config::from_env();
    config.explorer_api_url = explorer_url.to_string();
    config.explorer_api_key = String::new();
    config.min_request_interval = Duration::from_millis(1);
    config.retry_base_delay = Duration::from_millis(1);
    config
}

/// Registry with the test treasury contract and the default token set.
pub fn test_registry() -> Registry {
    Registry::with_contracts(vec![MonitoredContract {
        address: TREASURY_ADDRESS.to_string(),
        name: "Treasury".to_string(),
        category: ContractCategory::Treasury,
    }])
}

/// Fresh in-memory database with the full schema applied.
pub async fn test_pool() -> SqlitePool {
    connection::establish_test_connection()
        .await
        .expect("failed to create in-memory database")
}

/// Registers a contract row so transaction inserts satisfy the foreign key.
pub async fn register_contract(pool: &SqlitePool, address: &str) {
    crate::db::contract::ensure_contract(pool, address, "Test", ContractCategory::Treasury)
        .await
        .expect("failed to register contract");
    crate::db::sync_status::ensure_status(pool, address)
        .await
        .expect("failed to initialize sync status");
}

pub fn native_tx(
    hash: &str,
    contract: &str,
    timestamp: i64,
    block_number: i64,
    from: &str,
    to: &str,
    value: &str,
) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        contract_address: contract.to_string(),
        block_number,
        timestamp,
        from_address: from.to_string(),
        to_address: to.to_string(),
        value: value.to_string(),
        kind: TxKind::Native,
        gas_used: Some(21_000),
        gas_price: Some("30000000000".to_string()),
        method_id: None,
        function_name: None,
    }
}

pub fn token_tx(
    hash: &str,
    contract: &str,
    timestamp: i64,
    from: &str,
    to: &str,
    value: &str,
    token_address: &str,
    symbol: &str,
    decimals: u32,
) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        contract_address: contract.to_string(),
        block_number: timestamp / 12,
        timestamp,
        from_address: from.to_string(),
        to_address: to.to_string(),
        value: value.to_string(),
        kind: TxKind::TokenTransfer {
            token_address: token_address.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals,
        },
        gas_used: Some(65_000),
        gas_price: Some("30000000000".to_string()),
        method_id: None,
        function_name: None,
    }
}

pub fn nft_tx(
    hash: &str,
    contract: &str,
    timestamp: i64,
    from: &str,
    to: &str,
    collection: &str,
    token_id: &str,
) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        contract_address: contract.to_string(),
        block_number: timestamp / 12,
        timestamp,
        from_address: from.to_string(),
        to_address: to.to_string(),
        value: "0".to_string(),
        kind: TxKind::NftTransfer {
            token_address: collection.to_string(),
            symbol: "NFT".to_string(),
            name: "Test Collection".to_string(),
            token_id: token_id.to_string(),
        },
        gas_used: Some(90_000),
        gas_price: None,
        method_id: None,
        function_name: None,
    }
}
