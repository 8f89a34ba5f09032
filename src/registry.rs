// Monitored-contract registry. The set of treasury addresses is
// configuration, not data: syncs are only ever issued for addresses
// listed here, and anything else fails fast at the API boundary.

use crate::models::ContractCategory;
use serde::Deserialize;
use std::env;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoredContract {
    pub address: String,
    pub name: String,
    pub category: ContractCategory,
}

/// A fungible token whose balance the treasury dashboard cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackedToken {
    pub address: String,
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone)]
pub struct Registry {
    contracts: Vec<MonitoredContract>,
    tokens: Vec<TrackedToken>,
}

impl Registry {
    /// Load the registry from `MONITORED_CONTRACTS` / `TRACKED_TOKENS`
    /// (JSON arrays), falling back to the built-in defaults.
    pub fn from_env() -> Self {
        let contracts = match env::var("MONITORED_CONTRACTS") {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("MONITORED_CONTRACTS is not valid JSON ({}), using defaults", e);
                    default_contracts()
                }
            },
            Err(_) => default_contracts(),
        };
        let tokens = match env::var("TRACKED_TOKENS") {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("TRACKED_TOKENS is not valid JSON ({}), using defaults", e);
                    default_tokens()
                }
            },
            Err(_) => default_tokens(),
        };

        let mut contracts: Vec<MonitoredContract> = contracts;
        for c in &mut contracts {
            c.address = c.address.to_lowercase();
        }
        let mut tokens: Vec<TrackedToken> = tokens;
        for t in &mut tokens {
            t.address = t.address.to_lowercase();
        }

        Self { contracts, tokens }
    }

    pub fn contracts(&self) -> &[MonitoredContract] {
        &self.contracts
    }

    pub fn is_monitored(&self, address: &str) -> bool {
        self.get(address).is_some()
    }

    pub fn get(&self, address: &str) -> Option<&MonitoredContract> {
        let address = address.to_lowercase();
        self.contracts.iter().find(|c| c.address == address)
    }

    pub fn token_by_address(&self, address: &str) -> Option<&TrackedToken> {
        let address = address.to_lowercase();
        self.tokens.iter().find(|t| t.address == address)
    }

    #[cfg(test)]
    pub fn with_contracts(contracts: Vec<MonitoredContract>) -> Self {
        let mut contracts = contracts;
        for c in &mut contracts {
            c.address = c.address.to_lowercase();
        }
        Self { contracts, tokens: default_tokens() }
    }
}

fn default_contracts() -> Vec<MonitoredContract> {
    vec![
        MonitoredContract {
            address: "0x0bc3807ec262cb779b38d65b38158acc3bfede10".to_string(),
            name: "Treasury".to_string(),
            category: ContractCategory::Treasury,
        },
        MonitoredContract {
            address: "0x830bd73e4184cef73443c15111a1df14e495c706".to_string(),
            name: "Auction House".to_string(),
            category: ContractCategory::Auction,
        },
        MonitoredContract {
            address: "0xd97bcd9f47cee35c0a9ec1dc40c1269afc9e8e1d".to_string(),
            name: "Payment Streamer".to_string(),
            category: ContractCategory::Payment,
        },
        MonitoredContract {
            address: "0x6f3e6272a167e8accb32072d08e0957f9c79223d".to_string(),
            name: "Governor".to_string(),
            category: ContractCategory::Governance,
        },
        MonitoredContract {
            address: "0x9c8ff314c9bc7f6e59a9d9225fb22946427edc03".to_string(),
            name: "Token".to_string(),
            category: ContractCategory::Token,
        },
    ]
}

fn default_tokens() -> Vec<TrackedToken> {
    vec![
        TrackedToken {
            address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
            symbol: "USDC".to_string(),
            decimals: 6,
        },
        TrackedToken {
            address: "0xae7ab96520de3a18e5e111b5eaab095312d7fe84".to_string(),
            symbol: "stETH".to_string(),
            decimals: 18,
        },
        TrackedToken {
            address: "0x7f39c581f595b53c5cb19bd0b3f8da6c935e2ca0".to_string(),
            symbol: "wstETH".to_string(),
            decimals: 18,
        },
        TrackedToken {
            address: "0xae78736cd615f374d3085123a210448e74fc6393".to_string(),
            symbol: "rETH".to_string(),
            decimals: 18,
        },
    ]
}
