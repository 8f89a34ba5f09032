// Raw record shapes returned by the block-explorer `account` endpoints.
// Every field arrives as a string; normalization into the ledger
// `Transaction` model happens here so the rest of the system never sees
// explorer quirks.

use crate::models::{Transaction, TxKind};
use serde::Deserialize;

/// `module=account&action=txlist` row.
#[derive(Debug, Clone, Deserialize)]
pub struct NativeTxRecord {
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: String,
    #[serde(rename = "gasPrice", default)]
    pub gas_price: String,
    #[serde(rename = "methodId", default)]
    pub method_id: String,
    #[serde(rename = "functionName", default)]
    pub function_name: String,
}

/// `module=account&action=txlistinternal` row. Internal calls carry no
/// gas price or decoded function of their own.
#[derive(Debug, Clone, Deserialize)]
pub struct InternalTxRecord {
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: String,
}

/// `module=account&action=tokentx` (ERC-20) row.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenTxRecord {
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(rename = "tokenName", default)]
    pub token_name: String,
    #[serde(rename = "tokenSymbol", default)]
    pub token_symbol: String,
    #[serde(rename = "tokenDecimal", default)]
    pub token_decimal: String,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: String,
    #[serde(rename = "gasPrice", default)]
    pub gas_price: String,
}

/// `module=account&action=tokennfttx` (ERC-721) row.
#[derive(Debug, Clone, Deserialize)]
pub struct NftTxRecord {
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(rename = "tokenID")]
    pub token_id: String,
    #[serde(rename = "tokenName", default)]
    pub token_name: String,
    #[serde(rename = "tokenSymbol", default)]
    pub token_symbol: String,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: String,
    #[serde(rename = "gasPrice", default)]
    pub gas_price: String,
}

/// `module=account&action=token1155tx` (ERC-1155) row.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiTokenTxRecord {
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(rename = "tokenID")]
    pub token_id: String,
    #[serde(rename = "tokenValue", default)]
    pub token_value: String,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: String,
}

fn parse_i64(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}

fn opt(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn opt_i64(s: &str) -> Option<i64> {
    if s.is_empty() {
        None
    } else {
        s.parse().ok()
    }
}

impl NativeTxRecord {
    pub fn into_transaction(self, owner: &str) -> Transaction {
        Transaction {
            hash: self.hash,
            contract_address: owner.to_string(),
            block_number: parse_i64(&self.block_number),
            timestamp: parse_i64(&self.time_stamp),
            from_address: self.from.to_lowercase(),
            to_address: self.to.to_lowercase(),
            value: self.value,
            kind: TxKind::Native,
            gas_used: opt_i64(&self.gas_used),
            gas_price: opt(self.gas_price),
            method_id: opt(self.method_id),
            function_name: opt(self.function_name),
        }
    }
}

impl InternalTxRecord {
    pub fn into_transaction(self, owner: &str) -> Transaction {
        Transaction {
            hash: self.hash,
            contract_address: owner.to_string(),
            block_number: parse_i64(&self.block_number),
            timestamp: parse_i64(&self.time_stamp),
            from_address: self.from.to_lowercase(),
            to_address: self.to.to_lowercase(),
            value: self.value,
            kind: TxKind::Internal,
            gas_used: opt_i64(&self.gas_used),
            gas_price: None,
            method_id: None,
            function_name: None,
        }
    }
}

impl TokenTxRecord {
    pub fn into_transaction(self, owner: &str) -> Transaction {
        Transaction {
            hash: self.hash,
            contract_address: owner.to_string(),
            block_number: parse_i64(&self.block_number),
            timestamp: parse_i64(&self.time_stamp),
            from_address: self.from.to_lowercase(),
            to_address: self.to.to_lowercase(),
            value: self.value,
            kind: TxKind::TokenTransfer {
                token_address: self.contract_address.to_lowercase(),
                symbol: self.token_symbol,
                name: self.token_name,
                decimals: self.token_decimal.parse().unwrap_or(18),
            },
            gas_used: opt_i64(&self.gas_used),
            gas_price: opt(self.gas_price),
            method_id: None,
            function_name: None,
        }
    }
}

impl NftTxRecord {
    pub fn into_transaction(self, owner: &str) -> Transaction {
        Transaction {
            hash: self.hash,
            contract_address: owner.to_string(),
            block_number: parse_i64(&self.block_number),
            timestamp: parse_i64(&self.time_stamp),
            from_address: self.from.to_lowercase(),
            to_address: self.to.to_lowercase(),
            // ERC-721 transfers move a single token, not a value.
            value: "0".to_string(),
            kind: TxKind::NftTransfer {
                token_address: self.contract_address.to_lowercase(),
                symbol: self.token_symbol,
                name: self.token_name,
                token_id: self.token_id,
            },
            gas_used: opt_i64(&self.gas_used),
            gas_price: opt(self.gas_price),
            method_id: None,
            function_name: None,
        }
    }
}

impl MultiTokenTxRecord {
    pub fn into_transaction(self, owner: &str) -> Transaction {
        let quantity = if self.token_value.is_empty() {
            "1".to_string()
        } else {
            self.token_value
        };
        Transaction {
            hash: self.hash,
            contract_address: owner.to_string(),
            block_number: parse_i64(&self.block_number),
            timestamp: parse_i64(&self.time_stamp),
            from_address: self.from.to_lowercase(),
            to_address: self.to.to_lowercase(),
            value: "0".to_string(),
            kind: TxKind::MultiTokenTransfer {
                token_address: self.contract_address.to_lowercase(),
                token_id: self.token_id,
                quantity,
            },
            gas_used: opt_i64(&self.gas_used),
            gas_price: None,
            method_id: None,
            function_name: None,
        }
    }
}
