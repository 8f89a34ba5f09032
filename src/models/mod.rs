// Domain models shared by the sync, aggregation, and API layers.
// All monetary fields are decimal-digit strings (smallest token unit);
// nothing in here is ever a float.

use serde::{Deserialize, Serialize};

/// Category tag for a monitored contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractCategory {
    Treasury,
    Auction,
    Payment,
    Governance,
    Token,
}

impl ContractCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Treasury => "treasury",
            Self::Auction => "auction",
            Self::Payment => "payment",
            Self::Governance => "governance",
            Self::Token => "token",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "treasury" => Some(Self::Treasury),
            "auction" => Some(Self::Auction),
            "payment" => Some(Self::Payment),
            "governance" => Some(Self::Governance),
            "token" => Some(Self::Token),
            _ => None,
        }
    }
}

/// A fungible token position held by a contract. `balance` is the raw
/// amount in the token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub token_address: String,
    pub symbol: String,
    pub decimals: u32,
    pub balance: String,
}

/// A non-fungible position, derived by replaying transfer history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftHolding {
    pub collection_address: String,
    pub token_id: String,
    pub quantity: String,
}

/// Per-kind transaction counts and sync watermarks for a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub native_count: i64,
    pub internal_count: i64,
    pub token_count: i64,
    pub nft_count: i64,
    pub multi_token_count: i64,
    pub is_complete: bool,
    pub newest_block: Option<String>,
    pub oldest_block: Option<String>,
}

/// A monitored treasury contract and its derived balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub address: String,
    pub name: String,
    pub category: ContractCategory,
    pub native_balance: String,
    pub token_holdings: Vec<TokenHolding>,
    pub nft_holdings: Vec<NftHolding>,
    pub last_sync: Option<i64>,
    pub metadata: ContractMetadata,
}

/// The five transaction kinds, with kind-specific payloads so that an
/// NFT transfer without a token id is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxKind {
    Native,
    Internal,
    TokenTransfer {
        token_address: String,
        symbol: String,
        name: String,
        decimals: u32,
    },
    NftTransfer {
        token_address: String,
        symbol: String,
        name: String,
        token_id: String,
    },
    MultiTokenTransfer {
        token_address: String,
        token_id: String,
        quantity: String,
    },
}

impl TxKind {
    /// Discriminator string persisted in the `kind` column.
    pub fn discriminant(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Internal => "internal",
            Self::TokenTransfer { .. } => "token_transfer",
            Self::NftTransfer { .. } => "nft_transfer",
            Self::MultiTokenTransfer { .. } => "multi_token_transfer",
        }
    }
}

/// One immutable ledger row. `hash` is globally unique; the row belongs
/// to exactly one monitored contract even when both parties are monitored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub contract_address: String,
    pub block_number: i64,
    pub timestamp: i64,
    pub from_address: String,
    pub to_address: String,
    pub value: String,
    #[serde(flatten)]
    pub kind: TxKind,
    pub gas_used: Option<i64>,
    pub gas_price: Option<String>,
    pub method_id: Option<String>,
    pub function_name: Option<String>,
}

/// Sync lifecycle stages. `Complete` and `Error` are terminal until the
/// next scheduled run resets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStage {
    Idle,
    Queued,
    Initialized,
    Fetching,
    Processing,
    Complete,
    Error,
}

impl SyncStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Initialized => "initialized",
            Self::Fetching => "fetching",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "queued" => Some(Self::Queued),
            "initialized" => Some(Self::Initialized),
            "fetching" => Some(Self::Fetching),
            "processing" => Some(Self::Processing),
            "complete" => Some(Self::Complete),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Per-contract sync progress, persisted so a restart can resume from
/// the last watermark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub address: String,
    pub in_progress: bool,
    pub stage: SyncStage,
    pub progress: i64,
    pub last_sync: Option<i64>,
    pub error: Option<String>,
    pub last_synced_block: Option<String>,
    pub oldest_synced_block: Option<String>,
}

impl SyncStatus {
    /// Default status for a contract that has never been synced.
    pub fn idle(address: &str) -> Self {
        Self {
            address: address.to_string(),
            in_progress: false,
            stage: SyncStage::Idle,
            progress: 0,
            last_sync: None,
            error: None,
            last_synced_block: None,
            oldest_synced_block: None,
        }
    }
}

// API response models

#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub page_count: i64,
}

/// One calendar-day bucket of the inflow/outflow series. `cumulative`
/// is the running net across all prior buckets and may be negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyFlow {
    pub day: String,
    pub inflow: String,
    pub outflow: String,
    pub cumulative: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractSummary {
    pub address: String,
    pub name: String,
    pub category: ContractCategory,
    pub native_balance: String,
    pub token_holdings: Vec<TokenHolding>,
    pub nft_holdings: Vec<NftHolding>,
    pub is_complete: bool,
    pub last_sync: Option<i64>,
    pub status: SyncStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreasurySummary {
    pub total_native_balance: String,
    pub token_totals: Vec<TokenTotal>,
    pub contracts: Vec<ContractSummary>,
}

/// Cross-contract total for one token symbol. `total` is the exact sum
/// in smallest units; `total_formatted` is its human-scaled decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenTotal {
    pub symbol: String,
    pub decimals: u32,
    pub total: String,
    pub total_formatted: String,
}
