pub mod connection;
pub mod contract;
pub mod sync_status;
pub mod transaction;

pub const INIT_SCHEMA: &str = r#"
-- Monitored contracts and their derived balances
CREATE TABLE IF NOT EXISTS contracts (
    address TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    native_balance TEXT NOT NULL DEFAULT '0',
    token_holdings TEXT NOT NULL DEFAULT '[]',
    nft_holdings TEXT NOT NULL DEFAULT '[]',
    last_sync INTEGER,
    metadata TEXT NOT NULL DEFAULT '{}'
);

-- Deduplicated transaction ledger, hash is globally unique
CREATE TABLE IF NOT EXISTS transactions (
    hash TEXT PRIMARY KEY,
    contract_address TEXT NOT NULL,
    block_number INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    from_address TEXT NOT NULL,
    to_address TEXT NOT NULL,
    value TEXT NOT NULL,
    kind TEXT NOT NULL,
    gas_used INTEGER,
    gas_price TEXT,
    method_id TEXT,
    function_name TEXT,
    token_address TEXT,
    token_symbol TEXT,
    token_name TEXT,
    token_decimals INTEGER,
    token_id TEXT,
    token_quantity TEXT,
    FOREIGN KEY (contract_address) REFERENCES contracts(address)
);

-- Per-contract sync progress
CREATE TABLE IF NOT EXISTS sync_status (
    address TEXT PRIMARY KEY,
    in_progress INTEGER NOT NULL DEFAULT 0,
    stage TEXT NOT NULL DEFAULT 'idle',
    progress INTEGER NOT NULL DEFAULT 0,
    last_sync INTEGER,
    error TEXT,
    last_synced_block TEXT,
    oldest_synced_block TEXT,
    FOREIGN KEY (address) REFERENCES contracts(address)
);

-- Indexes so sync and query paths never table-scan one contract's rows
CREATE INDEX IF NOT EXISTS idx_transactions_contract_time
    ON transactions(contract_address, timestamp, block_number);
CREATE INDEX IF NOT EXISTS idx_transactions_contract_kind
    ON transactions(contract_address, kind);
"#;
