use crate::aggregation;
use crate::db::{contract, sync_status, transaction};
use crate::explorer::{ClientError, ExplorerClient};
use crate::models::{ContractMetadata, SyncStage, SyncStatus, Transaction};
use crate::state::AppState;
use crate::validation::normalize_address;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Contract {0} is not monitored")]
    ContractNotMonitored(String),

    #[error("Explorer error: {0}")]
    Client(#[from] ClientError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy)]
enum SyncMode {
    Forward,
    Backfill,
}

/// Idempotent trigger used by the HTTP API: acquires the per-contract
/// lock, spawns the sync in the background, and returns the current
/// status immediately. If a sync is already running, returns its status
/// without starting a second fetch sequence.
pub async fn begin_sync(state: &Arc<AppState>, address: &str) -> Result<SyncStatus, SyncError> {
    begin(state, address, SyncMode::Forward).await
}

/// Background variant of [`begin_sync`] for the deep-history backfill.
pub async fn begin_backfill(state: &Arc<AppState>, address: &str) -> Result<SyncStatus, SyncError> {
    begin(state, address, SyncMode::Backfill).await
}

/// Run one contract's forward sync to completion. Used by the scheduler,
/// which awaits the whole pipeline.
pub async fn sync_contract(state: &Arc<AppState>, address: &str) -> Result<SyncStatus, SyncError> {
    run_to_completion(state, address, SyncMode::Forward).await
}

/// Run one backward deep-history pass to completion.
pub async fn backfill_contract(
    state: &Arc<AppState>,
    address: &str,
) -> Result<SyncStatus, SyncError> {
    run_to_completion(state, address, SyncMode::Backfill).await
}

async fn begin(
    state: &Arc<AppState>,
    address: &str,
    mode: SyncMode,
) -> Result<SyncStatus, SyncError> {
    let address = prepare(state, address).await?;

    if !sync_status::try_begin_sync(&state.db_pool, &address).await? {
        debug!("Sync already in progress for {}", address);
        return current_status(state, &address).await;
    }

    let task_state = state.clone();
    let task_address = address.clone();
    tokio::spawn(async move {
        run_sync_task(&task_state, &task_address, mode).await;
    });

    current_status(state, &address).await
}

async fn run_to_completion(
    state: &Arc<AppState>,
    address: &str,
    mode: SyncMode,
) -> Result<SyncStatus, SyncError> {
    let address = prepare(state, address).await?;

    if !sync_status::try_begin_sync(&state.db_pool, &address).await? {
        debug!("Sync already in progress for {}", address);
        return current_status(state, &address).await;
    }

    run_sync_task(state, &address, mode).await;
    current_status(state, &address).await
}

/// Registry check plus first-touch initialization of the contract and
/// sync-status rows. Returns the normalized address.
async fn prepare(state: &Arc<AppState>, address: &str) -> Result<String, SyncError> {
    let address = normalize_address(address);
    let entry = state
        .registry
        .get(&address)
        .ok_or_else(|| SyncError::ContractNotMonitored(address.clone()))?;

    contract::ensure_contract(&state.db_pool, &address, &entry.name, entry.category).await?;
    sync_status::ensure_status(&state.db_pool, &address).await?;

    Ok(address)
}

async fn current_status(state: &Arc<AppState>, address: &str) -> Result<SyncStatus, SyncError> {
    Ok(sync_status::get_status(&state.db_pool, address)
        .await?
        .unwrap_or_else(|| SyncStatus::idle(address)))
}

/// Runs the pipeline with the lock already held. Errors never escape:
/// they are recorded into the sync-status row for observability and the
/// next scheduled run retries.
async fn run_sync_task(state: &Arc<AppState>, address: &str, mode: SyncMode) {
    let result = match mode {
        SyncMode::Forward => run_forward(state, address).await,
        SyncMode::Backfill => run_backfill(state, address).await,
    };

    if let Err(e) = result {
        error!("Sync failed for {}: {}", address, e);
        if let Err(db_err) = sync_status::fail_sync(&state.db_pool, address, &e.to_string()).await
        {
            error!("Failed to record sync error for {}: {}", address, db_err);
        }
    }
}

/// Forward full-history sync: one window from the last synced block to
/// the latest chain block.
async fn run_forward(state: &Arc<AppState>, address: &str) -> Result<(), SyncError> {
    let pool = &state.db_pool;
    sync_status::set_stage(pool, address, SyncStage::Fetching, 0).await?;

    let latest = state.explorer.get_latest_block().await?;
    let status = current_status_unlocked(state, address).await?;
    let previous_watermark = status
        .last_synced_block
        .as_deref()
        .and_then(|b| b.parse::<u64>().ok());
    let start_block = previous_watermark.unwrap_or(0);

    info!(
        "Syncing {} over blocks [{}, {}]",
        address, start_block, latest
    );

    let transactions =
        fetch_window(&state.explorer, address, start_block, latest).await?;
    sync_status::set_stage(pool, address, SyncStage::Processing, 50).await?;

    persist_batches(state, address, &transactions).await;
    sync_status::set_stage(pool, address, SyncStage::Processing, 80).await?;

    finalize_contract(state, address, None).await?;

    // The forward watermark never moves backwards, even if the explorer
    // reports a lower head than a previous run.
    let watermark = previous_watermark.map_or(latest, |prev| latest.max(prev));
    sync_status::complete_sync(pool, address, &watermark.to_string(), now_ts()).await?;

    info!("Sync complete for {} at block {}", address, watermark);
    Ok(())
}

/// Backward deep-history sync: walks fixed-size block windows from the
/// oldest synced block toward genesis, bounded per invocation.
async fn run_backfill(state: &Arc<AppState>, address: &str) -> Result<(), SyncError> {
    let pool = &state.db_pool;
    sync_status::set_stage(pool, address, SyncStage::Fetching, 0).await?;

    let status = current_status_unlocked(state, address).await?;
    let mut cursor = match status
        .oldest_synced_block
        .as_deref()
        .and_then(|b| b.parse::<u64>().ok())
    {
        Some(block) => block,
        None => state.explorer.get_latest_block().await?,
    };

    let window = state.config.backfill_window_blocks.max(1);
    let max_windows = state.config.backfill_max_windows.max(1);
    let mut reached_genesis = cursor == 0;

    for i in 0..max_windows {
        if reached_genesis {
            break;
        }

        let start = cursor.saturating_sub(window);
        debug!(
            "Backfilling {} over blocks [{}, {}] ({}/{})",
            address,
            start,
            cursor,
            i + 1,
            max_windows
        );

        let transactions = fetch_window(&state.explorer, address, start, cursor).await?;
        persist_batches(state, address, &transactions).await;

        // The backward watermark only ever moves toward genesis.
        sync_status::set_oldest_synced_block(pool, address, &start.to_string()).await?;
        cursor = start;
        reached_genesis = start == 0;

        let progress = (i as i64 + 1) * 80 / max_windows as i64;
        sync_status::set_stage(pool, address, SyncStage::Fetching, progress).await?;
    }

    sync_status::set_stage(pool, address, SyncStage::Processing, 90).await?;
    finalize_contract(state, address, Some(reached_genesis)).await?;
    sync_status::complete_backfill(pool, address, now_ts()).await?;

    info!(
        "Backfill pass complete for {} (oldest block {}, genesis reached: {})",
        address, cursor, reached_genesis
    );
    Ok(())
}

/// Fetch all five transaction kinds for one block window, sequentially
/// against the shared rate budget; tag, filter, and sort into the
/// canonical `(timestamp, block_number)` order.
async fn fetch_window(
    explorer: &ExplorerClient,
    address: &str,
    start_block: u64,
    end_block: u64,
) -> Result<Vec<Transaction>, ClientError> {
    let mut merged: Vec<Transaction> = Vec::new();

    let native = explorer
        .get_native_transactions(address, start_block, end_block)
        .await?;
    merged.extend(native.into_iter().map(|r| r.into_transaction(address)));

    let internal = explorer
        .get_internal_transactions(address, start_block, end_block)
        .await?;
    merged.extend(internal.into_iter().map(|r| r.into_transaction(address)));

    let tokens = explorer
        .get_token_transfers(address, start_block, end_block)
        .await?;
    merged.extend(tokens.into_iter().map(|r| r.into_transaction(address)));

    let nfts = explorer
        .get_nft_transfers(address, start_block, end_block)
        .await?;
    merged.extend(nfts.into_iter().map(|r| r.into_transaction(address)));

    let multi = explorer
        .get_multi_token_transfers(address, start_block, end_block)
        .await?;
    merged.extend(multi.into_iter().map(|r| r.into_transaction(address)));

    // The explorer occasionally returns rows for internal/token queries
    // where the monitored address is neither party; drop them.
    merged.retain(|tx| {
        tx.from_address.eq_ignore_ascii_case(address) || tx.to_address.eq_ignore_ascii_case(address)
    });

    merged.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.block_number.cmp(&b.block_number))
    });

    Ok(merged)
}

/// Fixed-size batch writes. A failed batch is logged and skipped so one
/// bad row cannot abort the whole sync; duplicate hashes are silently
/// ignored by the insert itself.
async fn persist_batches(state: &Arc<AppState>, address: &str, transactions: &[Transaction]) {
    let batch_size = state.config.insert_batch_size.max(1);
    let mut inserted = 0u64;

    for batch in transactions.chunks(batch_size) {
        match transaction::add_transactions(&state.db_pool, batch).await {
            Ok(count) => inserted += count,
            Err(e) => {
                warn!(
                    "Failed to persist a batch of {} transactions for {}: {}",
                    batch.len(),
                    address,
                    e
                );
            }
        }
    }

    debug!(
        "Persisted {} new transactions for {} ({} fetched)",
        inserted,
        address,
        transactions.len()
    );
}

/// Recomputes the contract's derived balances and metadata from the
/// persisted ledger plus a fresh balance call, and commits them.
async fn finalize_contract(
    state: &Arc<AppState>,
    address: &str,
    is_complete: Option<bool>,
) -> Result<(), SyncError> {
    let pool = &state.db_pool;

    let native_balance = state.explorer.get_balance(address).await?;
    let history = transaction::get_all_for_contract(pool, address).await?;

    let token_holdings = aggregation::derive_token_holdings(&history, address, &state.registry);
    let nft_holdings = aggregation::derive_nft_holdings(&history, address);

    let (newest_block, oldest_block) = transaction::block_watermarks(pool, address).await?;
    let previous = contract::get_contract(pool, address).await?;
    let was_complete = previous.map(|c| c.metadata.is_complete).unwrap_or(false);

    let metadata = ContractMetadata {
        native_count: transaction::count_by_kind(pool, address, "native").await?,
        internal_count: transaction::count_by_kind(pool, address, "internal").await?,
        token_count: transaction::count_by_kind(pool, address, "token_transfer").await?,
        nft_count: transaction::count_by_kind(pool, address, "nft_transfer").await?,
        multi_token_count: transaction::count_by_kind(pool, address, "multi_token_transfer")
            .await?,
        is_complete: is_complete.unwrap_or(was_complete),
        newest_block,
        oldest_block,
    };

    contract::update_after_sync(
        pool,
        address,
        &native_balance,
        &token_holdings,
        &nft_holdings,
        &metadata,
        now_ts(),
    )
    .await?;

    Ok(())
}

async fn current_status_unlocked(
    state: &Arc<AppState>,
    address: &str,
) -> Result<SyncStatus, sqlx::Error> {
    Ok(sync_status::get_status(&state.db_pool, address)
        .await?
        .unwrap_or_else(|| SyncStatus::idle(address)))
}

fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
