use crate::{
    aggregation,
    api::{
        error::ApiError,
        response::{with_total_count, ApiResponse},
    },
    cache::QueryKey,
    db::{sync_status, transaction},
    models::{SyncStatus, TransactionPage},
    state::AppState,
    sync,
    validation::{
        normalize_address, validate_address, validate_page, validate_page_size,
        validate_time_range,
    },
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

// GET /transactions endpoint query parameters
#[derive(Deserialize)]
pub struct TransactionsQuery {
    address: String,
    page: Option<i64>,
    page_size: Option<i64>,
    start_time: Option<i64>,
    end_time: Option<i64>,
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sync/{address}", post(start_sync))
        .route("/sync/{address}/backfill", post(start_backfill))
        .route("/sync/{address}/status", get(get_sync_status))
        .route("/transactions", get(get_transactions))
        .route("/treasury/summary", get(get_treasury_summary))
        .route("/contracts/{address}/flows", get(get_contract_flows))
        .route("/admin/clear-sync-locks", post(clear_sync_locks))
        .with_state(app_state)
}

async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

// POST /sync/{address} — idempotent trigger; work continues in the
// background, the current status is returned immediately.
async fn start_sync(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    validate_address(&address)?;
    info!("Sync trigger for {}", address);

    let status = sync::begin_sync(&state, &address).await?;
    Ok(ApiResponse { data: status }.into_response())
}

// POST /sync/{address}/backfill — deep-history variant.
async fn start_backfill(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    validate_address(&address)?;
    info!("Backfill trigger for {}", address);

    let status = sync::begin_backfill(&state, &address).await?;
    Ok(ApiResponse { data: status }.into_response())
}

// GET /sync/{address}/status — synthesizes an idle default for contracts
// that were never synced.
async fn get_sync_status(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    validate_address(&address)?;
    let address = normalize_address(&address);

    let status = sync_status::get_status(&state.db_pool, &address)
        .await?
        .unwrap_or_else(|| SyncStatus::idle(&address));

    Ok(ApiResponse { data: status }.into_response())
}

// GET /transactions — paginated, time-filtered, cache-backed read.
// Concurrent identical requests coalesce onto one store query.
async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionsQuery>,
) -> Result<Response, ApiError> {
    validate_address(&params.address)?;
    let address = normalize_address(&params.address);
    let page = validate_page(params.page)?;
    let page_size = validate_page_size(params.page_size)?;
    let (start_time, end_time) = validate_time_range(params.start_time, params.end_time)?;

    if !state.registry.is_monitored(&address) {
        return Err(ApiError::NotFound(format!(
            "Contract {} is not monitored",
            address
        )));
    }

    let key = QueryKey::new(&address, page, page_size, start_time, end_time);
    let pool = state.db_pool.clone();
    let load_address = address.clone();

    let result = state
        .cache
        .try_get_with(key, async move {
            let offset = (page - 1) * page_size;
            let (transactions, total) = transaction::get_transactions(
                &pool,
                &load_address,
                start_time,
                end_time,
                offset,
                page_size,
            )
            .await?;

            let page_count = if total == 0 {
                0
            } else {
                (total + page_size - 1) / page_size
            };

            Ok::<_, ApiError>(Arc::new(TransactionPage {
                transactions,
                total,
                page,
                page_size,
                page_count,
            }))
        })
        .await
        .map_err(|e: Arc<ApiError>| ApiError::Internal(e.to_string()))?;

    let total = result.total;
    Ok(with_total_count(result.as_ref(), total))
}

// GET /treasury/summary — aggregated balances and per-contract status
// across all monitored contracts.
async fn get_treasury_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let contracts = crate::db::contract::get_all_contracts(&state.db_pool).await?;
    let statuses = sync_status::get_all_statuses(&state.db_pool).await?;

    let summary = aggregation::treasury_summary(contracts, statuses);
    Ok(ApiResponse { data: summary }.into_response())
}

// GET /contracts/{address}/flows — daily inflow/outflow series with a
// running cumulative net, for flow charts.
async fn get_contract_flows(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    validate_address(&address)?;
    let address = normalize_address(&address);

    if !state.registry.is_monitored(&address) {
        return Err(ApiError::NotFound(format!(
            "Contract {} is not monitored",
            address
        )));
    }

    let history = transaction::get_all_for_contract(&state.db_pool, &address).await?;
    // Token and NFT transfers are valued in their own units; the value
    // flow series covers native and internal transfers only.
    let chain = aggregation::categorize(history).chain;
    let flows = aggregation::daily_flows(&chain, &address);

    Ok(ApiResponse { data: flows }.into_response())
}

// POST /admin/clear-sync-locks — operational escape hatch for stuck
// in_progress flags.
async fn clear_sync_locks(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let cleared = sync_status::clear_all_locks(&state.db_pool).await?;
    info!("Sync locks cleared: {}", cleared);
    Ok(Json(json!({ "cleared": cleared })).into_response())
}
