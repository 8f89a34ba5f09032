use crate::state::AppState;
use crate::sync::orchestrator;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::{interval, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Background scheduling loop: one sweep over all monitored contracts
/// per interval, each contract synced sequentially against the shared
/// rate-limited client. The first tick fires immediately on startup.
pub async fn start_scheduler(state: Arc<AppState>, shutdown: CancellationToken) {
    info!(
        "Starting treasury sync scheduler ({} contracts, every {:?})",
        state.registry.contracts().len(),
        state.config.sweep_interval
    );

    let mut ticker = interval(state.config.sweep_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_sweep(&state).await;
            }
            _ = shutdown.cancelled() => {
                info!("Shutting down treasury sync scheduler");
                break;
            }
        }
    }
}

/// Runs one full sweep unless one is already in flight, in which case
/// this is a no-op returning false. Contracts are processed one after
/// another with an inter-contract delay; a failure in one contract's
/// sync is recorded and never blocks the rest of the sweep.
pub async fn run_sweep(state: &Arc<AppState>) -> bool {
    if state
        .sweep_active
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        info!("A sweep is already running, skipping this trigger");
        return false;
    }

    let contracts: Vec<_> = state
        .registry
        .contracts()
        .iter()
        .map(|c| c.address.clone())
        .collect();

    for (i, address) in contracts.iter().enumerate() {
        if i > 0 {
            sleep(state.config.contract_delay).await;
        }

        match orchestrator::sync_contract(state, address).await {
            Ok(status) => {
                info!(
                    "Swept {}: stage {}, progress {}",
                    address,
                    status.stage.as_str(),
                    status.progress
                );
            }
            Err(e) => {
                // Recorded in sync_status by the orchestrator; the sweep
                // moves on to the next contract regardless.
                error!("Sweep error for {}: {}", address, e);
            }
        }
    }

    state.sweep_active.store(false, Ordering::SeqCst);
    true
}
