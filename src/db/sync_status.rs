use crate::models::{SyncStage, SyncStatus};
use sqlx::{Pool, Row, Sqlite};
use tracing::info;

/// First-touch initialization; no-op if a row already exists.
pub async fn ensure_status(pool: &Pool<Sqlite>, address: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sync_status (address, in_progress, stage, progress)
         VALUES (?, 0, 'initialized', 0)
         ON CONFLICT(address) DO NOTHING",
    )
    .bind(address)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_status(
    pool: &Pool<Sqlite>,
    address: &str,
) -> Result<Option<SyncStatus>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM sync_status WHERE address = ?")
        .bind(address)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row_to_status(&row)))
}

/// Atomic conditional acquire of the per-contract sync lock: the UPDATE
/// only matches when `in_progress` is still 0, so two racing callers
/// cannot both observe success. Returns true when the lock was taken.
pub async fn try_begin_sync(pool: &Pool<Sqlite>, address: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE sync_status
         SET in_progress = 1, stage = 'queued', progress = 0, error = NULL
         WHERE address = ? AND in_progress = 0",
    )
    .bind(address)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn set_stage(
    pool: &Pool<Sqlite>,
    address: &str,
    stage: SyncStage,
    progress: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sync_status SET stage = ?, progress = ? WHERE address = ?")
        .bind(stage.as_str())
        .bind(progress)
        .bind(address)
        .execute(pool)
        .await?;

    Ok(())
}

/// Terminal success transition; releases the lock and advances the
/// forward watermark.
pub async fn complete_sync(
    pool: &Pool<Sqlite>,
    address: &str,
    last_synced_block: &str,
    last_sync: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE sync_status
         SET in_progress = 0, stage = 'complete', progress = 100,
             last_sync = ?, error = NULL, last_synced_block = ?
         WHERE address = ?",
    )
    .bind(last_sync)
    .bind(last_synced_block)
    .bind(address)
    .execute(pool)
    .await?;

    Ok(())
}

/// Terminal success transition for a backfill pass: releases the lock
/// without touching the forward watermark (`last_synced_block`); the
/// backward watermark was already advanced window by window.
pub async fn complete_backfill(
    pool: &Pool<Sqlite>,
    address: &str,
    last_sync: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE sync_status
         SET in_progress = 0, stage = 'complete', progress = 100,
             last_sync = ?, error = NULL
         WHERE address = ?",
    )
    .bind(last_sync)
    .bind(address)
    .execute(pool)
    .await?;

    Ok(())
}

/// Backward watermark update, called after each backfill window.
pub async fn set_oldest_synced_block(
    pool: &Pool<Sqlite>,
    address: &str,
    oldest_block: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sync_status SET oldest_synced_block = ? WHERE address = ?")
        .bind(oldest_block)
        .bind(address)
        .execute(pool)
        .await?;

    Ok(())
}

/// Terminal failure transition: lock released, stage `error`, message
/// retained for observability. The next scheduled run retries.
pub async fn fail_sync(
    pool: &Pool<Sqlite>,
    address: &str,
    message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE sync_status
         SET in_progress = 0, stage = 'error', error = ?
         WHERE address = ?",
    )
    .bind(message)
    .bind(address)
    .execute(pool)
    .await?;

    Ok(())
}

/// Operational escape hatch for stuck locks: force-resets every
/// `in_progress` flag. Returns the number of locks cleared.
pub async fn clear_all_locks(pool: &Pool<Sqlite>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE sync_status SET in_progress = 0, stage = 'idle' WHERE in_progress = 1",
    )
    .execute(pool)
    .await?;

    let cleared = result.rows_affected();
    if cleared > 0 {
        info!("Cleared {} stuck sync locks", cleared);
    }
    Ok(cleared)
}

pub async fn get_all_statuses(pool: &Pool<Sqlite>) -> Result<Vec<SyncStatus>, sqlx::Error> {
    let rows = sqlx::query("SELECT * FROM sync_status ORDER BY address")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(row_to_status).collect())
}

fn row_to_status(row: &sqlx::sqlite::SqliteRow) -> SyncStatus {
    let stage_raw: String = row.get("stage");
    SyncStatus {
        address: row.get("address"),
        in_progress: row.get::<i64, _>("in_progress") != 0,
        stage: SyncStage::parse(&stage_raw).unwrap_or(SyncStage::Idle),
        progress: row.get("progress"),
        last_sync: row.get("last_sync"),
        error: row.get("error"),
        last_synced_block: row.get("last_synced_block"),
        oldest_synced_block: row.get("oldest_synced_block"),
    }
}
