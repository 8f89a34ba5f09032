use crate::models::{Transaction, TxKind};
use sqlx::{Pool, Row, Sqlite};

/// Batch insert inside one SQLite transaction. Duplicate hashes are
/// skipped via ON CONFLICT DO NOTHING, which makes re-running a sync
/// over an overlapping block window idempotent. Returns the number of
/// rows actually inserted.
pub async fn add_transactions(
    pool: &Pool<Sqlite>,
    transactions: &[Transaction],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for transaction in transactions {
        let (token_address, token_symbol, token_name, token_decimals, token_id, token_quantity) =
            kind_columns(&transaction.kind);

        let result = sqlx::query(
            r#"
            INSERT INTO transactions
            (hash, contract_address, block_number, timestamp, from_address, to_address, value,
             kind, gas_used, gas_price, method_id, function_name,
             token_address, token_symbol, token_name, token_decimals, token_id, token_quantity)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(hash) DO NOTHING
            "#,
        )
        .bind(&transaction.hash)
        .bind(&transaction.contract_address)
        .bind(transaction.block_number)
        .bind(transaction.timestamp)
        .bind(&transaction.from_address)
        .bind(&transaction.to_address)
        .bind(&transaction.value)
        .bind(transaction.kind.discriminant())
        .bind(transaction.gas_used)
        .bind(&transaction.gas_price)
        .bind(&transaction.method_id)
        .bind(&transaction.function_name)
        .bind(token_address)
        .bind(token_symbol)
        .bind(token_name)
        .bind(token_decimals)
        .bind(token_id)
        .bind(token_quantity)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;

    Ok(inserted)
}

/// Paginated, time-filtered read in canonical `(timestamp, block_number)`
/// order. Returns the page plus the total row count for the filter.
pub async fn get_transactions(
    pool: &Pool<Sqlite>,
    address: &str,
    start_time: i64,
    end_time: i64,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Transaction>, i64), sqlx::Error> {
    let total_count: i64 = sqlx::query(
        "SELECT COUNT(*) FROM transactions
         WHERE contract_address = ? AND timestamp >= ? AND timestamp < ?",
    )
    .bind(address)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(pool)
    .await?
    .get(0);

    let rows = sqlx::query(
        "SELECT * FROM transactions
         WHERE contract_address = ? AND timestamp >= ? AND timestamp < ?
         ORDER BY timestamp ASC, block_number ASC
         LIMIT ? OFFSET ?",
    )
    .bind(address)
    .bind(start_time)
    .bind(end_time)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows.iter().map(row_to_transaction).collect(), total_count))
}

/// Full unpaginated history for one contract in canonical order, used by
/// the aggregation engine.
pub async fn get_all_for_contract(
    pool: &Pool<Sqlite>,
    address: &str,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT * FROM transactions
         WHERE contract_address = ?
         ORDER BY timestamp ASC, block_number ASC",
    )
    .bind(address)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_transaction).collect())
}

/// Per-kind row counts for a contract's metadata.
pub async fn count_by_kind(
    pool: &Pool<Sqlite>,
    address: &str,
    kind: &str,
) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query(
        "SELECT COUNT(*) FROM transactions WHERE contract_address = ? AND kind = ?",
    )
    .bind(address)
    .bind(kind)
    .fetch_one(pool)
    .await?
    .get(0);

    Ok(count)
}

/// Newest and oldest synced block for a contract, as decimal strings.
pub async fn block_watermarks(
    pool: &Pool<Sqlite>,
    address: &str,
) -> Result<(Option<String>, Option<String>), sqlx::Error> {
    let row = sqlx::query(
        "SELECT MAX(block_number) AS newest, MIN(block_number) AS oldest
         FROM transactions WHERE contract_address = ?",
    )
    .bind(address)
    .fetch_one(pool)
    .await?;

    let newest: Option<i64> = row.get("newest");
    let oldest: Option<i64> = row.get("oldest");
    Ok((newest.map(|b| b.to_string()), oldest.map(|b| b.to_string())))
}

fn kind_columns(
    kind: &TxKind,
) -> (
    Option<&str>,
    Option<&str>,
    Option<&str>,
    Option<i64>,
    Option<&str>,
    Option<&str>,
) {
    match kind {
        TxKind::Native | TxKind::Internal => (None, None, None, None, None, None),
        TxKind::TokenTransfer { token_address, symbol, name, decimals } => (
            Some(token_address.as_str()),
            Some(symbol.as_str()),
            Some(name.as_str()),
            Some(*decimals as i64),
            None,
            None,
        ),
        TxKind::NftTransfer { token_address, symbol, name, token_id } => (
            Some(token_address.as_str()),
            Some(symbol.as_str()),
            Some(name.as_str()),
            None,
            Some(token_id.as_str()),
            None,
        ),
        TxKind::MultiTokenTransfer { token_address, token_id, quantity } => (
            Some(token_address.as_str()),
            None,
            None,
            None,
            Some(token_id.as_str()),
            Some(quantity.as_str()),
        ),
    }
}

fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Transaction {
    let kind_raw: String = row.get("kind");
    let token_address: Option<String> = row.get("token_address");
    let token_symbol: Option<String> = row.get("token_symbol");
    let token_name: Option<String> = row.get("token_name");
    let token_decimals: Option<i64> = row.get("token_decimals");
    let token_id: Option<String> = row.get("token_id");
    let token_quantity: Option<String> = row.get("token_quantity");

    let kind = match kind_raw.as_str() {
        "internal" => TxKind::Internal,
        "token_transfer" => TxKind::TokenTransfer {
            token_address: token_address.unwrap_or_default(),
            symbol: token_symbol.unwrap_or_default(),
            name: token_name.unwrap_or_default(),
            decimals: token_decimals.unwrap_or(18) as u32,
        },
        "nft_transfer" => TxKind::NftTransfer {
            token_address: token_address.unwrap_or_default(),
            symbol: token_symbol.unwrap_or_default(),
            name: token_name.unwrap_or_default(),
            token_id: token_id.unwrap_or_default(),
        },
        "multi_token_transfer" => TxKind::MultiTokenTransfer {
            token_address: token_address.unwrap_or_default(),
            token_id: token_id.unwrap_or_default(),
            quantity: token_quantity.unwrap_or_else(|| "1".to_string()),
        },
        _ => TxKind::Native,
    };

    Transaction {
        hash: row.get("hash"),
        contract_address: row.get("contract_address"),
        block_number: row.get("block_number"),
        timestamp: row.get("timestamp"),
        from_address: row.get("from_address"),
        to_address: row.get("to_address"),
        value: row.get("value"),
        kind,
        gas_used: row.get("gas_used"),
        gas_price: row.get("gas_price"),
        method_id: row.get("method_id"),
        function_name: row.get("function_name"),
    }
}
