use crate::models::{Contract, ContractCategory, ContractMetadata, NftHolding, TokenHolding};
use sqlx::{Pool, Row, Sqlite};
use tracing::warn;

/// First-touch registration: inserts a zeroed contract row if absent.
pub async fn ensure_contract(
    pool: &Pool<Sqlite>,
    address: &str,
    name: &str,
    category: ContractCategory,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO contracts (address, name, category, native_balance, token_holdings, nft_holdings, metadata)
         VALUES (?, ?, ?, '0', '[]', '[]', ?)
         ON CONFLICT(address) DO NOTHING",
    )
    .bind(address)
    .bind(name)
    .bind(category.as_str())
    .bind(serde_json::to_string(&ContractMetadata::default()).unwrap_or_else(|_| "{}".to_string()))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_contract(
    pool: &Pool<Sqlite>,
    address: &str,
) -> Result<Option<Contract>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT address, name, category, native_balance, token_holdings, nft_holdings, last_sync, metadata
         FROM contracts WHERE address = ?",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| row_to_contract(&row)))
}

pub async fn get_all_contracts(pool: &Pool<Sqlite>) -> Result<Vec<Contract>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT address, name, category, native_balance, token_holdings, nft_holdings, last_sync, metadata
         FROM contracts ORDER BY address",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_contract).collect())
}

/// Commits the derived balances and metadata computed at the end of a
/// successful sync.
pub async fn update_after_sync(
    pool: &Pool<Sqlite>,
    address: &str,
    native_balance: &str,
    token_holdings: &[TokenHolding],
    nft_holdings: &[NftHolding],
    metadata: &ContractMetadata,
    last_sync: i64,
) -> Result<(), sqlx::Error> {
    let token_json =
        serde_json::to_string(token_holdings).unwrap_or_else(|_| "[]".to_string());
    let nft_json = serde_json::to_string(nft_holdings).unwrap_or_else(|_| "[]".to_string());
    let metadata_json = serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string());

    sqlx::query(
        "UPDATE contracts
         SET native_balance = ?, token_holdings = ?, nft_holdings = ?, metadata = ?, last_sync = ?
         WHERE address = ?",
    )
    .bind(native_balance)
    .bind(token_json)
    .bind(nft_json)
    .bind(metadata_json)
    .bind(last_sync)
    .bind(address)
    .execute(pool)
    .await?;

    Ok(())
}

fn row_to_contract(row: &sqlx::sqlite::SqliteRow) -> Contract {
    let category_raw: String = row.get("category");
    let token_raw: String = row.get("token_holdings");
    let nft_raw: String = row.get("nft_holdings");
    let metadata_raw: String = row.get("metadata");

    let token_holdings = serde_json::from_str(&token_raw).unwrap_or_else(|e| {
        warn!("bad token_holdings json: {}", e);
        Vec::new()
    });
    let nft_holdings = serde_json::from_str(&nft_raw).unwrap_or_else(|e| {
        warn!("bad nft_holdings json: {}", e);
        Vec::new()
    });
    let metadata = serde_json::from_str(&metadata_raw).unwrap_or_else(|e| {
        warn!("bad metadata json: {}", e);
        ContractMetadata::default()
    });

    Contract {
        address: row.get("address"),
        name: row.get("name"),
        category: ContractCategory::parse(&category_raw).unwrap_or(ContractCategory::Treasury),
        native_balance: row.get("native_balance"),
        token_holdings,
        nft_holdings,
        last_sync: row.get("last_sync"),
        metadata,
    }
}
