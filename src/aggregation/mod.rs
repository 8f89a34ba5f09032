// Ledger aggregation: categorization, exact balance arithmetic, and
// time-bucketed flow series. All sums run on big integers parsed from
// the stored decimal strings; conversion to a human-scaled decimal
// happens only in `format_units`, at the presentation boundary.

use crate::models::{
    Contract, ContractSummary, DailyFlow, NftHolding, SyncStatus, TokenHolding, TokenTotal,
    Transaction, TreasurySummary, TxKind,
};
use crate::registry::Registry;
use chrono::DateTime;
use num_bigint::{BigInt, BigUint, Sign};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Transaction set split into the three dashboard categories.
#[derive(Debug, Clone, Default)]
pub struct CategorizedTransactions {
    /// Native transfers and internal calls.
    pub chain: Vec<Transaction>,
    /// ERC-20 transfers.
    pub tokens: Vec<Transaction>,
    /// ERC-721 and ERC-1155 transfers.
    pub nfts: Vec<Transaction>,
}

pub fn categorize(transactions: Vec<Transaction>) -> CategorizedTransactions {
    let mut out = CategorizedTransactions::default();
    for tx in transactions {
        match tx.kind {
            TxKind::Native | TxKind::Internal => out.chain.push(tx),
            TxKind::TokenTransfer { .. } => out.tokens.push(tx),
            TxKind::NftTransfer { .. } | TxKind::MultiTokenTransfer { .. } => out.nfts.push(tx),
        }
    }
    out
}

/// Parse a raw unsigned decimal string; malformed values count as zero
/// rather than poisoning a whole aggregation.
pub fn parse_raw(value: &str) -> BigUint {
    value.parse().unwrap_or_else(|_| {
        warn!("unparseable raw value: {:?}", value);
        BigUint::ZERO
    })
}

/// Exact integer sum of raw values in smallest units.
pub fn sum_values<'a, I: IntoIterator<Item = &'a Transaction>>(transactions: I) -> BigUint {
    transactions
        .into_iter()
        .fold(BigUint::ZERO, |acc, tx| acc + parse_raw(&tx.value))
}

/// A transaction is inflow for the viewpoint contract iff it is the
/// recipient; the same row is outflow from the counterparty's viewpoint.
pub fn is_inflow(tx: &Transaction, viewpoint: &str) -> bool {
    tx.to_address.eq_ignore_ascii_case(viewpoint)
}

/// Group by UTC calendar day and produce per-day inflow/outflow sums
/// plus a running cumulative net, ordered by day. Days without
/// transactions are not synthesized; consumers backfill the axis.
pub fn daily_flows(transactions: &[Transaction], viewpoint: &str) -> Vec<DailyFlow> {
    let mut buckets: BTreeMap<String, (BigUint, BigUint)> = BTreeMap::new();

    for tx in transactions {
        let day = match DateTime::from_timestamp(tx.timestamp, 0) {
            Some(dt) => dt.date_naive().to_string(),
            None => {
                warn!("transaction {} has invalid timestamp {}", tx.hash, tx.timestamp);
                continue;
            }
        };
        let value = parse_raw(&tx.value);
        let entry = buckets.entry(day).or_default();
        if is_inflow(tx, viewpoint) {
            entry.0 += value;
        } else {
            entry.1 += value;
        }
    }

    let mut cumulative = BigInt::ZERO;
    buckets
        .into_iter()
        .map(|(day, (inflow, outflow))| {
            cumulative += BigInt::from_biguint(Sign::Plus, inflow.clone());
            cumulative -= BigInt::from_biguint(Sign::Plus, outflow.clone());
            DailyFlow {
                day,
                inflow: inflow.to_string(),
                outflow: outflow.to_string(),
                cumulative: cumulative.to_string(),
            }
        })
        .collect()
}

/// Derive fungible-token balances by netting transfer history per token.
/// A net that would go negative (dropped transfer somewhere upstream) is
/// clamped to zero; a full resync is the correction mechanism. For
/// tracked tokens, symbol and decimals come from the registry rather
/// than whatever the explorer put on each transfer record.
pub fn derive_token_holdings(
    transactions: &[Transaction],
    viewpoint: &str,
    registry: &Registry,
) -> Vec<TokenHolding> {
    struct Position {
        symbol: String,
        decimals: u32,
        net: BigInt,
    }

    let mut positions: BTreeMap<String, Position> = BTreeMap::new();

    for tx in transactions {
        let (token_address, symbol, decimals) = match &tx.kind {
            TxKind::TokenTransfer { token_address, symbol, decimals, .. } => {
                match registry.token_by_address(token_address) {
                    Some(tracked) => {
                        (token_address.clone(), tracked.symbol.clone(), tracked.decimals)
                    }
                    None => (token_address.clone(), symbol.clone(), *decimals),
                }
            }
            _ => continue,
        };

        let value = BigInt::from_biguint(Sign::Plus, parse_raw(&tx.value));
        let position = positions.entry(token_address).or_insert_with(|| Position {
            symbol,
            decimals,
            net: BigInt::ZERO,
        });
        if is_inflow(tx, viewpoint) {
            position.net += value;
        } else {
            position.net -= value;
        }
    }

    positions
        .into_iter()
        .map(|(token_address, position)| {
            let balance = match position.net.sign() {
                Sign::Minus => {
                    warn!(
                        "derived balance for {} at {} went negative, clamping to 0",
                        position.symbol, viewpoint
                    );
                    "0".to_string()
                }
                _ => position.net.to_string(),
            };
            TokenHolding {
                token_address,
                symbol: position.symbol,
                decimals: position.decimals,
                balance,
            }
        })
        .collect()
}

/// Derive NFT holdings by replaying transfer history: +1 per inbound,
/// -1 per outbound (ERC-1155 uses the transferred quantity). This is a
/// cache of the chain state, not ground truth; it drifts if a transfer
/// was missed and is corrected by periodic full resync.
pub fn derive_nft_holdings(transactions: &[Transaction], viewpoint: &str) -> Vec<NftHolding> {
    let mut positions: BTreeMap<(String, String), BigInt> = BTreeMap::new();

    for tx in transactions {
        let (collection, token_id, quantity) = match &tx.kind {
            TxKind::NftTransfer { token_address, token_id, .. } => {
                (token_address.clone(), token_id.clone(), BigInt::from(1))
            }
            TxKind::MultiTokenTransfer { token_address, token_id, quantity } => (
                token_address.clone(),
                token_id.clone(),
                BigInt::from_biguint(Sign::Plus, parse_raw(quantity)),
            ),
            _ => continue,
        };

        let entry = positions.entry((collection, token_id)).or_default();
        if is_inflow(tx, viewpoint) {
            *entry += quantity;
        } else {
            *entry -= quantity;
        }
    }

    positions
        .into_iter()
        .filter(|(_, net)| net.sign() == Sign::Plus)
        .map(|((collection_address, token_id), net)| NftHolding {
            collection_address,
            token_id,
            quantity: net.to_string(),
        })
        .collect()
}

/// Aggregated balances and per-contract status across the whole set of
/// monitored contracts.
pub fn treasury_summary(
    contracts: Vec<Contract>,
    statuses: Vec<SyncStatus>,
) -> TreasurySummary {
    let mut status_by_address: HashMap<String, SyncStatus> = statuses
        .into_iter()
        .map(|s| (s.address.clone(), s))
        .collect();

    let mut total_native = BigUint::ZERO;
    let mut token_totals: BTreeMap<String, (u32, BigUint)> = BTreeMap::new();
    let mut summaries = Vec::with_capacity(contracts.len());

    for contract in contracts {
        total_native += parse_raw(&contract.native_balance);
        for holding in &contract.token_holdings {
            let entry = token_totals
                .entry(holding.symbol.clone())
                .or_insert_with(|| (holding.decimals, BigUint::ZERO));
            entry.1 += parse_raw(&holding.balance);
        }

        let status = status_by_address
            .remove(&contract.address)
            .unwrap_or_else(|| SyncStatus::idle(&contract.address));

        summaries.push(ContractSummary {
            address: contract.address,
            name: contract.name,
            category: contract.category,
            native_balance: contract.native_balance,
            token_holdings: contract.token_holdings,
            nft_holdings: contract.nft_holdings,
            is_complete: contract.metadata.is_complete,
            last_sync: contract.last_sync,
            status,
        });
    }

    TreasurySummary {
        total_native_balance: total_native.to_string(),
        token_totals: token_totals
            .into_iter()
            .map(|(symbol, (decimals, total))| {
                let total = total.to_string();
                TokenTotal {
                    total_formatted: format_units(&total, decimals),
                    symbol,
                    decimals,
                    total,
                }
            })
            .collect(),
        contracts: summaries,
    }
}

/// Scale a raw smallest-unit value to a human decimal string by exact
/// integer division (`10^decimals`). Presentation-boundary only; the
/// result never feeds back into arithmetic.
pub fn format_units(raw: &str, decimals: u32) -> String {
    let value = parse_raw(raw);
    if decimals == 0 {
        return value.to_string();
    }

    let divisor = BigUint::from(10u32).pow(decimals);
    let whole = &value / &divisor;
    let fraction = &value % &divisor;

    if fraction == BigUint::ZERO {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    let fraction = fraction.trim_end_matches('0');
    format!("{}.{}", whole, fraction)
}
