//! Ledger store and sync state-machine tests against an in-memory
//! SQLite database.

#[cfg(test)]
mod tests {
    use crate::cache::init_cache;
    use crate::db::{contract, sync_status, transaction};
    use crate::explorer::ExplorerClient;
    use crate::models::{ContractMetadata, NftHolding, SyncStage, TokenHolding, TxKind};
    use crate::state::AppState;
    use crate::sync;
    use crate::tests::{
        native_tx, nft_tx, register_contract, serve_stub, test_config, test_pool, test_registry,
        token_tx, OUTSIDE_ADDRESS, TREASURY_ADDRESS, USDC_ADDRESS,
    };
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn resync_over_overlapping_window_is_idempotent() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        let first = vec![
            native_tx("0x1", TREASURY_ADDRESS, 100, 1, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "10"),
            native_tx("0x2", TREASURY_ADDRESS, 200, 2, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "20"),
        ];
        let inserted = transaction::add_transactions(&pool, &first).await.unwrap();
        assert_eq!(inserted, 2);

        // Overlap: one duplicate hash, one new row.
        let second = vec![
            native_tx("0x2", TREASURY_ADDRESS, 200, 2, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "20"),
            native_tx("0x3", TREASURY_ADDRESS, 300, 3, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "30"),
        ];
        let inserted = transaction::add_transactions(&pool, &second).await.unwrap();
        assert_eq!(inserted, 1);

        let (all, total) =
            transaction::get_transactions(&pool, TREASURY_ADDRESS, 0, i64::MAX, 0, 100)
                .await
                .unwrap();
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn full_read_follows_canonical_order() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        // Inserted out of order on purpose.
        let txs = vec![
            native_tx("0xc", TREASURY_ADDRESS, 300, 30, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "3"),
            native_tx("0xa", TREASURY_ADDRESS, 100, 10, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "1"),
            // Same timestamp as 0xa, later block: block number breaks the tie.
            native_tx("0xb", TREASURY_ADDRESS, 100, 11, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "2"),
        ];
        transaction::add_transactions(&pool, &txs).await.unwrap();

        let all = transaction::get_all_for_contract(&pool, TREASURY_ADDRESS)
            .await
            .unwrap();
        let hashes: Vec<_> = all.iter().map(|tx| tx.hash.as_str()).collect();
        assert_eq!(hashes, vec!["0xa", "0xb", "0xc"]);
    }

    #[tokio::test]
    async fn kind_specific_fields_survive_a_round_trip() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        let txs = vec![
            token_tx(
                "0x1", TREASURY_ADDRESS, 100, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "1000000",
                USDC_ADDRESS, "USDC", 6,
            ),
            nft_tx("0x2", TREASURY_ADDRESS, 200, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "0xc0", "42"),
        ];
        transaction::add_transactions(&pool, &txs).await.unwrap();

        let all = transaction::get_all_for_contract(&pool, TREASURY_ADDRESS)
            .await
            .unwrap();

        match &all[0].kind {
            TxKind::TokenTransfer { symbol, decimals, token_address, .. } => {
                assert_eq!(symbol, "USDC");
                assert_eq!(*decimals, 6);
                assert_eq!(token_address, USDC_ADDRESS);
            }
            other => panic!("expected token transfer, got {:?}", other),
        }
        match &all[1].kind {
            TxKind::NftTransfer { token_id, .. } => assert_eq!(token_id, "42"),
            other => panic!("expected nft transfer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn pagination_and_time_filter() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        let txs: Vec<_> = (0..10)
            .map(|i| {
                native_tx(
                    &format!("0x{:02}", i),
                    TREASURY_ADDRESS,
                    100 + i,
                    i,
                    OUTSIDE_ADDRESS,
                    TREASURY_ADDRESS,
                    "1",
                )
            })
            .collect();
        transaction::add_transactions(&pool, &txs).await.unwrap();

        // Second page of three.
        let (page, total) =
            transaction::get_transactions(&pool, TREASURY_ADDRESS, 0, i64::MAX, 3, 3)
                .await
                .unwrap();
        assert_eq!(total, 10);
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].timestamp, 103);

        // Half-open [104, 107) time filter.
        let (filtered, total) =
            transaction::get_transactions(&pool, TREASURY_ADDRESS, 104, 107, 0, 100)
                .await
                .unwrap();
        assert_eq!(total, 3);
        assert!(filtered.iter().all(|tx| (104..107).contains(&tx.timestamp)));
    }

    #[tokio::test]
    async fn sync_lock_is_mutually_exclusive() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        assert!(sync_status::try_begin_sync(&pool, TREASURY_ADDRESS).await.unwrap());
        // Second acquire must lose while the first holds the lock.
        assert!(!sync_status::try_begin_sync(&pool, TREASURY_ADDRESS).await.unwrap());

        let status = sync_status::get_status(&pool, TREASURY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert!(status.in_progress);
        assert_eq!(status.stage, SyncStage::Queued);

        sync_status::complete_sync(&pool, TREASURY_ADDRESS, "100", 1_700_000_000)
            .await
            .unwrap();
        assert!(sync_status::try_begin_sync(&pool, TREASURY_ADDRESS).await.unwrap());
    }

    #[tokio::test]
    async fn rapid_double_trigger_runs_one_fetch_sequence() {
        let head_hits = Arc::new(AtomicUsize::new(0));
        let handler_hits = head_hits.clone();
        let router = Router::new().route(
            "/",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let head_hits = handler_hits.clone();
                async move {
                    match params.get("action").map(String::as_str) {
                        Some("eth_blockNumber") => {
                            head_hits.fetch_add(1, Ordering::SeqCst);
                            // Hold the pipeline in flight across the
                            // second trigger.
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Json(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x64" }))
                        }
                        Some("balance") => {
                            Json(json!({ "status": "1", "message": "OK", "result": "1000" }))
                        }
                        _ => Json(json!({
                            "status": "0",
                            "message": "No transactions found",
                            "result": []
                        })),
                    }
                }
            }),
        );
        let url = serve_stub(router).await;

        let pool = test_pool().await;
        let config = test_config(&url);
        let state = Arc::new(AppState {
            explorer: Arc::new(ExplorerClient::new(&config)),
            cache: init_cache(&config),
            config,
            registry: test_registry(),
            db_pool: pool.clone(),
            sweep_active: AtomicBool::new(false),
        });

        let first = sync::begin_sync(&state, TREASURY_ADDRESS).await.unwrap();
        assert!(first.in_progress);

        // Second trigger while the first is mid-fetch: reports the
        // running sync and starts nothing.
        let second = sync::begin_sync(&state, TREASURY_ADDRESS).await.unwrap();
        assert!(second.in_progress);

        let mut finished = None;
        for _ in 0..300 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let status = sync_status::get_status(&pool, TREASURY_ADDRESS)
                .await
                .unwrap()
                .unwrap();
            if !status.in_progress {
                finished = Some(status);
                break;
            }
        }

        let status = finished.expect("sync did not finish in time");
        assert_eq!(status.stage, SyncStage::Complete);
        assert_eq!(status.last_synced_block.as_deref(), Some("100"));
        // Exactly one fetch sequence reached the explorer.
        assert_eq!(head_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn forward_watermark_is_monotonic_across_syncs() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        for block in ["100", "250", "900"] {
            assert!(sync_status::try_begin_sync(&pool, TREASURY_ADDRESS).await.unwrap());
            sync_status::complete_sync(&pool, TREASURY_ADDRESS, block, 1_700_000_000)
                .await
                .unwrap();

            let status = sync_status::get_status(&pool, TREASURY_ADDRESS)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(status.last_synced_block.as_deref(), Some(block));
            assert_eq!(status.stage, SyncStage::Complete);
            assert_eq!(status.progress, 100);
            assert!(status.error.is_none());
        }
    }

    #[tokio::test]
    async fn failed_sync_records_error_and_releases_lock() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        assert!(sync_status::try_begin_sync(&pool, TREASURY_ADDRESS).await.unwrap());
        sync_status::fail_sync(&pool, TREASURY_ADDRESS, "explorer unreachable")
            .await
            .unwrap();

        let status = sync_status::get_status(&pool, TREASURY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert!(!status.in_progress);
        assert_eq!(status.stage, SyncStage::Error);
        assert_eq!(status.error.as_deref(), Some("explorer unreachable"));

        // Error state is recoverable: the next run can acquire again.
        assert!(sync_status::try_begin_sync(&pool, TREASURY_ADDRESS).await.unwrap());
    }

    #[tokio::test]
    async fn clear_all_locks_resets_every_in_progress_flag() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;
        register_contract(&pool, OUTSIDE_ADDRESS).await;

        assert!(sync_status::try_begin_sync(&pool, TREASURY_ADDRESS).await.unwrap());
        assert!(sync_status::try_begin_sync(&pool, OUTSIDE_ADDRESS).await.unwrap());

        let cleared = sync_status::clear_all_locks(&pool).await.unwrap();
        assert_eq!(cleared, 2);

        for address in [TREASURY_ADDRESS, OUTSIDE_ADDRESS] {
            let status = sync_status::get_status(&pool, address).await.unwrap().unwrap();
            assert!(!status.in_progress);
            assert_eq!(status.stage, SyncStage::Idle);
        }
    }

    #[tokio::test]
    async fn backfill_watermark_updates_independently() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        assert!(sync_status::try_begin_sync(&pool, TREASURY_ADDRESS).await.unwrap());
        sync_status::set_oldest_synced_block(&pool, TREASURY_ADDRESS, "500000")
            .await
            .unwrap();
        sync_status::set_oldest_synced_block(&pool, TREASURY_ADDRESS, "400000")
            .await
            .unwrap();
        sync_status::complete_backfill(&pool, TREASURY_ADDRESS, 1_700_000_000)
            .await
            .unwrap();

        let status = sync_status::get_status(&pool, TREASURY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.oldest_synced_block.as_deref(), Some("400000"));
        // The forward watermark is untouched by a backfill pass.
        assert!(status.last_synced_block.is_none());
        assert_eq!(status.stage, SyncStage::Complete);
    }

    #[tokio::test]
    async fn contract_metadata_counts_and_watermarks() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        let txs = vec![
            native_tx("0x1", TREASURY_ADDRESS, 100, 10, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "1"),
            native_tx("0x2", TREASURY_ADDRESS, 200, 20, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "1"),
            token_tx(
                "0x3", TREASURY_ADDRESS, 300, OUTSIDE_ADDRESS, TREASURY_ADDRESS, "1",
                USDC_ADDRESS, "USDC", 6,
            ),
        ];
        transaction::add_transactions(&pool, &txs).await.unwrap();

        assert_eq!(
            transaction::count_by_kind(&pool, TREASURY_ADDRESS, "native").await.unwrap(),
            2
        );
        assert_eq!(
            transaction::count_by_kind(&pool, TREASURY_ADDRESS, "token_transfer")
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            transaction::count_by_kind(&pool, TREASURY_ADDRESS, "nft_transfer")
                .await
                .unwrap(),
            0
        );

        let (newest, oldest) = transaction::block_watermarks(&pool, TREASURY_ADDRESS)
            .await
            .unwrap();
        assert_eq!(oldest.as_deref(), Some("10"));
        assert_eq!(newest.as_deref(), Some("25"));
    }

    #[tokio::test]
    async fn contract_holdings_round_trip_through_json_columns() {
        let pool = test_pool().await;
        register_contract(&pool, TREASURY_ADDRESS).await;

        let holdings = vec![TokenHolding {
            token_address: USDC_ADDRESS.to_string(),
            symbol: "USDC".to_string(),
            decimals: 6,
            balance: "123456789".to_string(),
        }];
        let nfts = vec![NftHolding {
            collection_address: "0xc0".to_string(),
            token_id: "42".to_string(),
            quantity: "1".to_string(),
        }];
        let metadata = ContractMetadata {
            native_count: 5,
            is_complete: true,
            newest_block: Some("900".to_string()),
            ..Default::default()
        };

        contract::update_after_sync(
            &pool,
            TREASURY_ADDRESS,
            "777",
            &holdings,
            &nfts,
            &metadata,
            1_700_000_000,
        )
        .await
        .unwrap();

        let loaded = contract::get_contract(&pool, TREASURY_ADDRESS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.native_balance, "777");
        assert_eq!(loaded.token_holdings, holdings);
        assert_eq!(loaded.nft_holdings, nfts);
        assert_eq!(loaded.metadata, metadata);
        assert_eq!(loaded.last_sync, Some(1_700_000_000));
    }
}
