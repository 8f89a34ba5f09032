//! Query cache tests: key identity, TTL configuration, and in-flight
//! request coalescing.

#[cfg(test)]
mod tests {
    use crate::cache::{init_cache, QueryKey};
    use crate::config::Config;
    use crate::models::TransactionPage;
    use crate::tests::TREASURY_ADDRESS;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn empty_page() -> Arc<TransactionPage> {
        Arc::new(TransactionPage {
            transactions: vec![],
            total: 0,
            page: 1,
            page_size: 25,
            page_count: 0,
        })
    }

    #[test]
    fn identical_parameters_produce_identical_keys() {
        let a = QueryKey::new(TREASURY_ADDRESS, 1, 25, 0, 1000);
        let b = QueryKey::new(TREASURY_ADDRESS, 1, 25, 0, 1000);
        assert_eq!(a, b);

        let other_page = QueryKey::new(TREASURY_ADDRESS, 2, 25, 0, 1000);
        assert_ne!(a, other_page);

        assert_eq!(
            a.to_string(),
            format!("tx:{}:1:25:0:1000", TREASURY_ADDRESS)
        );
    }

    #[tokio::test]
    async fn concurrent_identical_reads_coalesce_to_one_load() {
        let config = Config::from_env();
        let cache = init_cache(&config);
        let key = QueryKey::new(TREASURY_ADDRESS, 1, 25, 0, 1000);
        let loads = Arc::new(AtomicUsize::new(0));

        let load = |loads: Arc<AtomicUsize>| async move {
            loads.fetch_add(1, Ordering::SeqCst);
            // Hold the in-flight slot long enough for the second caller
            // to land on it.
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, std::io::Error>(empty_page())
        };

        let (first, second) = tokio::join!(
            cache.try_get_with(key.clone(), load(loads.clone())),
            cache.try_get_with(key.clone(), load(loads.clone())),
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_load_independently() {
        let config = Config::from_env();
        let cache = init_cache(&config);
        let loads = Arc::new(AtomicUsize::new(0));

        for page in 1..=3 {
            let key = QueryKey::new(TREASURY_ADDRESS, page, 25, 0, 1000);
            let loads = loads.clone();
            let result = cache
                .try_get_with(key, async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>(empty_page())
                })
                .await;
            assert!(result.is_ok());
        }

        assert_eq!(loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cached_entry_is_served_without_a_second_load() {
        let config = Config::from_env();
        let cache = init_cache(&config);
        let key = QueryKey::new(TREASURY_ADDRESS, 1, 25, 0, 1000);
        let loads = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let loads = loads.clone();
            let result = cache
                .try_get_with(key.clone(), async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>(empty_page())
                })
                .await;
            assert!(result.is_ok());
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let config = Config::from_env();
        let cache = init_cache(&config);
        let key = QueryKey::new(TREASURY_ADDRESS, 1, 25, 0, 1000);

        let failed: Result<Arc<TransactionPage>, _> = cache
            .try_get_with(key.clone(), async {
                Err::<Arc<TransactionPage>, _>(std::io::Error::other("store unavailable"))
            })
            .await;
        assert!(failed.is_err());

        // The error was not stored; the next read loads fresh.
        let loads = Arc::new(AtomicUsize::new(0));
        let loads_clone = loads.clone();
        let result = cache
            .try_get_with(key, async move {
                loads_clone.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::io::Error>(empty_page())
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
