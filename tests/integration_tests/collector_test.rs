//! Pagination tests for the collector

use async_trait::async_trait;
use coinsync::client::CoinService;
use coinsync::error::Error;
use coinsync::models::Coin;
use coinsync::sync::PaginatedCollector;
use coinsync::utils::error::ServiceError;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::common::{fresh_coins, FakeCoinService};

/// Serves pages that repeat the previous page's last coin, tagging each coin
/// with the page it came from
struct OverlappingService {
    count: i64,
    calls: AtomicUsize,
}

#[async_trait]
impl CoinService for OverlappingService {
    async fn list_coins(
        &self,
        limit: usize,
        max_id: Option<i64>,
    ) -> Result<Vec<Coin>, ServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let top = max_id.map_or(self.count - 1, |m| m + 1).min(self.count - 1);
        Ok((0..=top)
            .rev()
            .take(limit)
            .map(|id| Coin {
                name: Some(format!("page{call}")),
                ..Coin::new(id, false, None)
            })
            .collect())
    }

    async fn get_coin(&self, id: i64) -> Result<Coin, ServiceError> {
        Ok(Coin::new(id, false, None))
    }

    async fn sync_coin(&self, _id: i64) -> Result<String, ServiceError> {
        Ok("OK".into())
    }

    async fn deploy_coin(&self, _id: i64) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Ignores the cursor and always answers the newest page
struct StuckService;

#[async_trait]
impl CoinService for StuckService {
    async fn list_coins(
        &self,
        limit: usize,
        _max_id: Option<i64>,
    ) -> Result<Vec<Coin>, ServiceError> {
        Ok((0..10)
            .rev()
            .take(limit)
            .map(|id| Coin::new(id, false, None))
            .collect())
    }

    async fn get_coin(&self, id: i64) -> Result<Coin, ServiceError> {
        Ok(Coin::new(id, false, None))
    }

    async fn sync_coin(&self, _id: i64) -> Result<String, ServiceError> {
        Ok("OK".into())
    }

    async fn deploy_coin(&self, _id: i64) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_collects_every_coin_across_pages() {
    let service = FakeCoinService::new(fresh_coins(25));
    let snapshot = PaginatedCollector::new(&service)
        .collect_all(10)
        .await
        .unwrap();

    assert_eq!(snapshot.len(), 25);
    assert_eq!(service.list_calls(), 3);
    assert!((0..25).all(|id| snapshot.get(id).is_some()));
}

#[tokio::test]
async fn test_empty_service() {
    let service = FakeCoinService::new(Vec::new());
    let snapshot = PaginatedCollector::new(&service)
        .collect_all(10)
        .await
        .unwrap();

    assert!(snapshot.is_empty());
    assert_eq!(service.list_calls(), 1);
}

#[tokio::test]
async fn test_overlapping_pages_keep_latest_attributes() {
    let service = OverlappingService {
        count: 10,
        calls: AtomicUsize::new(0),
    };
    let snapshot = PaginatedCollector::new(&service)
        .collect_all(4)
        .await
        .unwrap();

    // pages: 9..6, 6..3, 3..0
    assert_eq!(snapshot.len(), 10);
    assert_eq!(snapshot.get(9).unwrap().name.as_deref(), Some("page0"));
    assert_eq!(snapshot.get(6).unwrap().name.as_deref(), Some("page1"));
    assert_eq!(snapshot.get(3).unwrap().name.as_deref(), Some("page2"));
}

#[tokio::test]
async fn test_stalled_cursor_stops() {
    let snapshot = PaginatedCollector::new(&StuckService)
        .collect_all(4)
        .await
        .unwrap();

    assert_eq!(snapshot.len(), 4);
}

#[tokio::test]
async fn test_listing_error_propagates() {
    let service = FakeCoinService::new(fresh_coins(10));
    service.fail_listing_after(1);

    let result = PaginatedCollector::new(&service).collect_all(4).await;
    match result {
        Err(Error::Service(ServiceError::Status { status, .. })) => assert_eq!(status, 503),
        other => panic!("expected a 503 service error, got {other:?}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_collects_contiguous_ids(count in 0i64..200, page_size in 1usize..50) {
        let service = FakeCoinService::new(fresh_coins(count));
        let snapshot = tokio_test::block_on(
            PaginatedCollector::new(&service).collect_all(page_size),
        )
        .unwrap();

        prop_assert_eq!(snapshot.len() as i64, count);
        prop_assert!(service.list_calls() <= count as usize / page_size + 2);
    }

    #[test]
    fn prop_collects_sparse_ids(
        ids in prop::collection::btree_set(0i64..10_000, 0..300),
        page_size in 1usize..64,
    ) {
        let service = FakeCoinService::new(ids.iter().map(|&id| Coin::new(id, false, None)));
        let snapshot = tokio_test::block_on(
            PaginatedCollector::new(&service).collect_all(page_size),
        )
        .unwrap();

        let collected: BTreeSet<i64> = snapshot
            .into_sorted_desc()
            .into_iter()
            .map(|c| c.id)
            .collect();
        prop_assert_eq!(collected, ids);
    }
}
