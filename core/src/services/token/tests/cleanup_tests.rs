//! Tests for the token cleanup service

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;
use wl_shared::config::CleanupConfig;

use crate::errors::StoreError;
use crate::repositories::token::{InMemoryRefreshStore, MockRefreshStore, RefreshStore};
use crate::services::clock::{Clock, ManualClock};
use crate::services::token::{CleanupResult, TokenCleanupService};

fn clock() -> ManualClock {
    ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
}

#[tokio::test]
async fn test_run_cleanup_purges_expired_records() {
    let clock = clock();
    let store = Arc::new(InMemoryRefreshStore::new(Duration::seconds(60)));
    store.create_family(Uuid::new_v4(), clock.now()).await.unwrap();
    let service = TokenCleanupService::new(Arc::clone(&store), clock.clone(), CleanupConfig::default());

    let result = service.run_cleanup().await.unwrap();
    assert_eq!(result.total_cleaned(), 0);

    clock.advance(Duration::seconds(60));
    let result = service.run_cleanup().await.unwrap();
    assert_eq!(result.expired_records_deleted, 1);
    assert_eq!(store.family_count().await, 0);
}

#[tokio::test]
async fn test_disabled_cleanup_does_nothing() {
    let clock = clock();
    let store = Arc::new(InMemoryRefreshStore::new(Duration::seconds(60)));
    store.create_family(Uuid::new_v4(), clock.now()).await.unwrap();
    clock.advance(Duration::days(1));

    let config = CleanupConfig {
        enabled: false,
        ..CleanupConfig::default()
    };
    let service = Arc::new(TokenCleanupService::new(Arc::clone(&store), clock, config));

    assert_eq!(service.run_cleanup().await.unwrap(), CleanupResult::default());
    assert_eq!(store.family_count().await, 1);
    assert!(service.start_background_task().is_none());
}

#[tokio::test]
async fn test_store_failure_is_returned() {
    let store = Arc::new(MockRefreshStore::new(Duration::seconds(60)));
    store.set_unavailable(true);
    let service = TokenCleanupService::new(store, clock(), CleanupConfig::default());

    assert!(matches!(
        service.run_cleanup().await,
        Err(StoreError::Unavailable { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_background_task_runs_on_interval() {
    let clock = clock();
    let store = Arc::new(InMemoryRefreshStore::new(Duration::seconds(60)));
    store.create_family(Uuid::new_v4(), clock.now()).await.unwrap();
    clock.advance(Duration::seconds(120));

    let config = CleanupConfig {
        enabled: true,
        interval_seconds: 30,
    };
    let service = Arc::new(TokenCleanupService::new(Arc::clone(&store), clock, config));
    let handle = service.start_background_task().unwrap();

    // First tick fires immediately
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(store.family_count().await, 0);

    handle.abort();
}
