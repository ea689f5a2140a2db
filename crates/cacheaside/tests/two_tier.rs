// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(all(feature = "test-util", feature = "distributed"))]

//! Integration tests for tier selection and the distributed tier behind the orchestrator.

use std::collections::HashMap;
use std::time::Duration;

use cacheaside::testing::MockSource;
use cacheaside::{CacheAside, Error, ErrorKind, LoadFlag, Settings, TierSelection};
use cacheaside_distributed::testing::MockStore;
use cacheaside_tier::testing::{MockTier, TierOp};
use serde::{Deserialize, Serialize};
use tick::{Clock, ClockControl};
use tokio_util::sync::CancellationToken;

type TestResult = Result<(), Error>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Order {
    id: u32,
    total_cents: u64,
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn source() -> MockSource<Order> {
    MockSource::new(|order: &Order| format!("order:{}", order.id))
}

fn probe(id: u32) -> Order {
    Order { id, total_cents: 0 }
}

#[test]
fn both_tiers_promote_distributed_hits() -> TestResult {
    block_on(async {
        let local = MockTier::new();
        let distributed = MockTier::with_data(HashMap::from([(
            "order:1".to_string(),
            Order { id: 1, total_cents: 999 },
        )]));
        let source = source();
        let settings = Settings::builder().tiers(TierSelection::Both).build();
        let cache = CacheAside::builder(settings, source.clone(), Clock::new_frozen())
            .local(local.clone())
            .distributed(distributed.clone())
            .build()?;

        let order = cache.get_or_load("order:1", &probe(1), LoadFlag::None).await?;

        assert_eq!(order, Some(Order { id: 1, total_cents: 999 }));
        assert_eq!(local.value("order:1"), Some(Order { id: 1, total_cents: 999 }));
        assert_eq!(source.call_count(), 0);
        Ok(())
    })
}

#[test]
fn both_tiers_receive_write_back_and_removes() -> TestResult {
    block_on(async {
        let local = MockTier::new();
        let distributed = MockTier::new();
        let source = source();
        source.insert("order:2", Order { id: 2, total_cents: 10 });
        let settings = Settings::builder().tiers(TierSelection::Both).build();
        let cache = CacheAside::builder(settings, source, Clock::new_frozen())
            .local(local.clone())
            .distributed(distributed.clone())
            .build()?;

        cache.get_or_load("order:2", &probe(2), LoadFlag::None).await?;
        assert!(local.contains_key("order:2"));
        assert!(distributed.contains_key("order:2"));

        assert!(cache.remove("order:2").await?);
        assert!(!local.contains_key("order:2"));
        assert!(!distributed.contains_key("order:2"));
        Ok(())
    })
}

#[test]
fn one_refusing_tier_fails_the_write() -> TestResult {
    block_on(async {
        let local = MockTier::new();
        let distributed = MockTier::new();
        distributed.refuse_when(TierOp::is_write);
        let settings = Settings::builder().tiers(TierSelection::Both).build();
        let cache = CacheAside::builder(settings, source(), Clock::new_frozen())
            .local(local)
            .distributed(distributed)
            .build()?;

        assert!(!cache.set("order:3", probe(3)).await?);
        Ok(())
    })
}

#[test]
fn distributed_selection_without_tier_fails_to_build() {
    let settings = Settings::builder().tiers(TierSelection::Distributed).build();
    let error = CacheAside::builder(settings, source(), Clock::new_frozen())
        .local(MockTier::<Order>::new())
        .build()
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[test]
fn distributed_store_retries_with_settings_policy() -> TestResult {
    block_on(async {
        let store = MockStore::new();
        let settings = Settings::builder()
            .tiers(TierSelection::Distributed)
            .retry_count(2)
            .retry_interval(Duration::from_millis(50))
            .absolute_expiration(Duration::from_secs(120))
            .build();
        let clock = ClockControl::new().auto_advance_timers(true).to_clock();
        let cache = CacheAside::builder(settings, source(), clock)
            .distributed_store(store.clone())
            .build()?;

        store.fail_next(2);
        assert!(cache.set("order:4", Order { id: 4, total_cents: 40 }).await?);

        assert_eq!(store.calls(), 3);
        assert_eq!(store.ttl("order:4"), Some(Duration::from_secs(120)));
        assert_eq!(store.raw("order:4"), Some(br#"{"id":4,"total_cents":40}"#.to_vec()));
        Ok(())
    })
}

#[test]
fn exhausted_retries_fall_back_to_source() -> TestResult {
    block_on(async {
        let store = MockStore::new();
        let source = source();
        source.insert("order:5", Order { id: 5, total_cents: 50 });
        let settings = Settings::builder()
            .tiers(TierSelection::Distributed)
            .retry_count(2)
            .retry_interval(Duration::from_millis(10))
            .build();
        let clock = ClockControl::new().auto_advance_timers(true).to_clock();
        let cache = CacheAside::builder(settings, source.clone(), clock)
            .distributed_store(store.clone())
            .build()?;

        store.fail_next(10);
        let order = cache.get_or_load("order:5", &probe(5), LoadFlag::None).await?;

        assert_eq!(order, Some(Order { id: 5, total_cents: 50 }));
        assert_eq!(source.call_count(), 1);
        // Three read attempts, then three write attempts.
        assert_eq!(store.calls(), 6);
        assert!(!store.contains_key("order:5"));
        Ok(())
    })
}

#[test]
fn distributed_batch_round_trip() -> TestResult {
    block_on(async {
        let store = MockStore::new();
        let settings = Settings::builder().tiers(TierSelection::Distributed).build();
        let cache = CacheAside::builder(settings, source(), Clock::new_frozen())
            .distributed_store(store.clone())
            .build()?;
        let cancel = CancellationToken::new();
        let entries = HashMap::from([
            ("order:6".to_string(), Order { id: 6, total_cents: 60 }),
            ("order:7".to_string(), Order { id: 7, total_cents: 70 }),
        ]);

        assert!(cache.set_batch(entries.clone(), &cancel).await?);
        let keys = vec!["order:6".to_string(), "order:7".to_string()];
        let found = cache
            .get_batch_or_load(&keys, &[probe(6), probe(7)], LoadFlag::ReturnNoneIfNotFoundInCache, &cancel)
            .await?;

        assert_eq!(found, entries);
        Ok(())
    })
}
