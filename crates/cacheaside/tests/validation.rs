// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(feature = "test-util")]

//! Keys that are empty or whitespace are rejected before any collaborator is called.

use std::collections::HashMap;

use cacheaside::testing::MockSource;
use cacheaside::{CacheAside, Error, ErrorKind, LoadFlag, Settings};
use cacheaside_tier::testing::MockTier;
use tick::Clock;
use tokio_util::sync::CancellationToken;

const INVALID_KEYS: [&str; 4] = ["", " ", "\t", " \n "];

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

struct Fixture {
    cache: CacheAside<u32, MockSource<u32>>,
    tier: MockTier<u32>,
    source: MockSource<u32>,
}

impl Fixture {
    fn new() -> Self {
        let tier = MockTier::new();
        let source = MockSource::new(|id: &u32| id.to_string());
        source.insert("1", 1);
        let cache = CacheAside::builder(Settings::default(), source.clone(), Clock::new_frozen())
            .local(tier.clone())
            .build()
            .expect("local tier is provided");
        Self { cache, tier, source }
    }

    fn assert_untouched(&self) {
        assert!(self.tier.operations().is_empty(), "tier was called: {:?}", self.tier.operations());
        assert_eq!(self.source.call_count(), 0);
    }
}

fn assert_invalid<T: std::fmt::Debug>(result: Result<T, Error>) {
    let error = result.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn single_key_operations_reject_blank_keys() {
    block_on(async {
        for key in INVALID_KEYS {
            let fixture = Fixture::new();
            assert_invalid(fixture.cache.get_or_load(key, &1, LoadFlag::None).await);
            assert_invalid(fixture.cache.set(key, 1).await);
            assert_invalid(fixture.cache.remove(key).await);
            fixture.assert_untouched();
        }
    });
}

#[test]
fn one_blank_key_rejects_the_whole_batch() {
    block_on(async {
        let cancel = CancellationToken::new();
        for key in INVALID_KEYS {
            let fixture = Fixture::new();
            let keys = vec!["1".to_string(), key.to_string()];

            assert_invalid(fixture.cache.get_batch_or_load(&keys, &[1, 2], LoadFlag::None, &cancel).await);
            assert_invalid(
                fixture
                    .cache
                    .set_batch(HashMap::from([("1".to_string(), 1), (key.to_string(), 2)]), &cancel)
                    .await,
            );
            assert_invalid(fixture.cache.remove_batch(&keys, &cancel).await);
            fixture.assert_untouched();
        }
    });
}

#[test]
fn validation_precedes_cancellation() {
    block_on(async {
        let fixture = Fixture::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_invalid(fixture.cache.remove_batch(&[String::new()], &cancel).await);
        fixture.assert_untouched();
    });
}

#[test]
fn keys_with_inner_whitespace_are_accepted() {
    block_on(async {
        let fixture = Fixture::new();
        assert!(fixture.cache.set(" padded key ", 1).await.unwrap());
        assert_eq!(fixture.tier.value(" padded key "), Some(1));
    });
}
