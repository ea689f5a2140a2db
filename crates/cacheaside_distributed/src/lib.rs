// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Distributed cache tier with bounded retry and backoff.
//!
//! [`DistributedTier`] implements [`CacheTier`](cacheaside_tier::CacheTier) on top of any
//! [`RemoteStore`], a byte-level client for a shared key-value store. Values are encoded as
//! JSON, and every store call runs under a [`RetryPolicy`]:
//!
//! - transient failures are retried up to `retry_count` times after the first attempt;
//! - the wait between attempts is either the configured interval or the interval doubled
//!   per attempt;
//! - when retries run out the tier reports an ordinary failure (a miss for reads, `false`
//!   for writes and removes) instead of an error.
//!
//! Permanent failures are returned at once. Waits go through a [`tick::Clock`], so tests can
//! drive them with controlled time.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "test-util")]
//! # fn main() -> Result<(), cacheaside_tier::Error> {
//! use std::time::Duration;
//!
//! use cacheaside_distributed::testing::MockStore;
//! use cacheaside_distributed::{DistributedTier, RetryPolicy};
//! use cacheaside_tier::CacheTier;
//! use tick::ClockControl;
//!
//! let clock = ClockControl::new().auto_advance_timers(true).to_clock();
//! let store = MockStore::new();
//! let policy = RetryPolicy::new(3, Duration::from_millis(100)).with_exponential_backoff(true);
//! let tier = DistributedTier::new(store.clone(), policy, clock);
//!
//! store.fail_next(2);
//! futures::executor::block_on(async {
//!     assert!(tier.set("key", 42, Duration::from_secs(60)).await?);
//!     let cached: Option<i32> = tier.get("key").await?;
//!     assert_eq!(cached, Some(42));
//!     Ok(())
//! })
//! # }
//! # #[cfg(not(feature = "test-util"))]
//! # fn main() {}
//! ```
//!
//! With the `redis` feature, [`RedisStore`] provides a [`RemoteStore`] backed by
//! `redis::aio::ConnectionManager`.

mod codec;
#[cfg(feature = "redis")]
mod redis_store;
mod retry;
mod store;
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;
mod tier;

#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use redis_store::RedisStore;
pub use retry::RetryPolicy;
pub use store::RemoteStore;
pub use tier::DistributedTier;
