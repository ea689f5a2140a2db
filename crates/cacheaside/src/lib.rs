// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache-aside orchestration over local and distributed cache tiers.
//!
//! [`CacheAside`] sits between an application and its source of truth. It provides:
//!
//! - read-through lookups that load from a [`SourceProvider`] on a miss and write the loaded
//!   value back with a uniform expiration;
//! - direct writes and removes, for single keys and batches;
//! - per-call [`LoadFlag`]s that skip either the load or the write-back;
//! - tier selection at build time: a local tier, a distributed tier, or both through
//!   [`TwoTier`];
//! - structured `tracing` events for every outcome and, with the `metrics` feature,
//!   OpenTelemetry counters and histograms.
//!
//! Cache failures on the read path are logged and treated as misses. Failures of the source
//! of truth are returned as [`Error`]s with the provider's own error attached.
//!
//! # Examples
//!
//! ## Local tier
//!
//! ```
//! use std::collections::HashMap;
//! use std::convert::Infallible;
//!
//! use cacheaside::{CacheAside, LoadFlag, Settings, SourceProvider};
//! use tick::Clock;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Catalog;
//!
//! impl SourceProvider<String> for Catalog {
//!     type Error = Infallible;
//!
//!     async fn get(&self, probe: &String) -> Result<Option<String>, Infallible> {
//!         Ok(Some(probe.to_uppercase()))
//!     }
//!
//!     async fn get_batch(
//!         &self,
//!         keys: &[String],
//!         probes: &[String],
//!         _cancel: &CancellationToken,
//!     ) -> Result<HashMap<String, String>, Infallible> {
//!         Ok(keys.iter().cloned().zip(probes.iter().map(|p| p.to_uppercase())).collect())
//!     }
//! }
//! # futures::executor::block_on(async {
//!
//! let cache = CacheAside::builder(Settings::default(), Catalog, Clock::new_frozen())
//!     .memory()
//!     .build()?;
//!
//! let item = cache.get_or_load("item:7", &"widget".to_string(), LoadFlag::None).await?;
//! assert_eq!(item.as_deref(), Some("WIDGET"));
//!
//! cache.remove("item:7").await?;
//! let item = cache.get_or_load("item:7", &String::new(), LoadFlag::ReturnNoneIfNotFoundInCache).await?;
//! assert_eq!(item, None);
//! # Ok::<(), cacheaside::Error>(())
//! # });
//! ```
//!
//! ## Distributed tier
//!
//! With the `redis` feature, `CacheAsideBuilder::connect_redis` connects to the address in
//! [`Settings::connection_string`]. Any other store can be plugged in through
//! [`RemoteStore`] and [`CacheAsideBuilder::distributed_store`]; the distributed tier
//! retries transient failures as [`Settings`] describe.

pub mod builder;
mod cache_aside;
mod error;
mod flags;
mod settings;
mod source;
mod telemetry;
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;
mod two_tier;

#[doc(inline)]
pub use builder::CacheAsideBuilder;
pub use cache_aside::CacheAside;
#[cfg(feature = "distributed")]
#[cfg_attr(docsrs, doc(cfg(feature = "distributed")))]
#[doc(inline)]
pub use cacheaside_distributed::{DistributedTier, RemoteStore, RetryPolicy};
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
#[doc(inline)]
pub use cacheaside_distributed::RedisStore;
#[cfg(feature = "memory")]
#[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
#[doc(inline)]
pub use cacheaside_memory::InMemoryTier;
#[doc(inline)]
pub use cacheaside_tier::{CacheTier, DynamicTier, DynamicTierExt};
pub use error::{Error, ErrorKind, Result};
pub use flags::LoadFlag;
pub use settings::{PartialHitPolicy, Settings, SettingsBuilder, TierSelection};
pub use source::SourceProvider;
pub use two_tier::TwoTier;
