// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache tier capability shared by every cache-aside backend.
//!
//! This crate defines the [`CacheTier`] trait that local and distributed tiers implement,
//! the tier [`Error`] type with its recovery classification, and [`DynamicTier`] for
//! selecting a tier at runtime without the caller knowing its concrete type.
//!
//! # Overview
//!
//! A tier stores opaque values under non-empty string keys. Every write carries the
//! expiration the backing store should enforce; the tier never evicts on its own behalf.
//! Ordinary misses are `Ok(None)`, ordinary tier-reported write failures are `Ok(false)`,
//! and anything else surfaces as an [`Error`].
//!
//! # Implementing a Cache Tier
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! use cacheaside_tier::{CacheTier, Error};
//! use tokio_util::sync::CancellationToken;
//!
//! struct SimpleTier<V>(RwLock<HashMap<String, V>>);
//!
//! impl<V: Clone + Send + Sync> CacheTier<V> for SimpleTier<V> {
//!     async fn get(&self, key: &str) -> Result<Option<V>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, value: V, _ttl: Duration) -> Result<bool, Error> {
//!         self.0.write().unwrap().insert(key.to_string(), value);
//!         Ok(true)
//!     }
//!
//!     async fn remove(&self, key: &str) -> Result<bool, Error> {
//!         self.0.write().unwrap().remove(key);
//!         Ok(true)
//!     }
//!
//!     async fn get_batch(&self, keys: &[String], _cancel: &CancellationToken) -> Result<HashMap<String, V>, Error> {
//!         let data = self.0.read().unwrap();
//!         Ok(keys.iter().filter_map(|k| data.get(k).map(|v| (k.clone(), v.clone()))).collect())
//!     }
//!
//!     async fn set_batch(&self, entries: HashMap<String, V>, _ttl: Duration, _cancel: &CancellationToken) -> Result<bool, Error> {
//!         self.0.write().unwrap().extend(entries);
//!         Ok(true)
//!     }
//!
//!     async fn remove_batch(&self, keys: &[String], _cancel: &CancellationToken) -> Result<bool, Error> {
//!         let mut data = self.0.write().unwrap();
//!         keys.iter().for_each(|k| {
//!             data.remove(k);
//!         });
//!         Ok(true)
//!     }
//! }
//! ```

mod dynamic;
pub mod error;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
pub(crate) mod tier;

#[doc(inline)]
pub use dynamic::{DynamicTier, DynamicTierExt};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use tier::CacheTier;
