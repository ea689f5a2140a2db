// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The capability trait every cache tier implements.

use std::collections::HashMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::Error;

/// Trait for cache tier implementations.
///
/// Both the in-process tier and the distributed tier implement this trait, and the
/// orchestrator depends on nothing else. All six methods are required.
///
/// Contract:
/// - `get` returns `Ok(None)` on an ordinary miss and never fails because of one.
/// - Writes and removes return `Ok(false)` when the tier reports an ordinary failure.
/// - Batch methods honor `cancel` cooperatively and may return a partial map.
/// - No atomicity is promised across the keys of a batch.
#[dynosaur::dynosaur(pub(crate) DynCacheTier = dyn(box) CacheTier, bridge(none))]
pub trait CacheTier<V>: Send + Sync {
    /// Looks up a single key.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<V>, Error>> + Send;

    /// Stores a value that the backing store expires after `ttl`.
    fn set(&self, key: &str, value: V, ttl: Duration) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Removes a single key.
    fn remove(&self, key: &str) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Looks up many keys, returning whichever of them are present.
    fn get_batch(&self, keys: &[String], cancel: &CancellationToken) -> impl Future<Output = Result<HashMap<String, V>, Error>> + Send;

    /// Stores many values with one uniform expiration.
    fn set_batch(
        &self,
        entries: HashMap<String, V>,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Removes many keys.
    fn remove_batch(&self, keys: &[String], cancel: &CancellationToken) -> impl Future<Output = Result<bool, Error>> + Send;
}
