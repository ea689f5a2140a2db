// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use cacheaside_tier::Error;

/// A byte-level client for a shared key-value store.
///
/// Implementations translate their client's failures into [`Error::transient`] when the
/// call may succeed if repeated (timeouts, dropped connections) and [`Error::permanent`]
/// otherwise. Retrying is the caller's job; implementations issue each call once.
///
/// Batch calls carry no atomicity guarantee.
pub trait RemoteStore: Send + Sync {
    /// Reads the bytes stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send;

    /// Stores `value` under `key`, expiring after `ttl`.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Deletes `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Reads many keys. The result is positional: one slot per requested key.
    fn get_many(&self, keys: &[String]) -> impl Future<Output = Result<Vec<Option<Vec<u8>>>, Error>> + Send;

    /// Stores many values with one expiration.
    fn set_many(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Deletes many keys.
    fn remove_many(&self, keys: &[String]) -> impl Future<Output = Result<bool, Error>> + Send;
}
