// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type-erased cache tier for runtime tier selection.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{CacheTier, Error, tier::DynCacheTier};

/// Extension trait for converting any `CacheTier` into a `DynamicTier`.
///
/// Implemented automatically for every `CacheTier`.
///
/// # Examples
///
/// ```
/// use cacheaside_tier::{CacheTier, DynamicTier, DynamicTierExt};
///
/// fn erase<T>(tier: T) -> DynamicTier<String>
/// where
///     T: CacheTier<String> + 'static,
/// {
///     tier.into_dynamic()
/// }
/// ```
pub trait DynamicTierExt<V>: Sized {
    /// Converts this tier into a `DynamicTier`.
    fn into_dynamic(self) -> DynamicTier<V>;
}

impl<V, T> DynamicTierExt<V> for T
where
    T: CacheTier<V> + 'static,
{
    fn into_dynamic(self) -> DynamicTier<V> {
        DynamicTier::new(self)
    }
}

/// A clonable cache tier behind dynamic dispatch.
///
/// The orchestrator holds one of these so that which tier is active (local,
/// distributed, or both) is decided once at composition time and never inspected
/// again on the request path.
pub struct DynamicTier<V>(Arc<DynCacheTier<'static, V>>);

impl<V> DynamicTier<V> {
    pub(crate) fn new<T>(tier: T) -> Self
    where
        T: CacheTier<V> + Send + Sync + 'static,
    {
        Self(DynCacheTier::new_arc(tier))
    }
}

impl<V> Debug for DynamicTier<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicTier").finish()
    }
}

impl<V> Clone for DynamicTier<V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<V> CacheTier<V> for DynamicTier<V>
where
    V: Send,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<bool, Error> {
        self.0.set(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        self.0.remove(key).await
    }

    async fn get_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<HashMap<String, V>, Error> {
        self.0.get_batch(keys, cancel).await
    }

    async fn set_batch(&self, entries: HashMap<String, V>, ttl: Duration, cancel: &CancellationToken) -> Result<bool, Error> {
        self.0.set_batch(entries, ttl, cancel).await
    }

    async fn remove_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<bool, Error> {
        self.0.remove_batch(keys, cancel).await
    }
}
