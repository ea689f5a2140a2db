// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-process cache tier backed by moka.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cacheaside_tier::{CacheTier, Error};
use moka::future::Cache;
use tokio_util::sync::CancellationToken;

use crate::builder::InMemoryTierBuilder;
use crate::expiry::{StoredValue, WriteExpiry};

/// An in-process cache tier backed by moka.
///
/// Writes always succeed, so `set` and `remove` return `Ok(true)`. Batch operations check
/// the cancellation signal between keys and fail with a cancelled error when it fires.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cacheaside_memory::InMemoryTier;
/// use cacheaside_tier::CacheTier;
/// # futures::executor::block_on(async {
///
/// let tier = InMemoryTier::<i32>::new();
/// assert!(tier.set("key", 42, Duration::from_secs(60)).await?);
/// assert_eq!(tier.get("key").await?, Some(42));
/// assert!(tier.remove("key").await?);
/// assert_eq!(tier.get("key").await?, None);
/// # Ok::<(), cacheaside_tier::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryTier<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Cache<String, StoredValue<V>>>,
}

impl<V> Default for InMemoryTier<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> InMemoryTier<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an unbounded tier.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a tier holding at most `max_capacity` entries.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a builder for configuring the tier.
    #[must_use]
    pub fn builder() -> InMemoryTierBuilder<V> {
        InMemoryTierBuilder::new()
    }

    pub(crate) fn from_builder(builder: &InMemoryTierBuilder<V>) -> Self {
        let mut moka_builder = Cache::builder().expire_after(WriteExpiry);

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: Arc::new(moka_builder.build()),
        }
    }

    /// Returns the approximate number of live entries.
    ///
    /// Moka applies writes lazily, so the count can lag behind recent writes.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    async fn store(&self, key: &str, value: V, ttl: Duration) {
        self.inner.insert(key.to_owned(), StoredValue { value, ttl }).await;
    }
}

impl<V> CacheTier<V> for InMemoryTier<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        Ok(self.inner.get(key).await.map(|stored| stored.value))
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<bool, Error> {
        self.store(key, value, ttl).await;
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        self.inner.invalidate(key).await;
        Ok(true)
    }

    async fn get_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<HashMap<String, V>, Error> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if cancel.is_cancelled() {
                return Err(Error::cancelled());
            }
            if let Some(stored) = self.inner.get(key).await {
                found.insert(key.clone(), stored.value);
            }
        }
        Ok(found)
    }

    async fn set_batch(&self, entries: HashMap<String, V>, ttl: Duration, cancel: &CancellationToken) -> Result<bool, Error> {
        for (key, value) in entries {
            if cancel.is_cancelled() {
                return Err(Error::cancelled());
            }
            self.store(&key, value, ttl).await;
        }
        Ok(true)
    }

    async fn remove_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<bool, Error> {
        for key in keys {
            if cancel.is_cancelled() {
                return Err(Error::cancelled());
            }
            self.inner.invalidate(key).await;
        }
        Ok(true)
    }
}
