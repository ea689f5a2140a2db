// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Local tier in front of a distributed tier.

use std::collections::HashMap;
use std::time::Duration;

use cacheaside_tier::{CacheTier, Error};
use futures::join;
use tokio_util::sync::CancellationToken;

/// A two-tier cache that checks a local tier first, then a distributed tier.
///
/// Reads that miss locally (or fail locally) go to the distributed tier, and distributed
/// hits are promoted into the local tier with the promotion TTL. A failed distributed batch
/// read returns the local hits alone. Writes and removes go to
/// both tiers concurrently and succeed only when both do. A local error is returned ahead
/// of a distributed one.
///
/// The orchestrator builds one of these when both tiers are selected; it can also be used
/// directly as a tier.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cacheaside::{CacheTier, InMemoryTier, TwoTier};
/// # futures::executor::block_on(async {
///
/// let local = InMemoryTier::<i32>::new();
/// let remote = InMemoryTier::<i32>::new();
/// remote.set("key", 7, Duration::from_secs(60)).await?;
///
/// let tiers = TwoTier::new(local.clone(), remote, Duration::from_secs(30));
/// assert_eq!(tiers.get("key").await?, Some(7));
/// assert_eq!(local.get("key").await?, Some(7));
/// # Ok::<(), cacheaside_tier::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TwoTier<L, D> {
    local: L,
    distributed: D,
    promotion_ttl: Duration,
}

impl<L, D> TwoTier<L, D> {
    /// Creates a two-tier cache. Values promoted from `distributed` to `local` expire after
    /// `promotion_ttl`.
    #[must_use]
    pub fn new(local: L, distributed: D, promotion_ttl: Duration) -> Self {
        Self {
            local,
            distributed,
            promotion_ttl,
        }
    }

    /// Returns the local tier.
    #[must_use]
    pub fn local(&self) -> &L {
        &self.local
    }

    /// Returns the distributed tier.
    #[must_use]
    pub fn distributed(&self) -> &D {
        &self.distributed
    }
}

impl<L, D> TwoTier<L, D> {
    async fn promote<V>(&self, key: &str, value: V)
    where
        L: CacheTier<V>,
        V: Send,
    {
        if let Err(error) = self.local.set(key, value, self.promotion_ttl).await {
            tracing::debug!(cacheaside.key = key, error = %error, "promotion to local tier failed");
        }
    }
}

impl<L, D, V> CacheTier<V> for TwoTier<L, D>
where
    L: CacheTier<V>,
    D: CacheTier<V>,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        match self.local.get(key).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(cacheaside.key = key, error = %error, "local tier read failed");
            }
        }

        let value = self.distributed.get(key).await?;
        if let Some(value) = &value {
            self.promote(key, value.clone()).await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<bool, Error> {
        let (local, distributed) = join!(self.local.set(key, value.clone(), ttl), self.distributed.set(key, value, ttl));
        Ok(local? & distributed?)
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        let (local, distributed) = join!(self.local.remove(key), self.distributed.remove(key));
        Ok(local? & distributed?)
    }

    async fn get_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<HashMap<String, V>, Error> {
        let mut found = match self.local.get_batch(keys, cancel).await {
            Ok(found) => found,
            Err(error) if error.is_cancelled() => return Err(error),
            Err(error) => {
                tracing::warn!(keys = keys.len(), error = %error, "local tier batch read failed");
                HashMap::new()
            }
        };

        let missing: Vec<String> = keys.iter().filter(|key| !found.contains_key(*key)).cloned().collect();
        if missing.is_empty() {
            return Ok(found);
        }

        let fetched = match self.distributed.get_batch(&missing, cancel).await {
            Ok(fetched) => fetched,
            Err(error) if error.is_cancelled() => return Err(error),
            Err(error) => {
                tracing::warn!(keys = missing.len(), error = %error, "distributed tier batch read failed");
                return Ok(found);
            }
        };
        if !fetched.is_empty() {
            match self.local.set_batch(fetched.clone(), self.promotion_ttl, cancel).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!(keys = fetched.len(), "promotion to local tier refused"),
                Err(error) => tracing::debug!(keys = fetched.len(), error = %error, "promotion to local tier failed"),
            }
        }

        found.extend(fetched);
        Ok(found)
    }

    async fn set_batch(&self, entries: HashMap<String, V>, ttl: Duration, cancel: &CancellationToken) -> Result<bool, Error> {
        let (local, distributed) = join!(
            self.local.set_batch(entries.clone(), ttl, cancel),
            self.distributed.set_batch(entries, ttl, cancel)
        );
        Ok(local? & distributed?)
    }

    async fn remove_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<bool, Error> {
        let (local, distributed) = join!(self.local.remove_batch(keys, cancel), self.distributed.remove_batch(keys, cancel));
        Ok(local? & distributed?)
    }
}
