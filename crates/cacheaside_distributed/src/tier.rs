// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The retrying distributed tier.

use std::collections::HashMap;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use cacheaside_tier::{CacheTier, Error};
use futures::future::{Either, select};
use recoverable::{Recovery, RecoveryKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tick::Clock;
use tokio_util::sync::CancellationToken;

use crate::codec::{decode, encode};
use crate::{RemoteStore, RetryPolicy};

const DEFAULT_NAME: &str = "distributed";

#[derive(Debug, Clone, Copy)]
enum StoreOperation {
    Get,
    Set,
    Remove,
    GetMany,
    SetMany,
    RemoveMany,
}

impl StoreOperation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "store.get",
            Self::Set => "store.set",
            Self::Remove => "store.remove",
            Self::GetMany => "store.get_many",
            Self::SetMany => "store.set_many",
            Self::RemoveMany => "store.remove_many",
        }
    }
}

/// A cache tier over a shared [`RemoteStore`].
///
/// Values are stored as JSON. Each store call is retried under the tier's [`RetryPolicy`]
/// while it fails transiently; once the retries are spent the call degrades to an ordinary
/// failure (`Ok(None)`, `Ok(false)`, or an empty map) and a warning is logged. Permanent
/// failures are returned immediately.
///
/// Batch operations check the cancellation signal before every attempt and race it against
/// the backoff wait, returning [`Error::cancelled`] once it fires.
///
/// A batch read skips entries that cannot be decoded instead of failing the batch.
#[derive(Debug)]
pub struct DistributedTier<S> {
    store: Arc<S>,
    policy: RetryPolicy,
    clock: Clock,
    name: &'static str,
}

impl<S> Clone for DistributedTier<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
            clock: self.clock.clone(),
            name: self.name,
        }
    }
}

impl<S: RemoteStore> DistributedTier<S> {
    /// Creates a tier over `store` that waits between retries on `clock`.
    #[must_use]
    pub fn new(store: S, policy: RetryPolicy, clock: Clock) -> Self {
        Self {
            store: Arc::new(store),
            policy,
            clock,
            name: DEFAULT_NAME,
        }
    }

    /// Sets the name reported in log events.
    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `call` under the retry policy.
    ///
    /// Returns `Ok(None)` when every attempt failed transiently.
    async fn with_retry<T, F, Fut>(&self, operation: StoreOperation, cancel: Option<&CancellationToken>, mut call: F) -> Result<Option<T>, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut attempt = 0;
        loop {
            if let Some(token) = cancel
                && token.is_cancelled()
            {
                return Err(Error::cancelled());
            }

            let error = match call().await {
                Ok(value) => return Ok(Some(value)),
                Err(error) => error,
            };

            if error.recovery().kind() != RecoveryKind::Retry {
                return Err(error);
            }

            if attempt >= self.policy.retry_count() {
                tracing::warn!(
                    cacheaside.name = self.name,
                    cacheaside.operation = operation.as_str(),
                    attempts = attempt + 1,
                    error = %error,
                    "distributed cache retries exhausted"
                );
                return Ok(None);
            }

            let delay = self.policy.delay_for(attempt);
            attempt += 1;
            tracing::warn!(
                cacheaside.name = self.name,
                cacheaside.operation = operation.as_str(),
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "retrying distributed cache operation"
            );
            self.wait(delay, cancel).await?;
        }
    }

    async fn wait(&self, delay: Duration, cancel: Option<&CancellationToken>) -> Result<(), Error> {
        let Some(token) = cancel else {
            self.clock.delay(delay).await;
            return Ok(());
        };

        match select(pin!(self.clock.delay(delay)), pin!(token.cancelled())).await {
            Either::Left(_) => Ok(()),
            Either::Right(_) => Err(Error::cancelled()),
        }
    }
}

impl<S, V> CacheTier<V> for DistributedTier<S>
where
    S: RemoteStore,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        let bytes = self.with_retry(StoreOperation::Get, None, || self.store.get(key)).await?;
        bytes.flatten().map(|bytes| decode(&bytes)).transpose()
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<bool, Error> {
        let bytes = encode(&value)?;
        let stored = self
            .with_retry(StoreOperation::Set, None, || self.store.set(key, bytes.clone(), ttl))
            .await?;
        Ok(stored.unwrap_or(false))
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        let removed = self.with_retry(StoreOperation::Remove, None, || self.store.remove(key)).await?;
        Ok(removed.unwrap_or(false))
    }

    async fn get_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<HashMap<String, V>, Error> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let Some(slots) = self
            .with_retry(StoreOperation::GetMany, Some(cancel), || self.store.get_many(keys))
            .await?
        else {
            return Ok(HashMap::new());
        };

        let mut found = HashMap::with_capacity(slots.len());
        for (key, slot) in keys.iter().zip(slots) {
            let Some(bytes) = slot else { continue };
            match decode(&bytes) {
                Ok(value) => {
                    found.insert(key.clone(), value);
                }
                Err(error) => {
                    tracing::warn!(
                        cacheaside.name = self.name,
                        cacheaside.key = key.as_str(),
                        error = %error,
                        "skipping undecodable distributed cache entry"
                    );
                }
            }
        }
        Ok(found)
    }

    async fn set_batch(&self, entries: HashMap<String, V>, ttl: Duration, cancel: &CancellationToken) -> Result<bool, Error> {
        if entries.is_empty() {
            return Ok(true);
        }

        let encoded = entries
            .iter()
            .map(|(key, value)| encode(value).map(|bytes| (key.clone(), bytes)))
            .collect::<Result<Vec<_>, _>>()?;

        let stored = self
            .with_retry(StoreOperation::SetMany, Some(cancel), || self.store.set_many(encoded.clone(), ttl))
            .await?;
        Ok(stored.unwrap_or(false))
    }

    async fn remove_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<bool, Error> {
        if keys.is_empty() {
            return Ok(true);
        }

        let removed = self
            .with_retry(StoreOperation::RemoveMany, Some(cancel), || self.store.remove_many(keys))
            .await?;
        Ok(removed.unwrap_or(false))
    }
}
