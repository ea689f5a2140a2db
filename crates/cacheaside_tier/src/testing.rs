// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock cache tier for testing.
//!
//! This module provides `MockTier`, an in-memory tier that records every operation and
//! supports two kinds of injected failure: raised errors and tier-reported refusals.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{CacheTier, Error};

/// Recorded tier operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOp<V> {
    /// A single-key lookup.
    Get(String),
    /// A single-key write.
    Set {
        /// The key that was written.
        key: String,
        /// The value that was written.
        value: V,
        /// The expiration passed with the write.
        ttl: Duration,
    },
    /// A single-key removal.
    Remove(String),
    /// A batch lookup with the requested keys.
    GetBatch(Vec<String>),
    /// A batch write.
    SetBatch {
        /// The entries that were written.
        entries: HashMap<String, V>,
        /// The uniform expiration passed with the write.
        ttl: Duration,
    },
    /// A batch removal with the requested keys.
    RemoveBatch(Vec<String>),
}

impl<V> TierOp<V> {
    /// Returns `true` for operations that read from the tier.
    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Get(_) | Self::GetBatch(_))
    }

    /// Returns `true` for operations that write to the tier.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Set { .. } | Self::SetBatch { .. })
    }
}

type OpPredicate<V> = Box<dyn Fn(&TierOp<V>) -> bool + Send + Sync>;

/// A configurable mock tier for testing.
///
/// Values are kept in memory. [`fail_when`](Self::fail_when) makes matching operations
/// return a transient [`Error`]; [`refuse_when`](Self::refuse_when) makes them report an
/// ordinary failure instead (`Ok(false)` for writes and removes, a miss for reads).
/// Clones share state, so a test can keep a handle after moving the tier into a cache.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cacheaside_tier::testing::{MockTier, TierOp};
/// use cacheaside_tier::CacheTier;
/// # futures::executor::block_on(async {
///
/// let tier = MockTier::<i32>::new();
/// tier.set("key", 42, Duration::from_secs(60)).await?;
/// assert_eq!(tier.get("key").await?, Some(42));
///
/// tier.fail_when(|op| matches!(op, TierOp::Get(_)));
/// assert!(tier.get("key").await.is_err());
/// # Ok::<(), cacheaside_tier::Error>(())
/// # });
/// ```
pub struct MockTier<V> {
    data: Arc<Mutex<HashMap<String, V>>>,
    operations: Arc<Mutex<Vec<TierOp<V>>>>,
    fail_when: Arc<Mutex<Option<OpPredicate<V>>>>,
    refuse_when: Arc<Mutex<Option<OpPredicate<V>>>>,
}

impl<V> std::fmt::Debug for MockTier<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTier")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .field("refuse_when", &self.refuse_when.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockTier<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
            refuse_when: Arc::clone(&self.refuse_when),
        }
    }
}

impl<V> Default for MockTier<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockTier<V> {
    /// Creates a new empty mock tier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a mock tier with pre-populated data.
    #[must_use]
    pub fn with_data(data: HashMap<String, V>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            refuse_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if the tier holds the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Makes matching operations return a transient error.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&TierOp<V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Makes matching operations report an ordinary tier failure.
    pub fn refuse_when<F>(&self, predicate: F)
    where
        F: Fn(&TierOp<V>) -> bool + Send + Sync + 'static,
    {
        *self.refuse_when.lock() = Some(Box::new(predicate));
    }

    /// Clears both failure predicates.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
        *self.refuse_when.lock() = None;
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: TierOp<V>) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &TierOp<V>) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }

    fn should_refuse(&self, op: &TierOp<V>) -> bool {
        self.refuse_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }
}

/// Outcome of matching an operation against the injected failures.
enum Injected {
    Fail,
    Refuse,
    Proceed,
}

impl<V: Clone> MockTier<V> {
    /// Returns the stored value for a key without recording an operation.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<V> {
        self.data.lock().get(key).cloned()
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<TierOp<V>> {
        self.operations.lock().clone()
    }

    fn inject(&self, op: TierOp<V>) -> Injected {
        let outcome = if self.should_fail(&op) {
            Injected::Fail
        } else if self.should_refuse(&op) {
            Injected::Refuse
        } else {
            Injected::Proceed
        };
        self.record(op);
        outcome
    }
}

impl<V> CacheTier<V> for MockTier<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        match self.inject(TierOp::Get(key.to_string())) {
            Injected::Fail => Err(Error::transient("mock: get failed")),
            Injected::Refuse => Ok(None),
            Injected::Proceed => Ok(self.value(key)),
        }
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<bool, Error> {
        let op = TierOp::Set {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        };
        match self.inject(op) {
            Injected::Fail => Err(Error::transient("mock: set failed")),
            Injected::Refuse => Ok(false),
            Injected::Proceed => {
                self.data.lock().insert(key.to_string(), value);
                Ok(true)
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        match self.inject(TierOp::Remove(key.to_string())) {
            Injected::Fail => Err(Error::transient("mock: remove failed")),
            Injected::Refuse => Ok(false),
            Injected::Proceed => {
                self.data.lock().remove(key);
                Ok(true)
            }
        }
    }

    async fn get_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<HashMap<String, V>, Error> {
        match self.inject(TierOp::GetBatch(keys.to_vec())) {
            _ if cancel.is_cancelled() => Err(Error::cancelled()),
            Injected::Fail => Err(Error::transient("mock: get_batch failed")),
            Injected::Refuse => Ok(HashMap::new()),
            Injected::Proceed => {
                let data = self.data.lock();
                Ok(keys
                    .iter()
                    .filter_map(|key| data.get(key).map(|value| (key.clone(), value.clone())))
                    .collect())
            }
        }
    }

    async fn set_batch(&self, entries: HashMap<String, V>, ttl: Duration, cancel: &CancellationToken) -> Result<bool, Error> {
        let op = TierOp::SetBatch {
            entries: entries.clone(),
            ttl,
        };
        match self.inject(op) {
            _ if cancel.is_cancelled() => Err(Error::cancelled()),
            Injected::Fail => Err(Error::transient("mock: set_batch failed")),
            Injected::Refuse => Ok(false),
            Injected::Proceed => {
                self.data.lock().extend(entries);
                Ok(true)
            }
        }
    }

    async fn remove_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<bool, Error> {
        match self.inject(TierOp::RemoveBatch(keys.to_vec())) {
            _ if cancel.is_cancelled() => Err(Error::cancelled()),
            Injected::Fail => Err(Error::transient("mock: remove_batch failed")),
            Injected::Refuse => Ok(false),
            Injected::Proceed => {
                let mut data = self.data.lock();
                for key in keys {
                    data.remove(key);
                }
                Ok(true)
            }
        }
    }
}
