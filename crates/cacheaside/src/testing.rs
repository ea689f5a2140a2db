// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test doubles for the source of truth.
//!
//! [`MockSource`] serves values from memory, records every call it receives and can be told
//! to fail. Cache tier doubles live in [`cacheaside_tier::testing`].

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::SourceProvider;

/// A call received by a [`MockSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall<V> {
    /// A single lookup with the probe it was given.
    Get(V),
    /// A batch lookup.
    GetBatch {
        /// The requested keys.
        keys: Vec<String>,
        /// The probes passed alongside the keys.
        probes: Vec<V>,
    },
}

/// The error a failing [`MockSource`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSourceError;

impl Display for MockSourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("mock source failure")
    }
}

impl std::error::Error for MockSourceError {}

struct State<V> {
    data: HashMap<String, V>,
    calls: Vec<SourceCall<V>>,
    failing: bool,
}

/// An in-memory source of truth for tests.
///
/// Single lookups find their entry through the key function given to [`new`](Self::new),
/// applied to the probe. Batch lookups use the requested keys and return only the keys
/// present. Clones share state.
///
/// # Examples
///
/// ```
/// use cacheaside::SourceProvider;
/// use cacheaside::testing::{MockSource, SourceCall};
/// # futures::executor::block_on(async {
///
/// let source = MockSource::new(|id: &u32| format!("user:{id}"));
/// source.insert("user:7", 7);
///
/// assert_eq!(source.get(&7).await, Ok(Some(7)));
/// assert_eq!(source.calls(), vec![SourceCall::Get(7)]);
/// # });
/// ```
pub struct MockSource<V> {
    state: Arc<Mutex<State<V>>>,
    key_of: Arc<dyn Fn(&V) -> String + Send + Sync>,
}

impl<V> Clone for MockSource<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            key_of: Arc::clone(&self.key_of),
        }
    }
}

impl<V: Debug> Debug for MockSource<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockSource")
            .field("data", &state.data)
            .field("calls", &state.calls.len())
            .field("failing", &state.failing)
            .finish_non_exhaustive()
    }
}

impl<V> MockSource<V> {
    /// Creates an empty source. `key_of` maps a probe to the key of the value it identifies.
    pub fn new(key_of: impl Fn(&V) -> String + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                data: HashMap::new(),
                calls: Vec::new(),
                failing: false,
            })),
            key_of: Arc::new(key_of),
        }
    }

    /// Adds or replaces a value.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.state.lock().data.insert(key.into(), value);
    }

    /// Removes a value.
    pub fn remove(&self, key: &str) {
        self.state.lock().data.remove(key);
    }

    /// Makes every following call fail with [`MockSourceError`] until turned off.
    pub fn fail(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

impl<V: Clone> MockSource<V> {
    /// Returns every call received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<SourceCall<V>> {
        self.state.lock().calls.clone()
    }
}

impl<V> SourceProvider<V> for MockSource<V>
where
    V: Clone + Send + Sync,
{
    type Error = MockSourceError;

    async fn get(&self, probe: &V) -> Result<Option<V>, MockSourceError> {
        let key = (self.key_of)(probe);
        let mut state = self.state.lock();
        state.calls.push(SourceCall::Get(probe.clone()));
        if state.failing {
            return Err(MockSourceError);
        }
        Ok(state.data.get(&key).cloned())
    }

    async fn get_batch(&self, keys: &[String], probes: &[V], _cancel: &CancellationToken) -> Result<HashMap<String, V>, MockSourceError> {
        let mut state = self.state.lock();
        state.calls.push(SourceCall::GetBatch {
            keys: keys.to_vec(),
            probes: probes.to_vec(),
        });
        if state.failing {
            return Err(MockSourceError);
        }
        Ok(keys
            .iter()
            .filter_map(|key| state.data.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }
}
