// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory [`RemoteStore`] with injectable failures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cacheaside_tier::Error;
use parking_lot::Mutex;

use crate::RemoteStore;

#[derive(Debug, Default)]
struct State {
    data: HashMap<String, (Vec<u8>, Duration)>,
    calls: usize,
    transient_failures: u32,
    permanent_failure: bool,
}

/// A mock [`RemoteStore`] kept in memory.
///
/// [`fail_next`](Self::fail_next) makes the next `n` calls fail transiently, which lets
/// tests count how often the tier retries. [`fail_permanently`](Self::fail_permanently)
/// makes every call fail with a permanent error until switched off. Clones share state.
///
/// Expiration is recorded but never enforced.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<State>>,
}

impl MockStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls fail with a transient error.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().transient_failures = count;
    }

    /// Makes every call fail with a permanent error while `enabled`.
    pub fn fail_permanently(&self, enabled: bool) {
        self.state.lock().permanent_failure = enabled;
    }

    /// Total number of calls received, including failed ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }

    /// Returns the raw bytes stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().data.get(key).map(|(bytes, _)| bytes.clone())
    }

    /// Stores raw bytes without going through the tier.
    pub fn insert_raw(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.state.lock().data.insert(key.into(), (bytes.into(), Duration::MAX));
    }

    /// Returns the expiration `key` was last written with.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.state.lock().data.get(key).map(|(_, ttl)| *ttl)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock().data.contains_key(key)
    }

    fn enter(&self) -> Result<parking_lot::MutexGuard<'_, State>, Error> {
        let mut state = self.state.lock();
        state.calls += 1;

        if state.permanent_failure {
            return Err(Error::permanent("injected permanent failure"));
        }

        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(Error::transient("injected transient failure"));
        }

        Ok(state)
    }
}

impl RemoteStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let state = self.enter()?;
        Ok(state.data.get(key).map(|(bytes, _)| bytes.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, Error> {
        let mut state = self.enter()?;
        state.data.insert(key.to_owned(), (value, ttl));
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<bool, Error> {
        let mut state = self.enter()?;
        state.data.remove(key);
        Ok(true)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, Error> {
        let state = self.enter()?;
        Ok(keys.iter().map(|key| state.data.get(key).map(|(bytes, _)| bytes.clone())).collect())
    }

    async fn set_many(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> Result<bool, Error> {
        let mut state = self.enter()?;
        for (key, value) in entries {
            state.data.insert(key, (value, ttl));
        }
        Ok(true)
    }

    async fn remove_many(&self, keys: &[String]) -> Result<bool, Error> {
        let mut state = self.enter()?;
        for key in keys {
            state.data.remove(key);
        }
        Ok(true)
    }
}
