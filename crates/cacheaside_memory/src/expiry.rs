// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-entry expiration for the moka cache.

use std::time::{Duration, Instant};

use moka::Expiry;

/// A stored value together with the expiration it was written with.
#[derive(Debug, Clone)]
pub(crate) struct StoredValue<V> {
    pub(crate) value: V,
    pub(crate) ttl: Duration,
}

/// Expires each entry after the TTL it was last written with.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WriteExpiry;

impl<V> Expiry<String, StoredValue<V>> for WriteExpiry {
    fn expire_after_create(&self, _key: &String, value: &StoredValue<V>, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    // An overwrite restarts the clock with the new entry's TTL.
    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}
