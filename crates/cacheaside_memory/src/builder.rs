// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring the in-memory tier.
//!
//! The builder keeps moka's types out of the public API. Expiration is not configured
//! here: every entry expires after the TTL it was written with.

use std::marker::PhantomData;

use crate::tier::InMemoryTier;

/// Builder for configuring an [`InMemoryTier`].
///
/// # Examples
///
/// ```
/// use cacheaside_memory::InMemoryTier;
///
/// let tier = InMemoryTier::<String>::builder()
///     .max_capacity(10_000)
///     .initial_capacity(100)
///     .name("profiles")
///     .build();
/// ```
#[derive(Debug)]
pub struct InMemoryTierBuilder<V> {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
    _phantom: PhantomData<V>,
}

impl<V> Default for InMemoryTierBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> InMemoryTierBuilder<V> {
    /// Creates a builder for an unbounded tier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_capacity: None,
            initial_capacity: None,
            name: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Once the capacity is reached, entries are evicted using the `TinyLFU` policy.
    /// If not set, the tier is limited only by available memory.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets a pre-allocation hint. The tier may still grow beyond it.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets a name used by moka in its own diagnostics.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<V> InMemoryTierBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Builds the tier.
    #[must_use]
    pub fn build(self) -> InMemoryTier<V> {
        InMemoryTier::from_builder(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builder_is_unbounded() {
        let builder = InMemoryTierBuilder::<i32>::default();
        assert!(builder.max_capacity.is_none());
        assert!(builder.initial_capacity.is_none());
        assert!(builder.name.is_none());
    }

    #[test]
    fn builder_records_each_option() {
        let builder = InMemoryTierBuilder::<i32>::new()
            .max_capacity(50)
            .initial_capacity(10)
            .name("orders");
        assert_eq!(builder.max_capacity, Some(50));
        assert_eq!(builder.initial_capacity, Some(10));
        assert_eq!(builder.name.as_deref(), Some("orders"));
    }
}
