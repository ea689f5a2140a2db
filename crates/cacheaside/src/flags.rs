// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Per-call modifier of the read path.
///
/// Exactly one flag applies to a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoadFlag {
    /// Load from the source on a miss and write the loaded value back to the cache.
    #[default]
    None,
    /// Return nothing on a miss without consulting the source.
    ReturnNoneIfNotFoundInCache,
    /// Load from the source on a miss but leave the cache untouched.
    DoNotSetCacheEntry,
}

impl LoadFlag {
    /// Returns `true` if a cache miss may reach the source.
    #[must_use]
    pub fn loads_on_miss(self) -> bool {
        !matches!(self, Self::ReturnNoneIfNotFoundInCache)
    }

    /// Returns `true` if a loaded value is written back to the cache.
    #[must_use]
    pub fn writes_back(self) -> bool {
        matches!(self, Self::None)
    }
}
