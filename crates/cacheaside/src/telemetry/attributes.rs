// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHEASIDE_NAME: &str = "cacheaside.name";

#[cfg(test)]
pub(crate) const CACHEASIDE_EVENT_NAME: &str = "cacheaside.event";

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHEASIDE_OPERATION_NAME: &str = "cacheaside.operation";

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHEASIDE_ACTIVITY_NAME: &str = "cacheaside.activity";

#[cfg(test)]
pub(crate) const CACHEASIDE_KEY_NAME: &str = "cacheaside.key";

#[cfg(test)]
pub(crate) const CACHEASIDE_DURATION_NAME: &str = "cacheaside.duration_ns";
