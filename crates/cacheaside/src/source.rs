// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

/// The authoritative source of values, consulted on a cache miss.
///
/// Lookups are by probe: a partially populated value carrying whatever the source needs to
/// find the full record. The orchestrator never retries a source call. An error or an
/// empty result fails the calling operation.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use std::convert::Infallible;
///
/// use cacheaside::SourceProvider;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Clone)]
/// struct User {
///     id: u32,
///     name: String,
/// }
///
/// struct Directory;
///
/// impl SourceProvider<User> for Directory {
///     type Error = Infallible;
///
///     async fn get(&self, probe: &User) -> Result<Option<User>, Infallible> {
///         Ok(Some(User {
///             id: probe.id,
///             name: format!("user {}", probe.id),
///         }))
///     }
///
///     async fn get_batch(
///         &self,
///         keys: &[String],
///         probes: &[User],
///         _cancel: &CancellationToken,
///     ) -> Result<HashMap<String, User>, Infallible> {
///         let mut found = HashMap::new();
///         for (key, probe) in keys.iter().zip(probes) {
///             if let Some(user) = self.get(probe).await? {
///                 found.insert(key.clone(), user);
///             }
///         }
///         Ok(found)
///     }
/// }
/// ```
pub trait SourceProvider<V>: Send + Sync {
    /// The error the source reports when a lookup fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up the value a probe identifies.
    fn get(&self, probe: &V) -> impl Future<Output = Result<Option<V>, Self::Error>> + Send;

    /// Looks up many values.
    ///
    /// `probes` are handed over as the caller supplied them; when they line up with `keys`
    /// position by position, the orchestrator keeps that alignment for every subset it
    /// requests.
    fn get_batch(
        &self,
        keys: &[String],
        probes: &[V],
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<HashMap<String, V>, Self::Error>> + Send;
}
