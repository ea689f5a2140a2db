// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`CacheAside`].
//!
//! The builder collects the tiers the orchestrator may use and picks the active one from
//! [`Settings::tiers`] when [`build`](CacheAsideBuilder::build) is called.

use std::fmt::{Debug, Formatter};

use cacheaside_tier::{CacheTier, DynamicTier, DynamicTierExt};
#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Meter, MeterProvider};
use tick::Clock;

#[cfg(feature = "metrics")]
use crate::telemetry::metrics::create_meter;
use crate::telemetry::Telemetry;
use crate::{CacheAside, Error, Result, Settings, TierSelection, TwoTier};

const DEFAULT_NAME: &str = "cacheaside";

/// Builder for a [`CacheAside`] orchestrator.
///
/// Created by [`CacheAside::builder`]. Provide the tiers the settings select, then call
/// [`build`](Self::build).
///
/// # Examples
///
/// ```
/// use cacheaside::{CacheAside, InMemoryTier, Settings, TierSelection};
/// # use cacheaside::SourceProvider;
/// # use std::collections::HashMap;
/// # use tokio_util::sync::CancellationToken;
/// use tick::Clock;
///
/// # struct Source;
/// # impl SourceProvider<String> for Source {
/// #     type Error = std::convert::Infallible;
/// #     async fn get(&self, probe: &String) -> Result<Option<String>, Self::Error> { Ok(Some(probe.clone())) }
/// #     async fn get_batch(&self, _: &[String], _: &[String], _: &CancellationToken) -> Result<HashMap<String, String>, Self::Error> { Ok(HashMap::new()) }
/// # }
/// let settings = Settings::builder().tiers(TierSelection::Local).build();
/// let cache = CacheAside::builder(settings, Source, Clock::new_frozen())
///     .name("greetings")
///     .local(InMemoryTier::<String>::with_capacity(1_000))
///     .build()?;
///
/// assert_eq!(cache.name(), "greetings");
/// # Ok::<(), cacheaside::Error>(())
/// ```
#[must_use]
pub struct CacheAsideBuilder<V, S> {
    settings: Settings,
    source: S,
    clock: Clock,
    name: &'static str,
    logging: bool,
    local: Option<DynamicTier<V>>,
    distributed: Option<DynamicTier<V>>,
    #[cfg(feature = "metrics")]
    meter: Option<Meter>,
}

impl<V, S> Debug for CacheAsideBuilder<V, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAsideBuilder")
            .field("settings", &self.settings)
            .field("name", &self.name)
            .field("logging", &self.logging)
            .field("local", &self.local.is_some())
            .field("distributed", &self.distributed.is_some())
            .finish_non_exhaustive()
    }
}

impl<V, S> CacheAsideBuilder<V, S> {
    pub(crate) fn new(settings: Settings, source: S, clock: Clock) -> Self {
        Self {
            settings,
            source,
            clock,
            name: DEFAULT_NAME,
            logging: true,
            local: None,
            distributed: None,
            #[cfg(feature = "metrics")]
            meter: None,
        }
    }

    /// Sets the name reported in logs and metrics. Defaults to `"cacheaside"`.
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Turns the per-operation log events on or off. On by default.
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Records event counts and operation durations with meters from `provider`.
    #[cfg(feature = "metrics")]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    pub fn meter_provider(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(create_meter(provider));
        self
    }

    /// Records event counts and operation durations with `meter`.
    #[cfg(feature = "metrics")]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    pub fn meter(mut self, meter: Meter) -> Self {
        self.meter = Some(meter);
        self
    }
}

impl<V, S> CacheAsideBuilder<V, S>
where
    V: Send + 'static,
{
    /// Sets the local tier.
    pub fn local<T>(mut self, tier: T) -> Self
    where
        T: CacheTier<V> + 'static,
    {
        self.local = Some(tier.into_dynamic());
        self
    }

    /// Sets the distributed tier.
    pub fn distributed<T>(mut self, tier: T) -> Self
    where
        T: CacheTier<V> + 'static,
    {
        self.distributed = Some(tier.into_dynamic());
        self
    }
}

#[cfg(feature = "memory")]
impl<V, S> CacheAsideBuilder<V, S>
where
    V: Clone + Send + Sync + 'static,
{
    /// Uses an unbounded in-memory local tier.
    #[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
    pub fn memory(self) -> Self {
        self.local(cacheaside_memory::InMemoryTier::<V>::new())
    }
}

#[cfg(feature = "distributed")]
impl<V, S> CacheAsideBuilder<V, S>
where
    V: serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
{
    /// Uses a distributed tier over `store`, retrying as the settings describe.
    #[cfg_attr(docsrs, doc(cfg(feature = "distributed")))]
    pub fn distributed_store<R>(self, store: R) -> Self
    where
        R: cacheaside_distributed::RemoteStore + 'static,
    {
        let tier = cacheaside_distributed::DistributedTier::new(store, self.settings.retry_policy(), self.clock.clone());
        self.distributed(tier)
    }

    /// Connects to Redis at [`Settings::connection_string`] and uses it as the distributed tier.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) when no
    /// connection string is set and [`ErrorKind::Tier`](crate::ErrorKind::Tier) when the
    /// connection cannot be established.
    #[cfg(feature = "redis")]
    #[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
    pub async fn connect_redis(self) -> Result<Self> {
        let Some(connection_string) = self.settings.connection_string() else {
            return Err(Error::configuration("a redis tier needs a connection string"));
        };
        let store = cacheaside_distributed::RedisStore::connect(connection_string)
            .await
            .map_err(Error::tier_failed)?;
        Ok(self.distributed_store(store))
    }
}

impl<V, S> CacheAsideBuilder<V, S>
where
    V: Clone + Send + Sync + 'static,
{
    /// Builds the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) when a tier the
    /// settings select was not provided.
    pub fn build(self) -> Result<CacheAside<V, S>> {
        let selection = self.settings.tiers();
        let tier = match (selection, self.local, self.distributed) {
            (TierSelection::Local, Some(local), _) => local,
            (TierSelection::Distributed, _, Some(distributed)) => distributed,
            (TierSelection::Both, Some(local), Some(distributed)) => {
                TwoTier::new(local, distributed, self.settings.absolute_expiration()).into_dynamic()
            }
            (selection, local, distributed) => {
                return Err(Error::configuration(format!(
                    "tier selection {selection:?} is missing a tier (local: {}, distributed: {})",
                    if local.is_some() { "set" } else { "not set" },
                    if distributed.is_some() { "set" } else { "not set" },
                )));
            }
        };

        #[cfg(feature = "metrics")]
        let telemetry = match &self.meter {
            Some(meter) => Telemetry::with_meter(self.name, self.clock, self.logging, meter),
            None => Telemetry::new(self.name, self.clock, self.logging),
        };
        #[cfg(not(feature = "metrics"))]
        let telemetry = Telemetry::new(self.name, self.clock, self.logging);

        tracing::debug!(cacheaside.name = self.name, tiers = ?selection, "cache-aside orchestrator built");
        Ok(CacheAside::from_parts(tier, self.source, self.settings, telemetry))
    }
}

#[cfg(test)]
mod tests {
    use cacheaside_tier::testing::MockTier;

    use super::*;
    use crate::ErrorKind;
    use crate::testing::MockSource;

    fn source() -> MockSource<u32> {
        MockSource::new(|id: &u32| id.to_string())
    }

    fn settings(tiers: TierSelection) -> Settings {
        Settings::builder().tiers(tiers).build()
    }

    #[test]
    fn default_name() {
        let cache = CacheAside::builder(Settings::default(), source(), Clock::new_frozen())
            .local(MockTier::<u32>::new())
            .build()
            .unwrap();
        assert_eq!(cache.name(), DEFAULT_NAME);
    }

    #[test]
    fn missing_local_tier_is_a_configuration_error() {
        let error = CacheAside::builder(settings(TierSelection::Local), source(), Clock::new_frozen())
            .distributed(MockTier::<u32>::new())
            .build()
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn both_requires_both_tiers() {
        let error = CacheAside::builder(settings(TierSelection::Both), source(), Clock::new_frozen())
            .local(MockTier::<u32>::new())
            .build()
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(error.to_string().contains("distributed: not set"), "got: {error}");
    }

    #[test]
    fn distributed_selection_ignores_local_tier() {
        let local = MockTier::<u32>::new();
        let distributed = MockTier::<u32>::new();
        let cache = CacheAside::builder(settings(TierSelection::Distributed), source(), Clock::new_frozen())
            .local(local.clone())
            .distributed(distributed.clone())
            .build()
            .unwrap();

        futures::executor::block_on(cache.set("k", 1)).unwrap();
        assert!(distributed.contains_key("k"));
        assert!(!local.contains_key("k"));
    }
}
