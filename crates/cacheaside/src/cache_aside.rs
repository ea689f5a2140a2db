// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache-aside orchestrator.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use cacheaside_tier::{CacheTier, DynamicTier, Error as TierError};
use tick::{Clock, Stopwatch};
use tokio_util::sync::CancellationToken;

use crate::builder::CacheAsideBuilder;
use crate::telemetry::ext::{ClockExt, TimedResult};
use crate::telemetry::{Activity, Operation, Telemetry};
use crate::{Error, ErrorKind, LoadFlag, PartialHitPolicy, Result, Settings, SourceProvider};

/// Coordinates a cache tier and a source of truth.
///
/// Reads consult the cache first and load from the [`SourceProvider`] on a miss, writing the
/// loaded value back with [`Settings::absolute_expiration`]. Writes and removes go straight
/// to the cache. Keys are validated before any collaborator is called: an empty or
/// whitespace key fails with [`ErrorKind::InvalidArgument`].
///
/// Cache failures on the read path never fail a read. A tier that cannot be read is treated
/// as a miss, and a value that cannot be written back is still returned. Failures of the
/// source of truth always fail the operation.
///
/// `CacheAside` is cheap to clone; clones share the tier, the source and the settings.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use std::convert::Infallible;
///
/// use cacheaside::{CacheAside, LoadFlag, Settings, SourceProvider};
/// use tick::Clock;
/// use tokio_util::sync::CancellationToken;
///
/// struct Squares;
///
/// impl SourceProvider<u64> for Squares {
///     type Error = Infallible;
///
///     async fn get(&self, probe: &u64) -> Result<Option<u64>, Infallible> {
///         Ok(Some(probe * probe))
///     }
///
///     async fn get_batch(
///         &self,
///         keys: &[String],
///         probes: &[u64],
///         _cancel: &CancellationToken,
///     ) -> Result<HashMap<String, u64>, Infallible> {
///         Ok(keys.iter().cloned().zip(probes.iter().map(|p| p * p)).collect())
///     }
/// }
/// # futures::executor::block_on(async {
///
/// let cache = CacheAside::builder(Settings::default(), Squares, Clock::new_frozen())
///     .memory()
///     .build()?;
///
/// assert_eq!(cache.get_or_load("square:12", &12, LoadFlag::None).await?, Some(144));
///
/// // The second read is served from the local tier.
/// assert_eq!(cache.get_or_load("square:12", &0, LoadFlag::ReturnNoneIfNotFoundInCache).await?, Some(144));
/// # Ok::<(), cacheaside::Error>(())
/// # });
/// ```
pub struct CacheAside<V, S> {
    tier: DynamicTier<V>,
    source: Arc<S>,
    settings: Arc<Settings>,
    telemetry: Telemetry,
}

impl<V, S> Clone for CacheAside<V, S> {
    fn clone(&self) -> Self {
        Self {
            tier: self.tier.clone(),
            source: Arc::clone(&self.source),
            settings: Arc::clone(&self.settings),
            telemetry: self.telemetry.clone(),
        }
    }
}

impl<V, S> Debug for CacheAside<V, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("name", &self.telemetry.name())
            .field("tier", &self.tier)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<V, S> CacheAside<V, S> {
    /// Starts building an orchestrator.
    ///
    /// `clock` measures operation durations and drives the distributed tier's backoff.
    pub fn builder(settings: Settings, source: S, clock: Clock) -> CacheAsideBuilder<V, S> {
        CacheAsideBuilder::new(settings, source, clock)
    }

    pub(crate) fn from_parts(tier: DynamicTier<V>, source: S, settings: Settings, telemetry: Telemetry) -> Self {
        Self {
            tier,
            source: Arc::new(source),
            settings: Arc::new(settings),
            telemetry,
        }
    }

    /// Returns the name used in logs and metrics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.telemetry.name()
    }

    /// Returns the settings the orchestrator was built with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the active cache tier.
    #[must_use]
    pub fn tier(&self) -> &DynamicTier<V> {
        &self.tier
    }

    fn ttl(&self) -> Duration {
        self.settings.absolute_expiration()
    }

    fn clock(&self) -> &Clock {
        self.telemetry.clock()
    }

    fn check_key(&self, operation: Operation, key: &str, stopwatch: &Stopwatch) -> Result<()> {
        if key.trim().is_empty() {
            let error = Error::invalid_key(key);
            self.telemetry
                .record_failure(operation, Activity::Rejected, Some(key), stopwatch.elapsed(), &error);
            return Err(error);
        }
        Ok(())
    }

    fn check_keys<'a>(&self, operation: Operation, keys: impl IntoIterator<Item = &'a String>, stopwatch: &Stopwatch) -> Result<()> {
        keys.into_iter().try_for_each(|key| self.check_key(operation, key, stopwatch))
    }

    fn check_cancelled(&self, operation: Operation, cancel: &CancellationToken, stopwatch: &Stopwatch) -> Result<()> {
        if cancel.is_cancelled() {
            self.telemetry
                .record(operation, Activity::Cancelled, None, stopwatch.elapsed());
            return Err(Error::cancelled());
        }
        Ok(())
    }

    /// Maps the outcome of a direct write or remove.
    fn finish_write(
        &self,
        operation: Operation,
        key: Option<&str>,
        timed: TimedResult<std::result::Result<bool, TierError>>,
        success: Activity,
        failure: Activity,
    ) -> Result<bool> {
        match timed.result {
            Ok(true) => {
                self.telemetry.record(operation, success, key, timed.duration);
                Ok(true)
            }
            Ok(false) => {
                self.telemetry.record(operation, failure, key, timed.duration);
                Ok(false)
            }
            Err(error) if error.is_cancelled() => {
                self.telemetry.record(operation, Activity::Cancelled, key, timed.duration);
                Err(Error::caused_by(ErrorKind::Cancelled, error))
            }
            Err(error) => {
                self.telemetry
                    .record_failure(operation, Activity::Error, key, timed.duration, &error);
                Err(Error::tier_failed(error))
            }
        }
    }
}

impl<V, S> CacheAside<V, S>
where
    V: Clone + Send + Sync + 'static,
    S: SourceProvider<V>,
{
    /// Returns the cached value for `key`, loading it from the source on a miss.
    ///
    /// `probe` is handed to [`SourceProvider::get`] when the cache misses. `flag` can skip
    /// the load ([`LoadFlag::ReturnNoneIfNotFoundInCache`]) or the write-back
    /// ([`LoadFlag::DoNotSetCacheEntry`]).
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArgument`] if `key` is empty or whitespace.
    /// - [`ErrorKind::SourceNotFound`] if the source has no value for the probe.
    /// - [`ErrorKind::Source`] if the source fails.
    pub async fn get_or_load(&self, key: &str, probe: &V, flag: LoadFlag) -> Result<Option<V>> {
        const OP: Operation = Operation::GetOrLoad;
        let stopwatch = self.clock().stopwatch();
        self.check_key(OP, key, &stopwatch)?;

        match self.tier.get(key).await {
            Ok(Some(value)) => {
                self.telemetry.record(OP, Activity::Hit, Some(key), stopwatch.elapsed());
                return Ok(Some(value));
            }
            Ok(None) => self.telemetry.record(OP, Activity::Miss, Some(key), stopwatch.elapsed()),
            Err(error) => {
                self.telemetry
                    .record_failure(OP, Activity::ReadFailed, Some(key), stopwatch.elapsed(), &error);
            }
        }

        if !flag.loads_on_miss() {
            return Ok(None);
        }

        let value = match self.source.get(probe).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                self.telemetry.record(OP, Activity::NotFound, Some(key), stopwatch.elapsed());
                return Err(Error::source_not_found(key));
            }
            Err(error) => {
                self.telemetry
                    .record_failure(OP, Activity::Error, Some(key), stopwatch.elapsed(), &error);
                return Err(Error::source_failed(error));
            }
        };
        self.telemetry.record(OP, Activity::Loaded, Some(key), stopwatch.elapsed());

        if flag.writes_back() {
            match self.tier.set(key, value.clone(), self.ttl()).await {
                Ok(true) => self.telemetry.record(OP, Activity::Stored, Some(key), stopwatch.elapsed()),
                Ok(false) => self.telemetry.record(OP, Activity::StoreFailed, Some(key), stopwatch.elapsed()),
                Err(error) => {
                    self.telemetry
                        .record_failure(OP, Activity::StoreFailed, Some(key), stopwatch.elapsed(), &error);
                }
            }
        }

        Ok(Some(value))
    }

    /// Writes `value` under `key` with the configured expiration.
    ///
    /// Returns `Ok(false)` when the tier reports that it did not store the value.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArgument`] if `key` is empty or whitespace.
    /// - [`ErrorKind::Tier`] if the tier fails unexpectedly.
    pub async fn set(&self, key: &str, value: V) -> Result<bool> {
        const OP: Operation = Operation::Set;
        self.check_key(OP, key, &self.clock().stopwatch())?;

        let timed = self.clock().timed_async(self.tier.set(key, value, self.ttl())).await;
        self.finish_write(OP, Some(key), timed, Activity::Stored, Activity::StoreFailed)
    }

    /// Removes `key` from the cache.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArgument`] if `key` is empty or whitespace.
    /// - [`ErrorKind::Tier`] if the tier fails unexpectedly.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        const OP: Operation = Operation::Remove;
        self.check_key(OP, key, &self.clock().stopwatch())?;

        let timed = self.clock().timed_async(self.tier.remove(key)).await;
        self.finish_write(OP, Some(key), timed, Activity::Removed, Activity::RemoveFailed)
    }

    /// Returns the cached values for `keys`, loading from the source when nothing is cached.
    ///
    /// When the cache holds only some of the keys, [`Settings::partial_hit_policy`] decides
    /// whether the cached subset is returned as is or the missing keys are loaded. `probes`
    /// are passed to [`SourceProvider::get_batch`]; when they line up with `keys`, only the
    /// probes of the keys being loaded are passed.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArgument`] if any key is empty or whitespace.
    /// - [`ErrorKind::SourceNotFound`] if nothing was cached and the source returns nothing.
    /// - [`ErrorKind::Source`] if the source fails.
    /// - [`ErrorKind::Cancelled`] if `cancel` fires.
    pub async fn get_batch_or_load(
        &self,
        keys: &[String],
        probes: &[V],
        flag: LoadFlag,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, V>> {
        const OP: Operation = Operation::GetBatchOrLoad;
        let stopwatch = self.clock().stopwatch();
        self.check_keys(OP, keys, &stopwatch)?;
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        self.check_cancelled(OP, cancel, &stopwatch)?;

        let cached = match self.tier.get_batch(keys, cancel).await {
            Ok(cached) => cached,
            Err(error) if error.is_cancelled() => {
                self.telemetry.record(OP, Activity::Cancelled, None, stopwatch.elapsed());
                return Err(Error::caused_by(ErrorKind::Cancelled, error));
            }
            Err(error) => {
                self.telemetry
                    .record_failure(OP, Activity::ReadFailed, None, stopwatch.elapsed(), &error);
                HashMap::new()
            }
        };
        self.check_cancelled(OP, cancel, &stopwatch)?;

        if !cached.is_empty() {
            if keys.iter().all(|key| cached.contains_key(key)) {
                self.telemetry.record(OP, Activity::Hit, None, stopwatch.elapsed());
                return Ok(cached);
            }

            self.telemetry.record(OP, Activity::PartialHit, None, stopwatch.elapsed());
            if self.settings.partial_hit_policy() == PartialHitPolicy::ReturnCached || !flag.loads_on_miss() {
                return Ok(cached);
            }

            let (missing_keys, missing_probes) = missing(keys, probes, &cached);
            let loaded = self.load_batch(&missing_keys, &missing_probes, cancel, &stopwatch).await?;
            if flag.writes_back() && !loaded.is_empty() {
                self.write_back_batch(loaded.clone(), cancel, &stopwatch).await?;
            }

            let mut merged = cached;
            merged.extend(loaded);
            return Ok(merged);
        }

        self.telemetry.record(OP, Activity::Miss, None, stopwatch.elapsed());
        if !flag.loads_on_miss() {
            return Ok(HashMap::new());
        }

        let loaded = self.load_batch(keys, probes, cancel, &stopwatch).await?;
        if loaded.is_empty() {
            self.telemetry.record(OP, Activity::NotFound, None, stopwatch.elapsed());
            return Err(Error::batch_not_found(keys.len()));
        }

        if flag.writes_back() {
            self.write_back_batch(loaded.clone(), cancel, &stopwatch).await?;
        }

        Ok(loaded)
    }

    /// Writes every entry with the same configured expiration.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArgument`] if any key is empty or whitespace.
    /// - [`ErrorKind::Tier`] if the tier fails unexpectedly.
    /// - [`ErrorKind::Cancelled`] if `cancel` fires.
    pub async fn set_batch(&self, entries: HashMap<String, V>, cancel: &CancellationToken) -> Result<bool> {
        const OP: Operation = Operation::SetBatch;
        let stopwatch = self.clock().stopwatch();
        self.check_keys(OP, entries.keys(), &stopwatch)?;
        if entries.is_empty() {
            return Ok(true);
        }
        self.check_cancelled(OP, cancel, &stopwatch)?;

        let timed = self
            .clock()
            .timed_async(self.tier.set_batch(entries, self.ttl(), cancel))
            .await;
        self.finish_write(OP, None, timed, Activity::Stored, Activity::StoreFailed)
    }

    /// Removes every key.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArgument`] if any key is empty or whitespace.
    /// - [`ErrorKind::Tier`] if the tier fails unexpectedly.
    /// - [`ErrorKind::Cancelled`] if `cancel` fires.
    pub async fn remove_batch(&self, keys: &[String], cancel: &CancellationToken) -> Result<bool> {
        const OP: Operation = Operation::RemoveBatch;
        let stopwatch = self.clock().stopwatch();
        self.check_keys(OP, keys, &stopwatch)?;
        if keys.is_empty() {
            return Ok(true);
        }
        self.check_cancelled(OP, cancel, &stopwatch)?;

        let timed = self.clock().timed_async(self.tier.remove_batch(keys, cancel)).await;
        self.finish_write(OP, None, timed, Activity::Removed, Activity::RemoveFailed)
    }

    async fn load_batch(
        &self,
        keys: &[String],
        probes: &[V],
        cancel: &CancellationToken,
        stopwatch: &Stopwatch,
    ) -> Result<HashMap<String, V>> {
        const OP: Operation = Operation::GetBatchOrLoad;
        self.check_cancelled(OP, cancel, stopwatch)?;

        match self.source.get_batch(keys, probes, cancel).await {
            Ok(loaded) => {
                self.telemetry.record(OP, Activity::Loaded, None, stopwatch.elapsed());
                Ok(loaded)
            }
            Err(_) if cancel.is_cancelled() => {
                self.telemetry.record(OP, Activity::Cancelled, None, stopwatch.elapsed());
                Err(Error::cancelled())
            }
            Err(error) => {
                self.telemetry
                    .record_failure(OP, Activity::Error, None, stopwatch.elapsed(), &error);
                Err(Error::source_failed(error))
            }
        }
    }

    /// Writes loaded values back. Only cancellation fails the read.
    async fn write_back_batch(&self, loaded: HashMap<String, V>, cancel: &CancellationToken, stopwatch: &Stopwatch) -> Result<()> {
        const OP: Operation = Operation::GetBatchOrLoad;
        self.check_cancelled(OP, cancel, stopwatch)?;

        match self.tier.set_batch(loaded, self.ttl(), cancel).await {
            Ok(true) => self.telemetry.record(OP, Activity::Stored, None, stopwatch.elapsed()),
            Ok(false) => self.telemetry.record(OP, Activity::StoreFailed, None, stopwatch.elapsed()),
            Err(error) => {
                self.telemetry
                    .record_failure(OP, Activity::StoreFailed, None, stopwatch.elapsed(), &error);
            }
        }
        Ok(())
    }
}

/// Returns the keys absent from `cached` and the probes to load them with.
fn missing<V: Clone>(keys: &[String], probes: &[V], cached: &HashMap<String, V>) -> (Vec<String>, Vec<V>) {
    if probes.len() == keys.len() {
        keys.iter()
            .zip(probes)
            .filter(|(key, _)| !cached.contains_key(*key))
            .map(|(key, probe)| (key.clone(), probe.clone()))
            .unzip()
    } else {
        let keys = keys.iter().filter(|key| !cached.contains_key(*key)).cloned().collect();
        (keys, probes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use cacheaside_tier::DynamicTierExt;
    use cacheaside_tier::testing::{MockTier, TierOp};
    use futures::executor::block_on;

    use super::*;
    use crate::telemetry::testing::LogCapture;
    use crate::testing::{MockSource, SourceCall};

    type TestResult = std::result::Result<(), Error>;

    fn orchestrator(settings: Settings) -> (CacheAside<u32, MockSource<u32>>, MockTier<u32>, MockSource<u32>) {
        let tier = MockTier::new();
        let source = MockSource::new(|id: &u32| format!("id:{id}"));
        let telemetry = Telemetry::new("test", Clock::new_frozen(), true);
        let cache = CacheAside::from_parts(tier.clone().into_dynamic(), source.clone(), settings, telemetry);
        (cache, tier, source)
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn missing_keeps_aligned_probes() {
        let cached = HashMap::from([("b".to_string(), 2)]);
        let (keys, probes) = missing(&keys(&["a", "b", "c"]), &[1, 2, 3], &cached);
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(probes, vec![1, 3]);
    }

    #[test]
    fn missing_passes_unaligned_probes_whole() {
        let cached = HashMap::from([("b".to_string(), 2)]);
        let (keys, probes) = missing(&keys(&["a", "b"]), &[7], &cached);
        assert_eq!(keys, vec!["a".to_string()]);
        assert_eq!(probes, vec![7]);
    }

    #[test]
    fn hit_is_logged_at_info() -> TestResult {
        block_on(async {
            let (cache, tier, _source) = orchestrator(Settings::default());
            tier.set("id:1", 1, Duration::from_secs(1)).await.map_err(Error::tier_failed)?;

            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());
            cache.get_or_load("id:1", &1, LoadFlag::None).await?;

            capture.assert_contains("INFO");
            capture.assert_contains(Activity::Hit.as_str());
            Ok(())
        })
    }

    #[test]
    fn read_failure_is_treated_as_miss() -> TestResult {
        block_on(async {
            let (cache, tier, source) = orchestrator(Settings::default());
            source.insert("id:5", 5);
            tier.fail_when(TierOp::is_read);

            assert_eq!(cache.get_or_load("id:5", &5, LoadFlag::None).await?, Some(5));
            assert_eq!(source.calls(), vec![SourceCall::Get(5)]);
            Ok(())
        })
    }

    #[test]
    fn write_uses_absolute_expiration() -> TestResult {
        block_on(async {
            let settings = Settings::builder().absolute_expiration(Duration::from_secs(42)).build();
            let (cache, tier, _source) = orchestrator(settings);

            assert!(cache.set("id:1", 1).await?);
            assert_eq!(
                tier.operations(),
                vec![TierOp::Set {
                    key: "id:1".to_string(),
                    value: 1,
                    ttl: Duration::from_secs(42),
                }]
            );
            Ok(())
        })
    }

    #[test]
    fn tier_error_on_direct_write_is_logged_at_error() {
        block_on(async {
            let (cache, tier, _source) = orchestrator(Settings::default());
            tier.fail_when(TierOp::is_write);

            let capture = LogCapture::new();
            let _guard = tracing::subscriber::set_default(capture.subscriber());
            let error = cache.set("id:1", 1).await.unwrap_err();

            assert_eq!(error.kind(), ErrorKind::Tier);
            capture.assert_contains("ERROR");
        });
    }

    #[test]
    fn cancelled_tier_write_reports_cancelled() {
        block_on(async {
            let (cache, _tier, _source) = orchestrator(Settings::default());
            let cancel = CancellationToken::new();
            let entries = HashMap::from([("id:1".to_string(), 1)]);
            cancel.cancel();

            let error = cache.set_batch(entries, &cancel).await.unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Cancelled);
        });
    }

    #[test]
    fn partial_hit_with_return_none_flag_skips_loading() -> TestResult {
        block_on(async {
            let settings = Settings::builder().partial_hit_policy(PartialHitPolicy::LoadMissing).build();
            let (cache, tier, source) = orchestrator(settings);
            tier.set("id:1", 1, Duration::from_secs(1)).await.map_err(Error::tier_failed)?;

            let found = cache
                .get_batch_or_load(&keys(&["id:1", "id:2"]), &[1, 2], LoadFlag::ReturnNoneIfNotFoundInCache, &CancellationToken::new())
                .await?;

            assert_eq!(found.len(), 1);
            assert_eq!(source.call_count(), 0);
            Ok(())
        })
    }
}
