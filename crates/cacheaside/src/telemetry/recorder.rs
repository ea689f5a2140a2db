// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};
use tick::Clock;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::attributes;
#[cfg(any(feature = "metrics", test))]
use crate::telemetry::metrics::{create_event_counter, create_operation_duration_histogram};
use crate::telemetry::{Activity, Operation, Severity};

/// Records orchestrator outcomes as `tracing` events and, optionally, metrics.
#[derive(Debug, Clone)]
pub(crate) struct Telemetry {
    inner: Arc<TelemetryInner>,
}

#[derive(Debug)]
struct TelemetryInner {
    name: &'static str,
    clock: Clock,
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
    #[cfg(any(feature = "metrics", test))]
    operation_duration: Option<Histogram<f64>>,
}

impl Telemetry {
    pub(crate) fn new(name: &'static str, clock: Clock, logging_enabled: bool) -> Self {
        Self {
            inner: Arc::new(TelemetryInner {
                name,
                clock,
                logging_enabled,
                #[cfg(any(feature = "metrics", test))]
                event_counter: None,
                #[cfg(any(feature = "metrics", test))]
                operation_duration: None,
            }),
        }
    }

    #[cfg(any(feature = "metrics", test))]
    pub(crate) fn with_meter(name: &'static str, clock: Clock, logging_enabled: bool, meter: &Meter) -> Self {
        Self {
            inner: Arc::new(TelemetryInner {
                name,
                clock,
                logging_enabled,
                event_counter: Some(create_event_counter(meter)),
                operation_duration: Some(create_operation_duration_histogram(meter)),
            }),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.inner.name
    }

    pub(crate) fn clock(&self) -> &Clock {
        &self.inner.clock
    }

    /// Records one operation outcome.
    ///
    /// `key` is the single key involved, if any. Batch operations pass `None`.
    pub(crate) fn record(&self, operation: Operation, activity: Activity, key: Option<&str>, duration: Duration) {
        self.record_with(operation, activity, key, duration, None);
    }

    /// Records one operation outcome together with the error behind it.
    pub(crate) fn record_failure(
        &self,
        operation: Operation,
        activity: Activity,
        key: Option<&str>,
        duration: Duration,
        error: &dyn Display,
    ) {
        self.record_with(operation, activity, key, duration, Some(error));
    }

    fn record_with(&self, operation: Operation, activity: Activity, key: Option<&str>, duration: Duration, error: Option<&dyn Display>) {
        #[cfg(any(feature = "metrics", test))]
        self.record_metrics(operation, activity, duration);

        if self.inner.logging_enabled {
            emit(self.inner.name, operation, activity, key, duration, error);
        }
    }

    #[cfg(any(feature = "metrics", test))]
    fn record_metrics(&self, operation: Operation, activity: Activity, duration: Duration) {
        let attrs = [
            KeyValue::new(attributes::CACHEASIDE_NAME, self.inner.name),
            KeyValue::new(attributes::CACHEASIDE_OPERATION_NAME, operation.as_str()),
            KeyValue::new(attributes::CACHEASIDE_ACTIVITY_NAME, activity.as_str()),
        ];

        if let Some(counter) = &self.inner.event_counter {
            counter.add(1, &attrs);
        }

        if let Some(histogram) = &self.inner.operation_duration {
            histogram.record(duration.as_secs_f64(), &attrs);
        }
    }
}

fn emit(name: &'static str, operation: Operation, activity: Activity, key: Option<&str>, duration: Duration, error: Option<&dyn Display>) {
    let op = operation.as_str();
    let act = activity.as_str();
    let duration_ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

    // Tracing levels must be constant. Field names must match attributes.rs.
    macro_rules! emit_event {
        ($level:ident) => {
            tracing::$level!(
                cacheaside.name = name,
                cacheaside.operation = op,
                cacheaside.activity = act,
                cacheaside.key = key,
                cacheaside.duration_ns = duration_ns,
                error = error.map(tracing::field::display),
                "cacheaside.event"
            )
        };
    }

    match activity.severity() {
        Severity::Debug => emit_event!(debug),
        Severity::Info => emit_event!(info),
        Severity::Warn => emit_event!(warn),
        Severity::Error => emit_event!(error),
    }
}
