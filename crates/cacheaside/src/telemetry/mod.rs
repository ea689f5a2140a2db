// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logs and optional OpenTelemetry metrics for orchestrator operations.
//!
//! Every operation outcome is recorded once as a `tracing` event carrying the orchestrator
//! name, the operation, the activity and the elapsed time. With the `metrics` feature the
//! same outcome also increments an event counter and records the duration in a histogram.

pub(crate) mod attributes;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
mod recorder;
#[cfg(test)]
pub(crate) mod testing;

pub(crate) use recorder::Telemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    GetOrLoad,
    Set,
    Remove,
    GetBatchOrLoad,
    SetBatch,
    RemoveBatch,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetOrLoad => "cacheaside.get_or_load",
            Self::Set => "cacheaside.set",
            Self::Remove => "cacheaside.remove",
            Self::GetBatchOrLoad => "cacheaside.get_batch_or_load",
            Self::SetBatch => "cacheaside.set_batch",
            Self::RemoveBatch => "cacheaside.remove_batch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    Hit,
    PartialHit,
    Miss,
    Loaded,
    NotFound,
    Stored,
    StoreFailed,
    Removed,
    RemoveFailed,
    ReadFailed,
    Rejected,
    Cancelled,
    Error,
}

impl Activity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cacheaside.hit",
            Self::PartialHit => "cacheaside.partial_hit",
            Self::Miss => "cacheaside.miss",
            Self::Loaded => "cacheaside.loaded",
            Self::NotFound => "cacheaside.not_found",
            Self::Stored => "cacheaside.stored",
            Self::StoreFailed => "cacheaside.store_failed",
            Self::Removed => "cacheaside.removed",
            Self::RemoveFailed => "cacheaside.remove_failed",
            Self::ReadFailed => "cacheaside.read_failed",
            Self::Rejected => "cacheaside.rejected",
            Self::Cancelled => "cacheaside.cancelled",
            Self::Error => "cacheaside.error",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Miss | Self::Loaded | Self::Stored | Self::Removed | Self::Cancelled => Severity::Debug,
            Self::Hit | Self::PartialHit => Severity::Info,
            Self::NotFound | Self::StoreFailed | Self::RemoveFailed | Self::ReadFailed | Self::Rejected => Severity::Warn,
            Self::Error => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}
