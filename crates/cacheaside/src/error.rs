// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Errors returned by the orchestrator.

use std::fmt::{Display, Formatter};

/// Classifies why an orchestrator operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A key was empty or whitespace. No collaborator was called.
    InvalidArgument,
    /// The source of truth had no value for a key that missed the cache.
    SourceNotFound,
    /// The source of truth failed. The provider's error is the source.
    Source,
    /// A cache tier failed on a direct write or remove. The tier's error is the source.
    Tier,
    /// The caller's cancellation signal fired.
    Cancelled,
    /// The orchestrator was built without a tier the settings select.
    Configuration,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidArgument => "invalid argument",
            Self::SourceNotFound => "not found in source",
            Self::Source => "source failure",
            Self::Tier => "cache tier failure",
            Self::Cancelled => "cancelled",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// An error from a cache-aside operation.
///
/// [`kind`](Self::kind) tells callers what happened; for [`ErrorKind::Source`] and
/// [`ErrorKind::Tier`] the collaborator's own error is available unmodified through
/// [`std::error::Error::source`].
///
/// # Examples
///
/// ```
/// use cacheaside::{Error, ErrorKind};
///
/// let error = Error::invalid_key("  ");
/// assert_eq!(error.kind(), ErrorKind::InvalidArgument);
/// assert!(error.to_string().contains("invalid argument"));
/// ```
#[ohno::error]
#[display("cache-aside operation failed ({kind})")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates the error for a key that is empty or whitespace.
    #[must_use]
    pub fn invalid_key(key: &str) -> Self {
        Self::caused_by(ErrorKind::InvalidArgument, format!("key must not be empty or whitespace, got {key:?}"))
    }

    /// Creates the error for a key the source of truth does not know.
    #[must_use]
    pub fn source_not_found(key: &str) -> Self {
        Self::caused_by(ErrorKind::SourceNotFound, format!("no value in source for key {key:?}"))
    }

    pub(crate) fn batch_not_found(count: usize) -> Self {
        Self::caused_by(ErrorKind::SourceNotFound, format!("source returned nothing for a batch of {count} keys"))
    }

    /// Wraps a failure of the source of truth.
    pub fn source_failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Source, cause)
    }

    /// Wraps a failure of a cache tier.
    pub fn tier_failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Tier, cause)
    }

    /// Creates the error reported when the caller's cancellation signal fires.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::caused_by(ErrorKind::Cancelled, "operation cancelled")
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::caused_by(ErrorKind::Configuration, message.into())
    }

    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A specialized [`Result`] type for cache-aside operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn invalid_key_reports_offending_key() {
        let error = Error::invalid_key("");
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert!(format!("{error}").contains("\"\""), "got: {error}");
    }

    #[test]
    fn source_failure_keeps_cause() {
        let cause = std::io::Error::other("database offline");
        let error = Error::source_failed(cause);
        assert_eq!(error.kind(), ErrorKind::Source);

        let source = error.source().expect("cause is attached");
        assert!(source.to_string().contains("database offline"));
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn kinds_display_distinctly() {
        let kinds = [
            ErrorKind::InvalidArgument,
            ErrorKind::SourceNotFound,
            ErrorKind::Source,
            ErrorKind::Tier,
            ErrorKind::Cancelled,
            ErrorKind::Configuration,
        ];
        let names: std::collections::HashSet<_> = kinds.iter().map(ToString::to_string).collect();
        assert_eq!(names.len(), kinds.len());
    }
}
