// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache tier operations.

use std::fmt::{Display, Formatter};

use recoverable::{Recovery, RecoveryInfo};

/// Classifies why a tier operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The backing store is temporarily unreachable or overloaded; retrying may help.
    Transient,
    /// Retrying will not help, e.g. a value that cannot be decoded.
    Permanent,
    /// The caller's cancellation signal fired before the operation completed.
    Cancelled,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An error from a cache tier operation.
///
/// The error wraps whatever the backing store reported and records an [`ErrorKind`].
/// Use [`Recovery::recovery`] to decide whether the operation is worth retrying and
/// [`std::error::Error::source()`] to reach the underlying cause.
///
/// # Example
///
/// ```
/// use cacheaside_tier::{Error, ErrorKind};
/// use recoverable::{Recovery, RecoveryKind};
///
/// let error = Error::transient("connection reset");
/// assert_eq!(error.kind(), ErrorKind::Transient);
/// assert_eq!(error.recovery().kind(), RecoveryKind::Retry);
/// ```
#[ohno::error]
#[display("cache tier operation failed ({kind})")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error that the distributed tier's retry policy will retry.
    pub fn transient(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Transient, cause)
    }

    /// Creates an error that is never retried.
    pub fn permanent(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Permanent, cause)
    }

    /// Creates the error reported when a cancellation signal stops an operation.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::caused_by(ErrorKind::Cancelled, "operation cancelled")
    }

    /// Creates a permanent error from any message or error value.
    ///
    /// This is the entry point for tier implementations in other crates that have
    /// no better classification for a failure.
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::permanent(cause)
    }

    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if retrying the operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::Transient
    }

    /// Returns `true` if the operation stopped because of a cancellation signal.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        match self.kind {
            ErrorKind::Transient => RecoveryInfo::retry(),
            ErrorKind::Permanent | ErrorKind::Cancelled => RecoveryInfo::never(),
        }
    }
}

/// A specialized [`Result`] type for cache tier operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use recoverable::RecoveryKind;

    use super::*;

    #[test]
    fn error_display_contains_kind_and_cause() {
        let error = Error::transient("socket closed");
        let display_str = format!("{error}");
        assert!(display_str.contains("transient"), "got: {display_str}");
        assert!(display_str.contains("socket closed"), "got: {display_str}");
    }

    #[test]
    fn error_debug_contains_cause_message() {
        let error = Error::permanent("bad payload");
        let debug_str = format!("{error:?}");
        assert!(debug_str.contains("bad payload"), "got: {debug_str}");
    }

    #[test]
    fn recovery_follows_kind() {
        assert_eq!(Error::transient("x").recovery().kind(), RecoveryKind::Retry);
        assert_eq!(Error::permanent("x").recovery().kind(), RecoveryKind::Never);
        assert_eq!(Error::cancelled().recovery().kind(), RecoveryKind::Never);
    }

    #[test]
    fn from_message_is_permanent() {
        let error = Error::from_message("unclassified");
        assert_eq!(error.kind(), ErrorKind::Permanent);
        assert!(!error.is_transient());
        assert!(!error.is_cancelled());
    }

    #[test]
    fn cancelled_is_flagged() {
        let error = Error::cancelled();
        assert!(error.is_cancelled());
        assert_eq!(error.kind(), ErrorKind::Cancelled);
    }
}
