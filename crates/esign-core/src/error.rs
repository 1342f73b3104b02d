//! Client-detected error types
//!
//! These errors are raised before anything touches the network: a
//! [`ValidationError`] blocks submission entirely, and an
//! [`UnsupportedProviderError`] means the requested service id is not in
//! the capability registry. Both are user-facing and recoverable.

use thiserror::Error;

/// A field-scoped validation failure, raised before submission.
///
/// Validation is fail-fast: the first failing field is reported and no
/// partial request is ever sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// The request field that failed validation (e.g. "document", "signers[0].email").
    pub field: String,
    /// Human-readable reason for the failure.
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// The requested provider id is not in the capability registry.
///
/// Callers must treat this as "service not available", not as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signing service '{0}' is not available")]
pub struct UnsupportedProviderError(pub String);
