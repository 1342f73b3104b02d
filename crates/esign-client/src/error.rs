//! Client error taxonomy
//!
//! Every failure here is local to one operation and recoverable by
//! retrying the same action; nothing is fatal to the process.

use esign_core::{UnsupportedProviderError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure with no structured body (connection refused,
    /// timeout, DNS).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response carrying a structured reason from the remote
    /// authority.
    #[error("provider rejected the request (HTTP {status}): {reason}")]
    Provider { status: u16, reason: String },

    /// The server answered 2xx but the body did not decode into the
    /// expected shape.
    #[error("could not decode server response: {0}")]
    Decode(String),

    /// Pre-submission validation failure; never sent over the wire.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Service id absent from the capability registry.
    #[error(transparent)]
    UnsupportedProvider(#[from] UnsupportedProviderError),
}

impl ClientError {
    /// True for errors worth retrying as-is (transport hiccups), as
    /// opposed to request problems the operator must fix first.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}
