//! Opaque authentication capability
//!
//! Session management lives outside this crate; it hands us a set of
//! headers to attach to every authenticated request plus the handler
//! email used for the implicit search scope. The client never inspects
//! the header contents.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::ClientError;
use esign_core::ValidationError;

/// Headers plus the authenticated user's identity for search scoping.
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    headers: HeaderMap,
    handler: String,
}

impl AuthHeaders {
    /// Wrap headers produced by an external session manager.
    pub fn new(headers: HeaderMap, handler: impl Into<String>) -> Self {
        Self {
            headers,
            handler: handler.into(),
        }
    }

    /// Convenience for the common bearer-token scheme.
    pub fn bearer(token: &str, handler: impl Into<String>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ValidationError::new("token", "token contains invalid characters"))?;
        headers.insert(AUTHORIZATION, value);
        Ok(Self::new(headers, handler))
    }

    /// Email of the authenticated user; every search is scoped to it.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.headers(self.headers.clone())
    }
}
