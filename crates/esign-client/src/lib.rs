//! Async HTTP client for the multi-provider document signing API
//!
//! Wraps the remote signing authority's REST surface: submission,
//! status polling (manual and interval-driven), search/listing, deletion
//! and download. Provider response shapes are normalized into
//! `esign-core`'s unified record model at this boundary.

pub mod auth;
pub mod error;
pub mod http;
pub mod poller;

pub use auth::AuthHeaders;
pub use error::ClientError;
pub use http::{HealthStatus, SigningApi, REQUEST_TIMEOUT};
pub use poller::{refresh, StatusWatch};
