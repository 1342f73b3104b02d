//! Domain model and workflow logic for multi-provider document signing
//!
//! This crate is pure: it defines the provider capability registry, the
//! unified signing data model, request building and validation, the
//! status-merge state machine, and the client-side search/sort engine.
//! Network I/O lives in `esign-client`.

pub mod error;
pub mod model;
pub mod registry;
pub mod request;
pub mod search;
pub mod status;

pub use error::{UnsupportedProviderError, ValidationError};
pub use model::{
    Document, DocumentMetadata, SignatureRecord, Signer, SignerStatus, SigningMode, SigningStatus,
};
pub use registry::{is_synchronous, known_ids, provider, Provider};
pub use request::{SigningRequest, SigningRequestBuilder, MAX_DOCUMENT_BYTES};
pub use search::{ExpandedRows, SearchCriteria, SortDirection, SortKey, SortState};
pub use status::{SignerUpdate, StatusUpdate};
