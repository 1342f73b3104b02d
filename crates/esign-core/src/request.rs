//! Signing request assembly and pre-submission validation
//!
//! [`SigningRequestBuilder`] collects the document, signer list and
//! metadata, validates everything fail-fast, and produces the
//! provider-agnostic [`SigningRequest`] consumed exactly once by the
//! submission client. Construction is pure; nothing here touches the
//! network.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::error::ValidationError;
use crate::model::{DocumentMetadata, Signer};
use crate::registry;

/// Server-side rejection threshold, mirrored client-side.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A validated, ready-to-submit signing request.
///
/// Invariant: exactly one document, at least one signer, a registered
/// service id. Never re-submitted once in flight; the operator builds a
/// fresh request to retry.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    pub service: String,
    pub file_name: String,
    pub content_type: String,
    pub document: Vec<u8>,
    pub signers: Vec<Signer>,
    pub metadata: DocumentMetadata,
    /// Stamped at build time; carried into the serialized metadata.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl SigningRequest {
    /// JSON array of signers for the multipart `signers` form field.
    pub fn signers_json(&self) -> String {
        // Serializing Vec<Signer> cannot fail.
        serde_json::to_string(&self.signers).unwrap_or_default()
    }

    /// JSON object for the multipart `metadata` form field.
    ///
    /// `created_by`, `created_at` and `service` override any
    /// caller-supplied custom fields of the same name.
    pub fn metadata_json(&self) -> String {
        let mut value = serde_json::to_value(&self.metadata).unwrap_or_else(|_| json!({}));
        if let Some(map) = value.as_object_mut() {
            map.insert("created_by".to_string(), json!(self.created_by));
            map.insert("created_at".to_string(), json!(self.created_at.to_rfc3339()));
            map.insert("service".to_string(), json!(self.service));
        }
        value.to_string()
    }
}

/// Assembles and validates a [`SigningRequest`].
#[derive(Debug, Default, Clone)]
pub struct SigningRequestBuilder {
    service: String,
    document: Option<(String, String, Vec<u8>)>,
    signers: Vec<Signer>,
    metadata: DocumentMetadata,
}

impl SigningRequestBuilder {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Attach the document to sign. The content type is checked as
    /// declared (no content sniffing).
    pub fn document(
        mut self,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.document = Some((file_name.into(), content_type.into(), bytes));
        self
    }

    pub fn signer(mut self, signer: Signer) -> Self {
        self.signers.push(signer);
        self
    }

    pub fn signers(mut self, signers: impl IntoIterator<Item = Signer>) -> Self {
        self.signers.extend(signers);
        self
    }

    pub fn metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validate and build, stamping `created_by`/`created_at`.
    ///
    /// Fails fast with a field-scoped [`ValidationError`] on the first
    /// problem; no partial request escapes.
    pub fn build(self, created_by: &str) -> Result<SigningRequest, ValidationError> {
        if registry::provider(&self.service).is_err() {
            return Err(ValidationError::new(
                "service",
                format!("unsupported signing service '{}'", self.service),
            ));
        }

        let (file_name, content_type, document) = self
            .document
            .ok_or_else(|| ValidationError::new("document", "a document is required"))?;

        if content_type != PDF_CONTENT_TYPE {
            return Err(ValidationError::new(
                "document",
                format!("only PDF documents are supported (got '{}')", content_type),
            ));
        }
        if document.is_empty() {
            return Err(ValidationError::new("document", "document is empty"));
        }
        if document.len() > MAX_DOCUMENT_BYTES {
            return Err(ValidationError::new(
                "document",
                "document exceeds the 10 MB size limit",
            ));
        }

        if self.signers.is_empty() {
            return Err(ValidationError::new(
                "signers",
                "at least one signer is required",
            ));
        }
        for (i, signer) in self.signers.iter().enumerate() {
            if signer.name.trim().is_empty() {
                return Err(ValidationError::new(
                    format!("signers[{}].name", i),
                    "signer name must not be empty",
                ));
            }
            if signer.email.trim().is_empty() {
                return Err(ValidationError::new(
                    format!("signers[{}].email", i),
                    "signer email must not be empty",
                ));
            }
        }

        Ok(SigningRequest {
            service: self.service,
            file_name,
            content_type,
            document,
            signers: self.signers,
            metadata: self.metadata,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SigningMode;
    use pretty_assertions::assert_eq;

    fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.7 minimal".to_vec()
    }

    fn ann() -> Signer {
        Signer::new("Ann", "ann@x.com", SigningMode::DirectSigning)
    }

    #[test]
    fn builds_a_valid_request() {
        let request = SigningRequestBuilder::new("scrive")
            .document("lease.pdf", "application/pdf", pdf_bytes())
            .signer(ann())
            .metadata(DocumentMetadata::with_title("Lease"))
            .build("ops@x.com")
            .unwrap();

        assert_eq!(request.service, "scrive");
        assert_eq!(request.signers.len(), 1);
        assert_eq!(request.created_by, "ops@x.com");
    }

    #[test]
    fn rejects_unknown_service_first() {
        // Service resolution happens before any other check.
        let err = SigningRequestBuilder::new("adobe")
            .build("ops@x.com")
            .unwrap_err();
        assert_eq!(err.field, "service");
    }

    #[test]
    fn rejects_missing_document() {
        let err = SigningRequestBuilder::new("scrive")
            .signer(ann())
            .build("ops@x.com")
            .unwrap_err();
        assert_eq!(err.field, "document");
    }

    #[test]
    fn rejects_non_pdf_content_type() {
        let err = SigningRequestBuilder::new("scrive")
            .document("notes.txt", "text/plain", pdf_bytes())
            .signer(ann())
            .build("ops@x.com")
            .unwrap_err();
        assert_eq!(err.field, "document");
        assert!(err.reason.contains("text/plain"));
    }

    #[test]
    fn rejects_oversized_document() {
        let err = SigningRequestBuilder::new("scrive")
            .document("big.pdf", "application/pdf", vec![0u8; MAX_DOCUMENT_BYTES + 1])
            .signer(ann())
            .build("ops@x.com")
            .unwrap_err();
        assert_eq!(err.field, "document");
    }

    #[test]
    fn rejects_empty_signer_list() {
        let err = SigningRequestBuilder::new("scrive")
            .document("lease.pdf", "application/pdf", pdf_bytes())
            .build("ops@x.com")
            .unwrap_err();
        assert_eq!(err.field, "signers");
    }

    #[test]
    fn rejects_blank_signer_fields_with_index() {
        let err = SigningRequestBuilder::new("scrive")
            .document("lease.pdf", "application/pdf", pdf_bytes())
            .signer(ann())
            .signer(Signer::new("  ", "bo@x.com", SigningMode::EmailNotification))
            .build("ops@x.com")
            .unwrap_err();
        assert_eq!(err.field, "signers[1].name");

        let err = SigningRequestBuilder::new("scrive")
            .document("lease.pdf", "application/pdf", pdf_bytes())
            .signer(Signer::new("Bo", "", SigningMode::EmailNotification))
            .build("ops@x.com")
            .unwrap_err();
        assert_eq!(err.field, "signers[0].email");
    }

    #[test]
    fn metadata_json_stamps_build_fields_over_caller_values() {
        let mut metadata = DocumentMetadata::with_title("Lease");
        // Caller tries to spoof the stamped keys; build-time values win.
        metadata.insert("created_by", "intruder@x.com");
        metadata.insert("service", "docusign");

        let request = SigningRequestBuilder::new("scrive")
            .document("lease.pdf", "application/pdf", pdf_bytes())
            .signer(ann())
            .metadata(metadata)
            .build("ops@x.com")
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&request.metadata_json()).unwrap();
        assert_eq!(value["created_by"], "ops@x.com");
        assert_eq!(value["service"], "scrive");
        assert_eq!(value["title"], "Lease");
        assert!(value["created_at"].is_string());
    }

    #[test]
    fn signers_json_is_a_wire_shaped_array() {
        let request = SigningRequestBuilder::new("docusign")
            .document("lease.pdf", "application/pdf", pdf_bytes())
            .signer(ann())
            .build("ops@x.com")
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&request.signers_json()).unwrap();
        assert_eq!(value[0]["signer_email"], "ann@x.com");
        assert_eq!(value[0]["mode"], "DIRECT_SIGNING");
    }
}
