//! Unified data model for the signing workflow
//!
//! Three structurally different provider responses are normalized into
//! the [`SignatureRecord`] shape; [`SigningStatus`] is the lifecycle each
//! record moves through.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a signer completes the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigningMode {
    /// Signer visits a provider-issued URL directly.
    #[default]
    DirectSigning,
    /// Provider emails the signer a link; no URL surfaces in the response.
    EmailNotification,
}

impl std::fmt::Display for SigningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningMode::DirectSigning => write!(f, "direct signing"),
            SigningMode::EmailNotification => write!(f, "email notification"),
        }
    }
}

/// A signer as supplied to a signing request.
///
/// Mutable only before submission; the submitted list is carried into the
/// resulting record as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    #[serde(rename = "signer_name")]
    pub name: String,
    #[serde(rename = "signer_email")]
    pub email: String,
    #[serde(default)]
    pub mode: SigningMode,
}

impl Signer {
    pub fn new(name: impl Into<String>, email: impl Into<String>, mode: SigningMode) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            mode,
        }
    }
}

/// Caller-supplied document metadata.
///
/// `created_by`, `created_at` and `service` are stamped at build time and
/// override any caller-supplied values for those keys. Custom fields with
/// an empty key or empty value are excluded when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    // BTreeMap keeps serialized key order deterministic.
    #[serde(flatten)]
    pub custom_fields: BTreeMap<String, String>,
}

impl DocumentMetadata {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            custom_fields: BTreeMap::new(),
        }
    }

    /// Insert a custom field. Empty keys or values are dropped silently,
    /// matching the serialization rule.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        if !key.is_empty() && !value.is_empty() {
            self.custom_fields.insert(key, value);
        }
    }
}

/// Lifecycle of a signature record.
///
/// `Pending → InProgress → Completed | Cancelled | Failed`. Synchronous
/// providers enter directly at `Completed`. Status strings this client
/// does not recognize are preserved in `Other` and treated as
/// non-terminal so polling keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SigningStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Failed,
    #[serde(untagged)]
    Other(String),
}

impl SigningStatus {
    /// Terminal statuses end the workflow; the interval watch must stop
    /// once one is observed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SigningStatus::Completed | SigningStatus::Cancelled | SigningStatus::Failed
        )
    }
}

impl std::fmt::Display for SigningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningStatus::Pending => write!(f, "pending"),
            SigningStatus::InProgress => write!(f, "in_progress"),
            SigningStatus::Completed => write!(f, "completed"),
            SigningStatus::Cancelled => write!(f, "cancelled"),
            SigningStatus::Failed => write!(f, "failed"),
            SigningStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Per-signer state inside a record's `signing_urls` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerStatus {
    pub signer_name: String,
    pub signer_email: String,
    /// Present for direct-signing flows; absent for email notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_url: Option<String>,
    #[serde(default)]
    pub mode: SigningMode,
    #[serde(default)]
    pub signed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

/// The unified view of one document's signing workflow.
///
/// Created on successful submission or discovered via search; identity
/// fields (`document_id`, `service`) are immutable thereafter.
/// [`crate::status::StatusUpdate`] mutates the rest in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Server-side record id, used for deletion. Distinct from
    /// `document_id`, which keys the provider-side workflow.
    #[serde(default, alias = "_id")]
    pub id: String,
    pub document_id: String,
    pub service: String,
    #[serde(default)]
    pub status: SigningStatus,
    #[serde(default)]
    pub signing_urls: Vec<SignerStatus>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uploaded_to_storage: bool,
    /// Email of the authenticated user who owns this record.
    #[serde(default)]
    pub handler: String,
}

impl SignatureRecord {
    /// True once every signer in the record has signed.
    pub fn fully_signed(&self) -> bool {
        !self.signing_urls.is_empty() && self.signing_urls.iter().all(|s| s.signed)
    }

    /// First available signing URL, if any signer has one.
    pub fn first_signing_url(&self) -> Option<&str> {
        self.signing_urls
            .iter()
            .find_map(|s| s.signing_url.as_deref())
    }
}

/// Flat listing item from the full-listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub service: String,
    #[serde(default)]
    pub status: SigningStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn signing_mode_uses_wire_casing() {
        assert_eq!(
            serde_json::to_string(&SigningMode::DirectSigning).unwrap(),
            "\"DIRECT_SIGNING\""
        );
        assert_eq!(
            serde_json::from_str::<SigningMode>("\"EMAIL_NOTIFICATION\"").unwrap(),
            SigningMode::EmailNotification
        );
    }

    #[test]
    fn status_terminality() {
        assert!(SigningStatus::Completed.is_terminal());
        assert!(SigningStatus::Cancelled.is_terminal());
        assert!(SigningStatus::Failed.is_terminal());
        assert!(!SigningStatus::Pending.is_terminal());
        assert!(!SigningStatus::InProgress.is_terminal());
        assert!(!SigningStatus::Other("sent".to_string()).is_terminal());
    }

    #[test]
    fn unknown_status_round_trips_via_other() {
        let status: SigningStatus = serde_json::from_str("\"sent\"").unwrap();
        assert_eq!(status, SigningStatus::Other("sent".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"sent\"");
    }

    #[test]
    fn metadata_drops_empty_entries() {
        let mut meta = DocumentMetadata::with_title("Lease agreement");
        meta.insert("department", "legal");
        meta.insert("", "orphan value");
        meta.insert("orphan key", "");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "Lease agreement", "department": "legal"})
        );
    }

    #[test]
    fn signer_serializes_with_wire_field_names() {
        let signer = Signer::new("Ann", "ann@x.com", SigningMode::DirectSigning);
        let json = serde_json::to_value(&signer).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "signer_name": "Ann",
                "signer_email": "ann@x.com",
                "mode": "DIRECT_SIGNING"
            })
        );
    }

    #[test]
    fn record_signing_url_helpers() {
        let record = SignatureRecord {
            id: "rec-1".into(),
            document_id: "doc-1".into(),
            service: "docusign".into(),
            status: SigningStatus::Pending,
            signing_urls: vec![
                SignerStatus {
                    signer_name: "Ann".into(),
                    signer_email: "ann@x.com".into(),
                    signing_url: None,
                    mode: SigningMode::EmailNotification,
                    signed: true,
                    signed_at: None,
                },
                SignerStatus {
                    signer_name: "Bo".into(),
                    signer_email: "bo@x.com".into(),
                    signing_url: Some("https://sign.example/bo".into()),
                    mode: SigningMode::DirectSigning,
                    signed: false,
                    signed_at: None,
                },
            ],
            metadata: DocumentMetadata::default(),
            created_at: Utc::now(),
            completed_at: None,
            uploaded_to_storage: false,
            handler: "ops@x.com".into(),
        };

        assert!(!record.fully_signed());
        assert_eq!(record.first_signing_url(), Some("https://sign.example/bo"));
    }
}
