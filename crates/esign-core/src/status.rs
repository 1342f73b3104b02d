//! Status refresh payloads and the non-destructive merge
//!
//! The per-document status endpoint returns a partial view of a record.
//! [`StatusUpdate::apply`] writes only the fields the provider actually
//! reported into the stored [`SignatureRecord`]; every other field keeps
//! its pre-merge value. Search results and the submission result share the
//! same record, so a refresh must never wipe metadata a different
//! operation owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{SignatureRecord, SigningStatus};

/// Per-signer slice of a status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerUpdate {
    #[serde(alias = "email")]
    pub signer_email: String,
    #[serde(default)]
    pub signed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

/// Partial status fetched from `GET /api/{service}/documents/{id}/status`.
///
/// Every field except the identity pair is optional; absent fields are
/// simply not merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SigningStatus>,
    /// Document-level signed flag; `true` marks every signer signed when
    /// no per-signer detail accompanies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Per-signer detail; some providers report it as `database_signatures`.
    #[serde(
        default,
        alias = "database_signatures",
        skip_serializing_if = "Option::is_none"
    )]
    pub signers: Option<Vec<SignerUpdate>>,
}

impl StatusUpdate {
    /// True when this update reports a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().is_some_and(SigningStatus::is_terminal)
    }

    /// Merge this partial into `record`, preserving everything absent here.
    ///
    /// Identity fields (`document_id`, `service`) are never rewritten.
    /// Idempotent: applying the same update twice leaves the record
    /// unchanged after the first application.
    pub fn apply(&self, record: &mut SignatureRecord) {
        if let Some(status) = &self.status {
            record.status = status.clone();
        }

        if let Some(signers) = &self.signers {
            for update in signers {
                if let Some(entry) = record
                    .signing_urls
                    .iter_mut()
                    .find(|s| s.signer_email == update.signer_email)
                {
                    entry.signed = update.signed;
                    if update.signed_at.is_some() {
                        entry.signed_at = update.signed_at;
                    }
                }
            }
        } else if self.signed == Some(true) {
            for entry in &mut record.signing_urls {
                entry.signed = true;
            }
        }

        if self.completed_at.is_some() {
            record.completed_at = self.completed_at;
        }

        // Pending with partial progress becomes in_progress; terminal
        // transitions are only ever server-reported.
        if record.status == SigningStatus::Pending {
            let signed = record.signing_urls.iter().filter(|s| s.signed).count();
            if signed > 0 && signed < record.signing_urls.len() {
                record.status = SigningStatus::InProgress;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentMetadata, SignerStatus, SigningMode};
    use pretty_assertions::assert_eq;

    fn record() -> SignatureRecord {
        let mut metadata = DocumentMetadata::with_title("Lease");
        metadata.insert("department", "legal");
        SignatureRecord {
            id: "rec-1".into(),
            document_id: "doc-1".into(),
            service: "scrive".into(),
            status: SigningStatus::Pending,
            signing_urls: vec![
                SignerStatus {
                    signer_name: "Ann".into(),
                    signer_email: "ann@x.com".into(),
                    signing_url: Some("https://sign.example/ann".into()),
                    mode: SigningMode::DirectSigning,
                    signed: false,
                    signed_at: None,
                },
                SignerStatus {
                    signer_name: "Bo".into(),
                    signer_email: "bo@x.com".into(),
                    signing_url: None,
                    mode: SigningMode::EmailNotification,
                    signed: false,
                    signed_at: None,
                },
            ],
            metadata,
            created_at: "2026-08-01T10:00:00Z".parse().unwrap(),
            completed_at: None,
            uploaded_to_storage: true,
            handler: "ops@x.com".into(),
        }
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut merged = record();
        StatusUpdate::default().apply(&mut merged);
        assert_eq!(merged, record());
    }

    #[test]
    fn merge_preserves_fields_absent_from_the_partial() {
        let mut merged = record();
        let update = StatusUpdate {
            document_id: "doc-1".into(),
            service: "scrive".into(),
            status: Some(SigningStatus::Completed),
            completed_at: Some("2026-08-02T09:00:00Z".parse().unwrap()),
            ..StatusUpdate::default()
        };
        update.apply(&mut merged);

        assert_eq!(merged.status, SigningStatus::Completed);
        assert!(merged.completed_at.is_some());
        // Everything the partial did not carry is untouched.
        assert_eq!(merged.metadata, record().metadata);
        assert_eq!(merged.signing_urls, record().signing_urls);
        assert!(merged.uploaded_to_storage);
        assert_eq!(merged.handler, "ops@x.com");
    }

    #[test]
    fn identity_fields_are_never_rewritten() {
        let mut merged = record();
        let update = StatusUpdate {
            document_id: "other-doc".into(),
            service: "docusign".into(),
            status: Some(SigningStatus::Failed),
            ..StatusUpdate::default()
        };
        update.apply(&mut merged);
        assert_eq!(merged.document_id, "doc-1");
        assert_eq!(merged.service, "scrive");
    }

    #[test]
    fn per_signer_updates_match_by_email() {
        let mut merged = record();
        let update = StatusUpdate {
            signers: Some(vec![SignerUpdate {
                signer_email: "ann@x.com".into(),
                signed: true,
                signed_at: Some("2026-08-01T12:00:00Z".parse().unwrap()),
            }]),
            ..StatusUpdate::default()
        };
        update.apply(&mut merged);

        assert!(merged.signing_urls[0].signed);
        assert!(merged.signing_urls[0].signed_at.is_some());
        assert!(!merged.signing_urls[1].signed);
        // Signing URL survives the refresh.
        assert_eq!(
            merged.signing_urls[0].signing_url.as_deref(),
            Some("https://sign.example/ann")
        );
    }

    #[test]
    fn partial_progress_moves_pending_to_in_progress() {
        let mut merged = record();
        let update = StatusUpdate {
            signers: Some(vec![SignerUpdate {
                signer_email: "ann@x.com".into(),
                signed: true,
                signed_at: None,
            }]),
            ..StatusUpdate::default()
        };
        update.apply(&mut merged);
        assert_eq!(merged.status, SigningStatus::InProgress);
    }

    #[test]
    fn document_level_signed_flag_marks_all_signers() {
        let mut merged = record();
        let update = StatusUpdate {
            status: Some(SigningStatus::Completed),
            signed: Some(true),
            ..StatusUpdate::default()
        };
        update.apply(&mut merged);
        assert!(merged.signing_urls.iter().all(|s| s.signed));
        assert_eq!(merged.status, SigningStatus::Completed);
    }

    #[test]
    fn apply_is_idempotent() {
        let mut once = record();
        let update = StatusUpdate {
            status: Some(SigningStatus::Completed),
            signed: Some(true),
            completed_at: Some("2026-08-02T09:00:00Z".parse().unwrap()),
            ..StatusUpdate::default()
        };
        update.apply(&mut once);
        let mut twice = once.clone();
        update.apply(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn database_signatures_alias_is_accepted() {
        let update: StatusUpdate = serde_json::from_value(serde_json::json!({
            "document_id": "doc-1",
            "service": "scrive",
            "database_signatures": [
                {"email": "ann@x.com", "signed": true}
            ]
        }))
        .unwrap();
        let signers = update.signers.unwrap();
        assert_eq!(signers[0].signer_email, "ann@x.com");
        assert!(signers[0].signed);
    }
}
