//! Cross-invocation session context
//!
//! The CLI equivalent of the shared cross-screen state: the active
//! service, the last submitted document id, the last signing URL and the
//! last displayed submission result, persisted as JSON between
//! invocations. Passed explicitly to every command, no ambient globals.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use esign_core::SignatureRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub active_service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_signing_url: Option<String>,
    /// The submission result currently on display; cleared when the
    /// active service changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<SignatureRecord>,
    #[serde(skip)]
    path: PathBuf,
}

impl SessionContext {
    /// Load the session file, or start a fresh session when none exists.
    pub fn load(path: &Path) -> Result<Self> {
        let mut session = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("corrupt session file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self {
                active_service: "scrive".to_string(),
                last_document_id: None,
                last_signing_url: None,
                last_result: None,
                path: PathBuf::new(),
            },
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        session.path = path.to_path_buf();
        Ok(session)
    }

    pub fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("writing {}", self.path.display()))?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Switch the active service. Clears the displayed result but keeps
    /// `last_document_id`/`last_signing_url` for downstream commands.
    pub fn set_service(&mut self, service: &str) {
        if self.active_service != service {
            self.active_service = service.to_string();
            self.last_result = None;
        }
    }

    /// Reconcile the active service against the discovered set: if it is
    /// no longer offered, fall back to the set's first element.
    ///
    /// Returns the previous service when a fallback happened.
    pub fn reconcile_services(&mut self, supported: &[String]) -> Option<String> {
        if supported.iter().any(|s| s == &self.active_service) {
            return None;
        }
        let first = supported.first()?;
        let previous = std::mem::replace(&mut self.active_service, first.clone());
        self.last_result = None;
        Some(previous)
    }

    /// Publish the outcome of a successful submission for downstream
    /// commands: the document id always, the signing URL only when some
    /// signer has one.
    pub fn publish(&mut self, record: &SignatureRecord) {
        self.last_document_id = Some(record.document_id.clone());
        if let Some(url) = record.first_signing_url() {
            self.last_signing_url = Some(url.to_string());
        }
        self.last_result = Some(record.clone());
    }
}
