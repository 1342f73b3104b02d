//! Search criteria and client-side result-set operations
//!
//! The server executes the query (always scoped to the current handler);
//! everything in this module operates on the retrieved sequence without
//! re-querying: stable sorting with toggle semantics, and the
//! expanded-metadata view state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{SignatureRecord, SigningStatus};

/// Multi-criteria signature search. All fields optional; blank or
/// whitespace-only values mean "not specified" and are never compared
/// against an empty target string. The `handler = current user` filter is
/// implicit and not represented here; the client appends it to every
/// query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

fn specified(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SearchCriteria {
    /// Criteria with blank values collapsed to `None`.
    pub fn normalized(&self) -> Self {
        Self {
            document_id: specified(&self.document_id).map(str::to_string),
            signer_email: specified(&self.signer_email).map(str::to_string),
            status: specified(&self.status).map(str::to_string),
            service: specified(&self.service).map(str::to_string),
        }
    }

    /// True when no explicit criterion is set (only the implicit handler
    /// filter would apply).
    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.document_id.is_none()
            && n.signer_email.is_none()
            && n.status.is_none()
            && n.service.is_none()
    }

    /// Query-string pairs for the signatures search endpoint, with the
    /// implicit handler filter always first.
    pub fn query_pairs(&self, handler: &str) -> Vec<(&'static str, String)> {
        let n = self.normalized();
        let mut pairs = vec![("handler", handler.to_string())];
        if let Some(v) = n.document_id {
            pairs.push(("document_id", v));
        }
        if let Some(v) = n.signer_email {
            pairs.push(("signer_email", v));
        }
        if let Some(v) = n.status {
            pairs.push(("status", v));
        }
        if let Some(v) = n.service {
            pairs.push(("service", v));
        }
        pairs
    }
}

/// Sortable fields of a [`SignatureRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    DocumentId,
    Service,
    Status,
    Handler,
    CreatedAt,
    CompletedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Current sort of the in-memory result sequence.
///
/// Selecting the key again flips the direction; selecting a new key
/// resets to ascending. Sorting never re-queries the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Toggle semantics for a key selection.
    pub fn select(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            *self = SortState::new(key);
        }
    }

    /// Stable sort of `records` under this state. String keys compare
    /// case-insensitively; date keys compare as instants (missing dates
    /// order first ascending).
    pub fn sort(&self, records: &mut [SignatureRecord]) {
        let key = self.key;
        records.sort_by(|a, b| {
            let ordering = compare_by_key(a, b, key);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

fn status_text(status: &SigningStatus) -> String {
    status.to_string()
}

fn compare_by_key(a: &SignatureRecord, b: &SignatureRecord, key: SortKey) -> std::cmp::Ordering {
    match key {
        SortKey::DocumentId => compare_str(&a.document_id, &b.document_id),
        SortKey::Service => compare_str(&a.service, &b.service),
        SortKey::Status => compare_str(&status_text(&a.status), &status_text(&b.status)),
        SortKey::Handler => compare_str(&a.handler, &b.handler),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::CompletedAt => a.completed_at.cmp(&b.completed_at),
    }
}

fn compare_str(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// View-state projection of which rows have their metadata expanded.
///
/// Purely client-side; reset whenever a new search executes.
#[derive(Debug, Clone, Default)]
pub struct ExpandedRows {
    ids: HashSet<String>,
}

impl ExpandedRows {
    /// Toggle one row independently of the others.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Collapse everything; called when a new search runs.
    pub fn reset(&mut self) {
        self.ids.clear();
    }
}
