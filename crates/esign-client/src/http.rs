//! HTTP surface of the signing API
//!
//! [`SigningApi`] wraps a `reqwest` client with a bounded timeout and the
//! opaque auth capability, and exposes one method per consumed endpoint.
//! Submission responses from the three structurally different providers
//! are normalized here into the unified [`SignatureRecord`] shape; nothing
//! downstream branches on the provider id.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use esign_core::{
    registry, Document, DocumentMetadata, SearchCriteria, SignatureRecord, SignerStatus,
    SigningRequest, SigningStatus, StatusUpdate,
};

use crate::auth::AuthHeaders;
use crate::error::ClientError;

/// Every request is bounded; an unanswered call must not leave an
/// operation stuck in flight forever.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the unified signing API.
///
/// Cloning is cheap (the underlying connection pool is shared), which is
/// what the interval watch relies on.
#[derive(Debug, Clone)]
pub struct SigningApi {
    http: reqwest::Client,
    base_url: String,
    auth: AuthHeaders,
}

/// Liveness report from `GET /api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

#[derive(Deserialize)]
struct ServicesResponse {
    supported_services: Vec<String>,
}

#[derive(Deserialize)]
struct SignaturesResponse {
    signatures: Vec<SignatureRecord>,
}

#[derive(Deserialize)]
struct DocumentSearchResponse {
    results: Vec<Document>,
}

#[derive(Deserialize)]
struct UserDocumentsResponse {
    documents: Vec<Document>,
}

/// Raw submission response; providers differ in which fields they fill.
#[derive(Deserialize)]
struct SignResponse {
    #[serde(default, alias = "_id")]
    id: String,
    document_id: String,
    #[serde(default)]
    status: Option<SigningStatus>,
    #[serde(default)]
    signing_urls: Vec<SignUrlEntry>,
    #[serde(default)]
    metadata: Option<DocumentMetadata>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    uploaded_to_storage: bool,
}

#[derive(Deserialize)]
struct SignUrlEntry {
    signer_email: String,
    #[serde(default)]
    signing_url: Option<String>,
    #[serde(default)]
    signed: Option<bool>,
    #[serde(default)]
    signed_at: Option<DateTime<Utc>>,
}

impl SigningApi {
    /// Build a client against `base_url` with the given auth capability.
    pub fn new(base_url: impl Into<String>, auth: AuthHeaders) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, auth, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        auth: AuthHeaders,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Email of the authenticated user all searches are scoped to.
    pub fn handler(&self) -> &str {
        self.auth.handler()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Discover the server-owned set of supported services.
    ///
    /// A discovery failure is surfaced, never papered over with a
    /// hardcoded default list.
    pub async fn supported_services(&self) -> Result<Vec<String>, ClientError> {
        let request = self.auth.apply(self.http.get(self.url("/api/services")));
        let body: ServicesResponse = decode(request.send().await?).await?;
        Ok(body.supported_services)
    }

    /// Submit a signing request to its provider's unified sign endpoint.
    ///
    /// The request is consumed: a failed submission is retried by building
    /// a fresh request, never by replaying this one.
    pub async fn submit(&self, request: SigningRequest) -> Result<SignatureRecord, ClientError> {
        let synchronous = registry::is_synchronous(&request.service)?;
        let url = self.url(&format!("/api/{}/sign", request.service));

        info!(
            service = %request.service,
            signers = request.signers.len(),
            "submitting document for signing"
        );

        let document_part = reqwest::multipart::Part::bytes(request.document.clone())
            .file_name(request.file_name.clone())
            .mime_str(&request.content_type)
            .map_err(|_| {
                esign_core::ValidationError::new("document", "invalid content type")
            })?;
        let form = reqwest::multipart::Form::new()
            .part("document", document_part)
            .text("signers", request.signers_json())
            .text("metadata", request.metadata_json());

        let response = self
            .auth
            .apply(self.http.post(url).multipart(form))
            .send()
            .await?;
        let body: SignResponse = decode(response).await?;

        Ok(self.normalize_submission(&request, body, synchronous))
    }

    /// Collapse a provider-specific submission response into the unified
    /// record shape, joining response entries to the submitted signer list
    /// by email so the ordered signer sequence is preserved.
    fn normalize_submission(
        &self,
        request: &SigningRequest,
        body: SignResponse,
        synchronous: bool,
    ) -> SignatureRecord {
        let mut status = body.status.clone().unwrap_or_default();
        let mut completed_at = body.completed_at;
        let response_signed_all = !body.signing_urls.is_empty()
            && body.signing_urls.iter().all(|e| e.signed == Some(true));

        if synchronous {
            if status == SigningStatus::Completed || response_signed_all {
                status = SigningStatus::Completed;
                completed_at = completed_at.or_else(|| Some(Utc::now()));
            } else {
                // Fail open: present as pending instead of crashing, but
                // report the provider inconsistency.
                warn!(
                    service = %request.service,
                    document_id = %body.document_id,
                    reported = %status,
                    "synchronous provider returned a non-terminal submission result"
                );
                status = SigningStatus::Pending;
                completed_at = None;
            }
        }

        let terminal_complete = status == SigningStatus::Completed;
        let signing_urls = request
            .signers
            .iter()
            .map(|signer| {
                let entry = body
                    .signing_urls
                    .iter()
                    .find(|e| e.signer_email == signer.email);
                SignerStatus {
                    signer_name: signer.name.clone(),
                    signer_email: signer.email.clone(),
                    // Some providers send an empty string when no URL applies.
                    signing_url: entry
                        .and_then(|e| e.signing_url.as_deref())
                        .filter(|u| !u.is_empty())
                        .map(str::to_string),
                    mode: signer.mode,
                    signed: terminal_complete
                        || entry.and_then(|e| e.signed).unwrap_or(false),
                    signed_at: entry.and_then(|e| e.signed_at).or(if terminal_complete {
                        completed_at
                    } else {
                        None
                    }),
                }
            })
            .collect();

        SignatureRecord {
            id: body.id,
            document_id: body.document_id,
            service: request.service.clone(),
            status,
            signing_urls,
            metadata: body.metadata.unwrap_or_else(|| request.metadata.clone()),
            created_at: request.created_at,
            completed_at,
            uploaded_to_storage: body.uploaded_to_storage,
            handler: self.auth.handler().to_string(),
        }
    }

    /// Fetch the partial status of one document.
    ///
    /// Safe to call at any time, including on terminal records.
    pub async fn document_status(
        &self,
        service: &str,
        document_id: &str,
    ) -> Result<StatusUpdate, ClientError> {
        registry::provider(service)?;
        let url = self.url(&format!("/api/{service}/documents/{document_id}/status"));
        debug!(%service, %document_id, "refreshing document status");
        let response = self.auth.apply(self.http.get(url)).send().await?;
        decode(response).await
    }

    /// Single-document detail, used as the search-by-id shortcut.
    pub async fn document_detail(
        &self,
        service: &str,
        document_id: &str,
    ) -> Result<Document, ClientError> {
        registry::provider(service)?;
        let url = self.url(&format!("/api/{service}/documents/{document_id}"));
        let response = self.auth.apply(self.http.get(url)).send().await?;
        decode(response).await
    }

    /// Download the (signed) document bytes. Binary, not JSON.
    pub async fn download(&self, service: &str, document_id: &str) -> Result<Vec<u8>, ClientError> {
        registry::provider(service)?;
        let url = self.url(&format!("/api/{service}/documents/{document_id}/download"));
        let response = self.auth.apply(self.http.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(error_for(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Multi-criteria signature search, always scoped server-side to the
    /// authenticated handler.
    pub async fn search_signatures(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<SignatureRecord>, ClientError> {
        let pairs = criteria.query_pairs(self.auth.handler());
        let request = self
            .auth
            .apply(self.http.get(self.url("/api/signatures/search")).query(&pairs));
        let body: SignaturesResponse = decode(request.send().await?).await?;
        debug!(results = body.signatures.len(), "signature search returned");
        Ok(body.signatures)
    }

    /// Free-form document search (`type` + `value`), optionally restricted
    /// to one service.
    pub async fn search_documents(
        &self,
        kind: &str,
        value: &str,
        service: &str,
    ) -> Result<Vec<Document>, ClientError> {
        let request = self.auth.apply(
            self.http
                .get(self.url("/api/documents/search"))
                .query(&[("type", kind), ("value", value), ("service", service)]),
        );
        let body: DocumentSearchResponse = decode(request.send().await?).await?;
        Ok(body.results)
    }

    /// Quick lookup shortcut: try `term` as an exact document id first,
    /// then fall back to a case-insensitive title match over the user's
    /// full listing.
    pub async fn find_documents(&self, term: &str) -> Result<Vec<Document>, ClientError> {
        let by_id = self.search_documents("document_id", term, "all").await?;
        if !by_id.is_empty() {
            return Ok(by_id);
        }
        let needle = term.to_lowercase();
        let documents = self.list_user_documents("all").await?;
        Ok(documents
            .into_iter()
            .filter(|d| {
                d.title
                    .as_deref()
                    .map_or(false, |t| t.to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// Flat listing of every document owned by the user.
    ///
    /// `service_filter = "all"` applies no service restriction.
    pub async fn list_user_documents(
        &self,
        service_filter: &str,
    ) -> Result<Vec<Document>, ClientError> {
        let mut request = self.http.get(self.url("/api/documents/user"));
        if service_filter != "all" {
            request = request.query(&[("service", service_filter)]);
        }
        let body: UserDocumentsResponse = decode(self.auth.apply(request).send().await?).await?;
        Ok(body.documents)
    }

    /// Remote deletion of one signature record.
    pub async fn delete_signature(&self, signature_id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("/api/signatures/{signature_id}/delete"));
        let response = self.auth.apply(self.http.put(url)).send().await?;
        if !response.status().is_success() {
            return Err(error_for(response).await);
        }
        info!(%signature_id, "signature deleted");
        Ok(())
    }

    /// Delete remotely, then remove the record from the in-memory
    /// sequence. On failure the sequence is left untouched.
    pub async fn delete_record(
        &self,
        records: &mut Vec<SignatureRecord>,
        signature_id: &str,
    ) -> Result<(), ClientError> {
        self.delete_signature(signature_id).await?;
        records.retain(|r| r.id != signature_id);
        Ok(())
    }

    /// Liveness check; diagnostic only.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.http.get(self.url("/api/health")).send().await?;
        decode(response).await
    }
}

/// Decode a JSON body, mapping non-2xx responses to [`ClientError::Provider`]
/// and malformed 2xx bodies to [`ClientError::Decode`].
async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(error_for(response).await);
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Extract the structured reason from an error body.
///
/// The server reports `{"error": ...}` from its exception handlers and
/// `{"detail": ...}` from request validation.
async fn error_for(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let reason = match response.text().await {
        Ok(body) => serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("detail"))
                    .and_then(|r| r.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {status}")),
        Err(_) => format!("HTTP {status}"),
    };
    ClientError::Provider { status, reason }
}
