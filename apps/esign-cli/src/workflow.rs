//! Submission orchestration
//!
//! Turns CLI arguments into a validated [`SigningRequest`], submits it,
//! and publishes the result into the session so follow-up commands
//! (`status`, `watch`, `download`, `open-url`) work without re-typing
//! the document id.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use esign_client::SigningApi;
use esign_core::{
    DocumentMetadata, SignatureRecord, Signer, SigningMode, SigningRequestBuilder,
};

use crate::session::SessionContext;

/// Parse a CLI mode token. Accepts the short form used on the command
/// line and the wire spelling.
pub fn parse_mode(token: &str) -> Result<SigningMode> {
    match token.to_lowercase().as_str() {
        "direct" | "direct_signing" => Ok(SigningMode::DirectSigning),
        "email" | "email_notification" => Ok(SigningMode::EmailNotification),
        other => bail!("unknown signing mode '{other}' (expected 'direct' or 'email')"),
    }
}

/// Parse the repeated `--signer EMAIL NAME MODE` triples. Clap hands
/// them over as one flat value list.
pub fn parse_signers(raw: &[String]) -> Result<Vec<Signer>> {
    if raw.len() % 3 != 0 {
        bail!("--signer takes exactly EMAIL NAME MODE");
    }
    raw.chunks_exact(3)
        .map(|triple| Ok(Signer::new(&triple[1], &triple[0], parse_mode(&triple[2])?)))
        .collect()
}

/// Assemble metadata from `--title` and repeated `--meta KEY VALUE` pairs.
pub fn build_metadata(title: Option<&str>, pairs: &[String]) -> Result<DocumentMetadata> {
    if pairs.len() % 2 != 0 {
        bail!("--meta takes exactly KEY VALUE");
    }
    let mut metadata = DocumentMetadata {
        title: title.map(str::to_string),
        ..DocumentMetadata::default()
    };
    for pair in pairs.chunks_exact(2) {
        metadata.insert(pair[0].clone(), pair[1].clone());
    }
    Ok(metadata)
}

/// Read the document, build and validate the request, submit it, and
/// record the outcome in the session.
pub async fn submit(
    api: &SigningApi,
    session: &mut SessionContext,
    service: &str,
    document_path: &Path,
    signers: Vec<Signer>,
    metadata: DocumentMetadata,
) -> Result<SignatureRecord> {
    let bytes = fs::read(document_path)
        .with_context(|| format!("reading {}", document_path.display()))?;
    let file_name = document_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.pdf")
        .to_string();

    let request = SigningRequestBuilder::new(service)
        .document(file_name, "application/pdf", bytes)
        .signers(signers)
        .metadata(metadata)
        .build(api.handler())?;

    let record = api.submit(request).await?;
    info!(
        document_id = %record.document_id,
        service = %record.service,
        status = %record.status,
        "document submitted"
    );
    session.publish(&record);
    session.save()?;
    Ok(record)
}
