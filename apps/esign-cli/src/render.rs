//! Text rendering for records, documents and search tables
//!
//! Synchronous providers get the "completed" layout (no signing links,
//! completion timestamp up front); pending workflows get per-signer
//! rows with their URLs or an email-notification note.

use esign_core::{is_synchronous, provider, Document, SignatureRecord, SigningStatus};

/// One submission or status result, laid out by workflow shape.
pub fn record(rec: &SignatureRecord) -> String {
    let mut out = String::new();
    let badge = provider(&rec.service).map(|p| p.symbol).unwrap_or("·");
    out.push_str(&format!("{badge} {} [{}]\n", rec.document_id, rec.service));
    if let Some(title) = rec.metadata.title.as_deref() {
        out.push_str(&format!("  title:     {title}\n"));
    }
    out.push_str(&format!("  status:    {}\n", rec.status));

    if rec.status == SigningStatus::Completed || is_synchronous(&rec.service).unwrap_or(false) {
        if let Some(done) = rec.completed_at {
            out.push_str(&format!("  completed: {}\n", done.to_rfc3339()));
        }
        for signer in &rec.signing_urls {
            out.push_str(&format!(
                "  signed by: {} <{}>\n",
                signer.signer_name, signer.signer_email
            ));
        }
        return out;
    }

    for signer in &rec.signing_urls {
        let mark = if signer.signed { "✓" } else { " " };
        out.push_str(&format!(
            "  [{mark}] {} <{}>",
            signer.signer_name, signer.signer_email
        ));
        match signer.signing_url.as_deref() {
            Some(url) => out.push_str(&format!("\n      {url}\n")),
            None => out.push_str("  (signing link sent by email)\n"),
        }
    }
    out
}

/// Search-result table, one line per record, with expanded records
/// followed by their full detail block.
pub fn search_table(records: &[SignatureRecord], expanded: &esign_core::ExpandedRows) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:<10} {:<12} {:<20}\n",
        "DOCUMENT", "SERVICE", "STATUS", "CREATED"
    ));
    for rec in records {
        out.push_str(&format!(
            "{:<24} {:<10} {:<12} {:<20}\n",
            rec.document_id,
            rec.service,
            rec.status.to_string(),
            rec.created_at.format("%Y-%m-%d %H:%M"),
        ));
        if expanded.is_expanded(&rec.document_id) {
            for line in record(rec).lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
    }
    out.push_str(&format!("{} record(s)\n", records.len()));
    out
}

/// Flat listing table for the user-documents endpoint.
pub fn document_table(docs: &[Document]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:<10} {:<12} {}\n",
        "DOCUMENT", "SERVICE", "STATUS", "TITLE"
    ));
    for doc in docs {
        out.push_str(&format!(
            "{:<24} {:<10} {:<12} {}\n",
            doc.document_id,
            doc.service,
            doc.status.to_string(),
            doc.title.as_deref().unwrap_or("-"),
        ));
    }
    out.push_str(&format!("{} document(s)\n", docs.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use esign_core::{DocumentMetadata, SignerStatus, SigningMode};

    fn base_record(service: &str, status: SigningStatus) -> SignatureRecord {
        SignatureRecord {
            id: "rec-1".into(),
            document_id: "doc-1".into(),
            service: service.into(),
            status,
            signing_urls: vec![SignerStatus {
                signer_name: "Ann".into(),
                signer_email: "ann@x.com".into(),
                signing_url: Some("https://sign.example/ann".into()),
                mode: SigningMode::DirectSigning,
                signed: false,
                signed_at: None,
            }],
            metadata: DocumentMetadata::default(),
            created_at: "2026-08-01T10:00:00Z".parse().unwrap(),
            completed_at: None,
            uploaded_to_storage: false,
            handler: "ops@x.com".into(),
        }
    }

    #[test]
    fn pending_record_shows_signing_links() {
        let text = record(&base_record("scrive", SigningStatus::Pending));
        assert!(text.contains("https://sign.example/ann"));
        assert!(text.contains("pending"));
    }

    #[test]
    fn synchronous_service_never_shows_links() {
        let mut rec = base_record("selfsign", SigningStatus::Completed);
        rec.completed_at = Some("2026-08-01T10:05:00Z".parse().unwrap());
        let text = record(&rec);
        assert!(!text.contains("https://"));
        assert!(text.contains("completed"));
        assert!(text.contains("signed by: Ann"));
    }

    #[test]
    fn email_notification_signer_gets_a_note_instead_of_a_url() {
        let mut rec = base_record("docusign", SigningStatus::Pending);
        rec.signing_urls[0].signing_url = None;
        rec.signing_urls[0].mode = SigningMode::EmailNotification;
        let text = record(&rec);
        assert!(text.contains("signing link sent by email"));
    }

    #[test]
    fn expanded_rows_inline_the_detail_block() {
        let rec = base_record("scrive", SigningStatus::Pending);
        let mut expanded = esign_core::ExpandedRows::default();
        let collapsed = search_table(std::slice::from_ref(&rec), &expanded);
        assert!(!collapsed.contains("https://sign.example/ann"));

        expanded.toggle(&rec.document_id);
        let shown = search_table(std::slice::from_ref(&rec), &expanded);
        assert!(shown.contains("https://sign.example/ann"));
    }
}
