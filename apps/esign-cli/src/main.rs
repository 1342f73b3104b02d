//! Multi-provider e-signature CLI
//!
//! Orchestrates the full signing workflow against the aggregation
//! server: provider discovery, document submission, status refresh and
//! interval watching, search/sort over the user's signature records,
//! downloads, and record deletion. Session state (active service, last
//! document id, last signing URL) persists between invocations in a
//! JSON file.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use esign_client::{refresh, AuthHeaders, SigningApi, StatusWatch};
use esign_core::{
    provider, ExpandedRows, SearchCriteria, SignatureRecord, SortDirection, SortKey, SortState,
};

mod render;
mod session;
mod workflow;

use session::SessionContext;

#[derive(Parser, Debug)]
#[command(name = "esign")]
#[command(version, about = "Client for the multi-provider e-signature server")]
struct Args {
    /// Base URL of the aggregation server
    #[arg(long, env = "ESIGN_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Bearer token for the API
    #[arg(long, env = "ESIGN_TOKEN")]
    token: String,

    /// Email of the acting user; scopes searches and ownership
    #[arg(long, env = "ESIGN_USER")]
    user: String,

    /// Session state file
    #[arg(long, env = "ESIGN_SESSION_FILE", default_value = ".esign-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the services the server currently offers
    Services,
    /// Set the active signing service
    SetService { service: String },
    /// Submit a document for signing
    Sign {
        /// PDF file to submit
        document: PathBuf,
        /// Repeatable signer triple
        #[arg(long, num_args = 3, value_names = ["EMAIL", "NAME", "MODE"], action = clap::ArgAction::Append, required = true)]
        signer: Vec<String>,
        /// Document title
        #[arg(long)]
        title: Option<String>,
        /// Repeatable custom metadata pair
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"], action = clap::ArgAction::Append)]
        meta: Vec<String>,
        /// Override the session's active service for this submission
        #[arg(long)]
        service: Option<String>,
    },
    /// Refresh and show the status of a document
    Status {
        /// Defaults to the last submitted document
        document_id: Option<String>,
    },
    /// Poll a document's status until it reaches a terminal state
    Watch {
        document_id: Option<String>,
        /// Polling interval in seconds
        #[arg(long, default_value = "5")]
        interval: u64,
    },
    /// Download the signed document
    Download {
        document_id: Option<String>,
        /// Output path; defaults to <document_id>.pdf
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Search the user's signature records
    Search {
        #[arg(long)]
        document_id: Option<String>,
        #[arg(long)]
        signer_email: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        service_filter: Option<String>,
        /// Sort column
        #[arg(long, value_enum, default_value = "created-at")]
        sort: SortColumn,
        #[arg(long)]
        desc: bool,
        /// Document ids whose metadata to show expanded
        #[arg(long)]
        expand: Vec<String>,
    },
    /// List every document the user owns
    List {
        #[arg(long, default_value = "all")]
        service_filter: String,
    },
    /// Shortcut: look up documents by id, falling back to a title match
    Find { term: String },
    /// Delete a signature record
    Delete {
        signature_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print the last signing URL from this session
    OpenUrl,
    /// Show the current session context
    Info,
    /// Server liveness check
    Health,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SortColumn {
    DocumentId,
    Service,
    Status,
    Handler,
    CreatedAt,
    CompletedAt,
}

impl From<SortColumn> for SortKey {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::DocumentId => SortKey::DocumentId,
            SortColumn::Service => SortKey::Service,
            SortColumn::Status => SortKey::Status,
            SortColumn::Handler => SortKey::Handler,
            SortColumn::CreatedAt => SortKey::CreatedAt,
            SortColumn::CompletedAt => SortKey::CompletedAt,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let auth = AuthHeaders::bearer(&args.token, args.user.clone())?;
    let api = SigningApi::new(&args.base_url, auth)?;
    let mut session = SessionContext::load(&args.session_file)?;

    match args.command {
        Command::Services => {
            let supported = api.supported_services().await?;
            if let Some(previous) = session.reconcile_services(&supported) {
                warn!(%previous, fallback = %session.active_service, "active service no longer offered");
                session.save()?;
            }
            for id in &supported {
                let marker = if *id == session.active_service { "*" } else { " " };
                match provider(id) {
                    Ok(p) => println!("{marker} {} {} ({})", p.symbol, p.display_name, p.id),
                    Err(_) => println!("{marker} {id} (unknown to this client)"),
                }
            }
        }
        Command::SetService { service } => {
            provider(&service)?;
            session.set_service(&service);
            session.save()?;
            println!("active service: {}", session.active_service);
        }
        Command::Sign {
            document,
            signer,
            title,
            meta,
            service,
        } => {
            let service = service.unwrap_or_else(|| session.active_service.clone());
            let signers = workflow::parse_signers(&signer)?;
            let metadata = workflow::build_metadata(title.as_deref(), &meta)?;
            let record =
                workflow::submit(&api, &mut session, &service, &document, signers, metadata)
                    .await?;
            print!("{}", render::record(&record));
        }
        Command::Status { document_id } => {
            let document_id = resolve_document_id(&session, document_id)?;
            let mut record = current_record(&api, &session, &document_id).await?;
            refresh(&api, &mut record).await?;
            session.publish(&record);
            session.save()?;
            print!("{}", render::record(&record));
        }
        Command::Watch {
            document_id,
            interval,
        } => {
            let document_id = resolve_document_id(&session, document_id)?;
            let mut record = current_record(&api, &session, &document_id).await?;
            let service = record.service.clone();
            let mut watch = StatusWatch::spawn(
                api.clone(),
                service,
                document_id.clone(),
                Duration::from_secs(interval),
            );
            info!(%document_id, interval, "watching; press Ctrl-C to stop");
            loop {
                tokio::select! {
                    update = watch.updates.recv() => {
                        let Some(update) = update else { break };
                        update.apply(&mut record);
                        println!("{} {}", chrono::Utc::now().format("%H:%M:%S"), record.status);
                        if update.is_terminal() {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        // Dropping the watch below aborts the polling task.
                        println!("watch cancelled");
                        break;
                    }
                }
            }
            session.publish(&record);
            session.save()?;
            print!("{}", render::record(&record));
        }
        Command::Download {
            document_id,
            output,
        } => {
            let document_id = resolve_document_id(&session, document_id)?;
            let record = current_record(&api, &session, &document_id).await?;
            let bytes = api.download(&record.service, &document_id).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(format!("{document_id}.pdf")));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("saved {} bytes to {}", bytes.len(), path.display());
        }
        Command::Search {
            document_id,
            signer_email,
            status,
            service_filter,
            sort,
            desc,
            expand,
        } => {
            let criteria = SearchCriteria {
                document_id,
                signer_email,
                status,
                service: service_filter,
            };
            let mut records = api.search_signatures(&criteria).await?;
            let mut sort_state = SortState::new(sort.into());
            if desc {
                sort_state.direction = SortDirection::Descending;
            }
            sort_state.sort(&mut records);

            let mut expanded = ExpandedRows::default();
            for id in &expand {
                expanded.toggle(id);
            }
            print!("{}", render::search_table(&records, &expanded));
        }
        Command::List { service_filter } => {
            let documents = api.list_user_documents(&service_filter).await?;
            print!("{}", render::document_table(&documents));
        }
        Command::Find { term } => {
            let documents = api.find_documents(&term).await?;
            if documents.is_empty() {
                println!("no document matches '{term}'");
            } else {
                print!("{}", render::document_table(&documents));
            }
        }
        Command::Delete { signature_id, yes } => {
            if !yes && !confirm(&format!("delete signature record {signature_id}?"))? {
                println!("aborted");
                return Ok(());
            }
            api.delete_signature(&signature_id).await?;
            println!("deleted {signature_id}");
        }
        Command::OpenUrl => match &session.last_signing_url {
            Some(url) => println!("{url}"),
            None => bail!("no signing URL in this session; submit a document first"),
        },
        Command::Info => {
            println!("server:          {}", args.base_url);
            println!("user:            {}", args.user);
            println!("active service:  {}", session.active_service);
            println!(
                "last document:   {}",
                session.last_document_id.as_deref().unwrap_or("-")
            );
            println!(
                "last sign URL:   {}",
                session.last_signing_url.as_deref().unwrap_or("-")
            );
        }
        Command::Health => {
            let health = api.health().await?;
            println!("{}: {}", health.service, health.status);
        }
    }

    Ok(())
}

/// Explicit id wins; otherwise fall back to the session's last document.
fn resolve_document_id(session: &SessionContext, explicit: Option<String>) -> Result<String> {
    explicit
        .or_else(|| session.last_document_id.clone())
        .ok_or_else(|| anyhow::anyhow!("no document id given and none in the session"))
}

/// Materialize a record to refresh against: the session's last result if
/// it matches, otherwise a one-off search on the server.
async fn current_record(
    api: &SigningApi,
    session: &SessionContext,
    document_id: &str,
) -> Result<SignatureRecord> {
    if let Some(record) = &session.last_result {
        if record.document_id == document_id {
            return Ok(record.clone());
        }
    }
    let criteria = SearchCriteria {
        document_id: Some(document_id.to_string()),
        ..SearchCriteria::default()
    };
    let mut records = api.search_signatures(&criteria).await?;
    let record = records
        .drain(..)
        .next()
        .ok_or_else(|| anyhow::anyhow!("no record found for document {document_id}"));
    record
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
