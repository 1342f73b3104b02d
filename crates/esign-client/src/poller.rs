//! Manual and interval-driven status refresh
//!
//! A manual [`refresh`] is always allowed, terminal or not. The interval
//! watch is the only recurring background task in the system: it runs
//! while the record is non-terminal, stops itself the moment a terminal
//! status is observed, and aborts its task when the handle is dropped so
//! no timer outlives its owner.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use esign_core::{SignatureRecord, StatusUpdate};

use crate::error::ClientError;
use crate::http::SigningApi;

/// Fetch the latest partial status and merge it into `record`.
///
/// The merge is non-destructive: only fields present in the response are
/// written. Idempotent on already-terminal records.
pub async fn refresh(
    api: &SigningApi,
    record: &mut SignatureRecord,
) -> Result<StatusUpdate, ClientError> {
    let update = api
        .document_status(&record.service, &record.document_id)
        .await?;
    update.apply(record);
    Ok(update)
}

/// Handle to a running interval refresh.
///
/// Consume updates from [`StatusWatch::updates`]; the sender side closes
/// once a terminal status has been delivered. Dropping the handle aborts
/// the task, so a dismissed consumer cannot leak its timer.
#[derive(Debug)]
pub struct StatusWatch {
    handle: JoinHandle<()>,
    pub updates: mpsc::Receiver<StatusUpdate>,
}

impl StatusWatch {
    /// Start polling `document_id` every `period`.
    ///
    /// The first poll fires immediately; refreshes are strictly
    /// sequential, so at most one status request is in flight.
    pub fn spawn(
        api: SigningApi,
        service: impl Into<String>,
        document_id: impl Into<String>,
        period: Duration,
    ) -> Self {
        let service = service.into();
        let document_id = document_id.into();
        let (tx, updates) = mpsc::channel(8);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match api.document_status(&service, &document_id).await {
                    Ok(update) => {
                        let terminal = update.is_terminal();
                        if tx.send(update).await.is_err() {
                            // Consumer gone; nothing left to refresh for.
                            break;
                        }
                        if terminal {
                            debug!(%document_id, "status terminal, stopping watch");
                            break;
                        }
                    }
                    Err(err) if err.is_transient() => {
                        // Transient transport failure; try again next tick.
                        warn!(%document_id, error = %err, "status refresh failed");
                    }
                    Err(err) => {
                        warn!(%document_id, error = %err, "stopping watch");
                        break;
                    }
                }
            }
        });

        Self { handle, updates }
    }

    /// True once the polling task has stopped (terminal status observed,
    /// unrecoverable error, or cancellation).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Explicit cancellation; equivalent to dropping the handle.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for StatusWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
