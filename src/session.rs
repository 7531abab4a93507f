//! A preview session: the model, its metadata provider and the notification log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::export::{export_snapshot, ExportArtifact, SnippetSnapshot};
use crate::fetch::{FetchResult, MetadataProvider};
use crate::notification::Notification;
use crate::snippet::SnippetModel;
use crate::Result;

/// Drives fetch and export on top of a [`SnippetModel`].
///
/// Every failing action leaves the model as it was and pushes an error
/// notification; nothing is retried automatically.
pub struct Session {
    model: SnippetModel,
    provider: Arc<dyn MetadataProvider>,
    notifications: Vec<Notification>,
}

impl Session {
    pub fn new(model: SnippetModel, provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            model,
            provider,
            notifications: Vec::new(),
        }
    }

    pub fn model(&self) -> &SnippetModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut SnippetModel {
        &mut self.model
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Fetch metadata for `raw_url` and merge it into the snippet.
    pub async fn fetch(&mut self, raw_url: &str) -> Result<FetchResult> {
        let ticket = match self.model.begin_fetch(raw_url) {
            Ok(t) => t,
            Err(e) => {
                warn!("Fetch rejected: {}", e);
                self.notifications.push(Notification::error(e.to_string()));
                return Err(e);
            }
        };

        info!("Fetching metadata for {}", ticket.url());
        let url = ticket.url().clone();
        let guard = PendingFetch {
            model: &mut self.model,
            ticket: ticket.id,
        };
        let result = self.provider.fetch(&url).await;
        let outcome = guard.model.complete_fetch(ticket, result);
        drop(guard);

        match outcome {
            Ok(res) => {
                self.notifications
                    .push(Notification::success("Metadata fetched successfully!"));
                Ok(res)
            }
            Err(e) => {
                warn!("{}", e);
                self.notifications.push(Notification::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Serialize the current snippet as of `now`.
    pub fn export(&mut self, now: DateTime<Utc>) -> Result<ExportArtifact> {
        let snapshot = SnippetSnapshot::capture(&self.model);
        let res = export_snapshot(&snapshot, now);
        self.report_export(res)
    }

    /// Serialize the current snippet and save it into `dir`.
    pub fn export_to(&mut self, dir: impl AsRef<Path>, now: DateTime<Utc>) -> Result<PathBuf> {
        let snapshot = SnippetSnapshot::capture(&self.model);
        let res = export_snapshot(&snapshot, now).and_then(|a| a.write_to(dir));
        self.report_export(res)
    }

    fn report_export<T>(&mut self, res: Result<T>) -> Result<T> {
        match &res {
            Ok(_) => self
                .notifications
                .push(Notification::success("Preview exported successfully!")),
            Err(e) => {
                warn!("{}", e);
                self.notifications
                    .push(Notification::error("Failed to export preview"));
            }
        }
        res
    }
}

/// Clears the pending state if the fetch future is dropped mid-await.
struct PendingFetch<'a> {
    model: &'a mut SnippetModel,
    ticket: u64,
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        // no-op once the ticket was completed
        self.model.abandon_fetch(self.ticket);
    }
}
