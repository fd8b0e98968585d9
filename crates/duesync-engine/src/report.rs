//! Per-entry outcomes and the run summary.

use std::fmt;

use chrono::{DateTime, Utc};
use duesync_providers::RemoteId;
use serde::Serialize;

/// Result of syncing one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The entry was created remotely.
    Created(RemoteId),
    /// The entry already existed remotely under its dedup key and was overwritten.
    Updated(RemoteId),
    /// The ledger already holds this dedup key; no remote call was made.
    Skipped(String),
    /// The remote calendar rejected the entry.
    Failed(String),
}

impl SyncOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the remote id for created or updated entries.
    pub fn remote_id(&self) -> Option<&RemoteId> {
        match self {
            Self::Created(id) | Self::Updated(id) => Some(id),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// One line of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub outcome: SyncOutcome,
}

/// Summary of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// One item per dispatched event, in input order.
    pub items: Vec<ItemReport>,
    /// True if shutdown stopped the run before every event was dispatched.
    pub cancelled: bool,
    /// Why the dedup ledger could not be saved after the run, if it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_error: Option<String>,
}

impl SyncReport {
    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Created(_)))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Updated(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(SyncOutcome::is_failed)
    }

    /// Returns `(summary, reason)` for every failed item.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            SyncOutcome::Failed(reason) => Some((item.summary.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Returns true if any item failed.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Returns the outcomes in input order.
    pub fn outcomes(&self) -> Vec<SyncOutcome> {
        self.items.iter().map(|item| item.outcome.clone()).collect()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} failed",
            self.created(),
            self.updated(),
            self.skipped(),
            self.failed()
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        for (summary, reason) in self.failures() {
            write!(f, "\n  failed: {}: {}", summary, reason)?;
        }
        if let Some(ref err) = self.ledger_error {
            write!(f, "\n  ledger not saved: {}", err)?;
        }
        Ok(())
    }
}
