//! The calendar sync engine.
//!
//! Entries are pushed strictly one at a time, in input order. The start of
//! each remote call is held back until at least `min_interval` has passed
//! since the previous one. A failed entry is recorded and the batch goes on.

use std::time::Duration;

use chrono::{DateTime, Utc};
use duesync_core::{NormalizedEvent, TimeWindow};
use duesync_providers::{RemoteCalendar, RemoteCalendarEntry};
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::ledger::{DedupLedger, dedup_key};
use crate::report::{ItemReport, SyncOutcome, SyncReport};

/// Drops events outside `[now, now + days)`; `days == 0` keeps all future events.
pub fn filter_window(
    events: Vec<NormalizedEvent>,
    now: DateTime<Utc>,
    days: u32,
) -> Vec<NormalizedEvent> {
    let window = TimeWindow::look_ahead(now, days);
    let before = events.len();
    let kept: Vec<_> = events
        .into_iter()
        .filter(|event| window.contains(event.start_instant))
        .collect();

    if kept.len() < before {
        debug!(
            dropped = before - kept.len(),
            kept = kept.len(),
            look_ahead_days = days,
            "dropped events outside the sync window"
        );
    }
    kept
}

/// Enforces the minimum spacing between remote calls.
struct Pacer {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl Pacer {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    async fn wait(&mut self) {
        if let Some(last) = self.last_call {
            sleep_until(last + self.min_interval).await;
        }
        self.last_call = Some(Instant::now());
    }
}

/// Pushes normalized events to a remote calendar.
pub struct SyncEngine {
    config: SyncConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl SyncEngine {
    /// Creates an engine with `config`.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            shutdown: None,
        }
    }

    /// Stops dispatching new entries once `shutdown` reads true.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Pushes every event and returns one outcome per event, in input order.
    ///
    /// No dedup and no authorization check happen here; see [`run`](Self::run).
    /// Fewer outcomes than events are returned only if shutdown was signaled.
    pub async fn sync(
        &self,
        events: &[NormalizedEvent],
        client: &dyn RemoteCalendar,
    ) -> Vec<SyncOutcome> {
        let (items, _) = self.dispatch(events, client, None).await;
        items.into_iter().map(|item| item.outcome).collect()
    }

    /// Runs a full sync: authorization precheck, dedup ledger, report.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AuthMissing`] before any remote call if the client
    /// is not authorized, and a ledger error if the ledger cannot be read.
    /// Rejected entries are reported, not returned as errors. A ledger that
    /// cannot be saved after the remote writes is recorded in
    /// [`SyncReport::ledger_error`] so the per-item outcomes survive.
    pub async fn run(
        &self,
        events: &[NormalizedEvent],
        client: &dyn RemoteCalendar,
    ) -> SyncResult<SyncReport> {
        if !client.is_authorized() {
            return Err(SyncError::auth_missing(
                client.name(),
                "the client holds no usable credentials",
            ));
        }

        let mut ledger = if self.config.dedup.enabled {
            Some(DedupLedger::load(&self.config.dedup.ledger_path)?)
        } else {
            None
        };

        info!(
            events = events.len(),
            calendar = client.name(),
            dedup = ledger.is_some(),
            "starting sync"
        );

        let (items, cancelled) = self.dispatch(events, client, ledger.as_mut()).await;

        let ledger_error = match ledger {
            Some(ref mut ledger) => ledger.save().err().map(|e| {
                warn!(error = %e, "failed to save dedup ledger");
                e.to_string()
            }),
            None => None,
        };

        let report = SyncReport {
            items,
            cancelled,
            ledger_error,
        };
        info!(
            created = report.created(),
            updated = report.updated(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "sync finished"
        );
        Ok(report)
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    fn entry_for(&self, event: &NormalizedEvent) -> RemoteCalendarEntry {
        RemoteCalendarEntry::from_event(event, self.config.timezone.name())
            .with_reminders(self.config.reminders.clone())
    }

    async fn dispatch(
        &self,
        events: &[NormalizedEvent],
        client: &dyn RemoteCalendar,
        mut ledger: Option<&mut DedupLedger>,
    ) -> (Vec<ItemReport>, bool) {
        let mut pacer = Pacer::new(self.config.min_interval);
        let mut items = Vec::with_capacity(events.len());

        for (index, event) in events.iter().enumerate() {
            if self.is_shutdown() {
                info!(
                    dispatched = index,
                    remaining = events.len() - index,
                    "shutdown requested, stopping sync"
                );
                return (items, true);
            }

            let outcome = match ledger.as_deref_mut() {
                Some(ledger) => {
                    self.push_deduplicated(event, client, ledger, &mut pacer)
                        .await
                }
                None => self.push(event, client, &mut pacer).await,
            };
            log_outcome(event, &outcome);

            items.push(ItemReport {
                summary: event.summary.clone(),
                start: event.start_instant,
                outcome,
            });
        }

        (items, false)
    }

    async fn push(
        &self,
        event: &NormalizedEvent,
        client: &dyn RemoteCalendar,
        pacer: &mut Pacer,
    ) -> SyncOutcome {
        let entry = self.entry_for(event);
        pacer.wait().await;
        match client.insert_event(&entry).await {
            Ok(id) => SyncOutcome::Created(id),
            Err(e) => SyncOutcome::Failed(e.to_string()),
        }
    }

    async fn push_deduplicated(
        &self,
        event: &NormalizedEvent,
        client: &dyn RemoteCalendar,
        ledger: &mut DedupLedger,
        pacer: &mut Pacer,
    ) -> SyncOutcome {
        let key = dedup_key(event);
        if ledger.contains(&key) {
            return SyncOutcome::Skipped(key);
        }

        let entry = self.entry_for(event).with_id(&key);
        pacer.wait().await;
        let outcome = match client.insert_event(&entry).await {
            Ok(id) => SyncOutcome::Created(id),
            Err(e) if e.is_conflict() => {
                debug!(summary = %event.summary, key = %key, "entry exists remotely, updating");
                pacer.wait().await;
                match client.update_event(&key, &entry).await {
                    Ok(id) => SyncOutcome::Updated(id),
                    Err(e) => SyncOutcome::Failed(e.to_string()),
                }
            }
            Err(e) => SyncOutcome::Failed(e.to_string()),
        };

        if let Some(id) = outcome.remote_id() {
            ledger.record(key, id.as_str(), event);
        }
        outcome
    }
}

fn log_outcome(event: &NormalizedEvent, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Created(id) => info!(summary = %event.summary, id = %id, "created entry"),
        SyncOutcome::Updated(id) => info!(summary = %event.summary, id = %id, "updated entry"),
        SyncOutcome::Skipped(key) => {
            debug!(summary = %event.summary, key = %key, "already synced, skipping")
        }
        SyncOutcome::Failed(reason) => {
            warn!(summary = %event.summary, reason = %reason, "failed to sync entry")
        }
    }
}
