//! Calendar sync engine.
//!
//! This crate pushes normalized due-date events to a remote calendar:
//! - Sequential dispatch in input order with a minimum call spacing
//! - Per-entry outcomes collected into a [`SyncReport`]
//! - Optional cross-run dedup through a content-addressed ledger
//! - Optional bounded retry as a calendar wrapper
//! - Cooperative shutdown between entries

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod report;
pub mod retry;
pub mod signals;

pub use config::{DEFAULT_LOOK_AHEAD_DAYS, DEFAULT_MIN_INTERVAL, DedupConfig, SyncConfig};
pub use engine::{SyncEngine, filter_window};
pub use error::{SyncError, SyncResult};
pub use ledger::{DedupLedger, LedgerEntry, dedup_key};
pub use report::{ItemReport, SyncOutcome, SyncReport};
pub use retry::{RetryPolicy, RetryingCalendar};
pub use signals::ShutdownHandle;
