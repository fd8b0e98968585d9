//! Sync engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::retry::RetryPolicy;

/// Default floor between the starts of two remote calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(200);

/// Default look-ahead window in days.
pub const DEFAULT_LOOK_AHEAD_DAYS: u32 = 30;

/// Google accepts at most this many reminder overrides per entry.
pub const MAX_REMINDERS: usize = 5;

/// Google rejects reminder offsets beyond four weeks.
pub const MAX_REMINDER_MINUTES: u32 = 40_320;

/// Cross-run duplicate suppression settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupConfig {
    /// Whether the ledger is consulted and written.
    pub enabled: bool,
    /// Where the ledger is persisted.
    pub ledger_path: PathBuf,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ledger_path: default_ledger_path(),
        }
    }
}

impl DedupConfig {
    /// Creates an enabled dedup config persisting to `path`.
    pub fn enabled_at(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            ledger_path: path.into(),
        }
    }
}

/// Returns the default ledger path, `~/.local/share/duesync/ledger.json`.
pub fn default_ledger_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".local").join("share"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("duesync")
        .join("ledger.json")
}

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Minimum spacing between the starts of successive remote calls.
    pub min_interval: Duration,

    /// Zone name attached to every entry.
    pub timezone: Tz,

    /// Popup reminder offsets in minutes; empty keeps calendar defaults.
    pub reminders: Vec<u32>,

    /// Days ahead of now that are synced; 0 removes the upper bound.
    pub look_ahead_days: u32,

    /// Cross-run duplicate suppression.
    pub dedup: DedupConfig,

    /// Retry policy for the calendar client wrapper.
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            timezone: chrono_tz::America::Chicago,
            reminders: Vec::new(),
            look_ahead_days: DEFAULT_LOOK_AHEAD_DAYS,
            dedup: DedupConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Builder: set the minimum call spacing.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Builder: set the entry zone.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Builder: set reminder overrides.
    pub fn with_reminders(mut self, minutes: Vec<u32>) -> Self {
        self.reminders = minutes;
        self
    }

    /// Builder: set the look-ahead window.
    pub fn with_look_ahead_days(mut self, days: u32) -> Self {
        self.look_ahead_days = days;
        self
    }

    /// Builder: set dedup settings.
    pub fn with_dedup(mut self, dedup: DedupConfig) -> Self {
        self.dedup = dedup;
        self
    }

    /// Builder: set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Checks the values the remote calendar would reject.
    pub fn validate(&self) -> Result<(), String> {
        if self.reminders.len() > MAX_REMINDERS {
            return Err(format!(
                "at most {} reminders are allowed, got {}",
                MAX_REMINDERS,
                self.reminders.len()
            ));
        }
        if let Some(bad) = self.reminders.iter().find(|&&m| m > MAX_REMINDER_MINUTES) {
            return Err(format!(
                "reminder of {} minutes exceeds the {} minute maximum",
                bad, MAX_REMINDER_MINUTES
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err("retry max_attempts must be at least 1".to_string());
        }
        if self.dedup.enabled && self.dedup.ledger_path.as_os_str().is_empty() {
            return Err("dedup ledger_path must not be empty".to_string());
        }
        Ok(())
    }
}
