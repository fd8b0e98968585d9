//! Local record of entries already pushed to the remote calendar.
//!
//! Keys are content addressed: SHA-256 over the summary, the start instant
//! and the course code. The hex digest also serves as the remote event id,
//! so a lost ledger still cannot create duplicates on the remote side.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use duesync_core::NormalizedEvent;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

const LEDGER_VERSION: u32 = 1;

/// Computes the dedup key of an event.
///
/// Lowercase hex only uses `0-9a-f`, which is a subset of the base32hex
/// alphabet Google accepts for event ids.
pub fn dedup_key(event: &NormalizedEvent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(event.summary.as_bytes());
    hasher.update([0x1f]);
    hasher.update(
        event
            .start_instant
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .as_bytes(),
    );
    hasher.update([0x1f]);
    hasher.update(event.course_code.as_bytes());

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// A recorded entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub remote_id: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, LedgerEntry>,
}

/// JSON-backed set of dedup keys.
#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
    dirty: bool,
}

impl DedupLedger {
    /// Loads the ledger at `path`; a missing file yields an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> SyncResult<Self> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "no ledger yet");
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
                dirty: false,
            });
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| SyncError::ledger(&path, format!("failed to read: {}", e)))?;
        let file: LedgerFile = serde_json::from_str(&content)
            .map_err(|e| SyncError::ledger(&path, format!("failed to parse: {}", e)))?;
        if file.version != LEDGER_VERSION {
            return Err(SyncError::ledger(
                &path,
                format!("unsupported ledger version {}", file.version),
            ));
        }

        debug!(path = %path.display(), entries = file.entries.len(), "loaded ledger");
        Ok(Self {
            path,
            entries: file.entries,
            dirty: false,
        })
    }

    /// Returns the ledger path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `key` has been recorded.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the entry recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    /// Records a created or updated entry.
    pub fn record(&mut self, key: impl Into<String>, remote_id: &str, event: &NormalizedEvent) {
        self.entries.insert(
            key.into(),
            LedgerEntry {
                remote_id: remote_id.to_string(),
                summary: event.summary.clone(),
                start: event.start_instant,
                recorded_at: Utc::now(),
            },
        );
        self.dirty = true;
    }

    /// Writes the ledger if anything was recorded since loading.
    pub fn save(&mut self) -> SyncResult<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                SyncError::ledger(&self.path, format!("failed to create directory: {}", e))
            })?;
        }

        let file = LedgerFile {
            version: LEDGER_VERSION,
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .map_err(|e| SyncError::ledger(&self.path, format!("failed to write: {}", e)))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| SyncError::ledger(&self.path, format!("failed to rename: {}", e)))?;

        self.dirty = false;
        info!(path = %self.path.display(), entries = self.entries.len(), "saved ledger");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use duesync_core::ColorTag;

    fn event(title: &str) -> NormalizedEvent {
        NormalizedEvent::new(
            title,
            "CS 1337",
            "",
            Utc.with_ymd_and_hms(2025, 2, 11, 5, 59, 0).unwrap(),
            ColorTag::Blue,
        )
    }

    #[test]
    fn key_is_stable_hex() {
        let key = dedup_key(&event("Homework 3"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(key, dedup_key(&event("Homework 3")));
    }

    #[test]
    fn key_depends_on_content() {
        let base = event("Homework 3");
        let mut later = base.clone();
        later.start_instant += chrono::Duration::minutes(1);
        let mut other_course = base.clone();
        other_course.course_code = "CS 2336".to_string();

        assert_ne!(dedup_key(&base), dedup_key(&event("Homework 4")));
        assert_ne!(dedup_key(&base), dedup_key(&later));
        assert_ne!(dedup_key(&base), dedup_key(&other_course));
    }

    #[test]
    fn key_ignores_description_and_color() {
        let base = event("Homework 3");
        let mut restyled = base.clone();
        restyled.description = "changed".to_string();
        restyled.color_tag = ColorTag::Orange;
        assert_eq!(dedup_key(&base), dedup_key(&restyled));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DedupLedger::load(dir.path().join("ledger.json")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn record_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("ledger.json");
        let ev = event("Homework 3");
        let key = dedup_key(&ev);

        let mut ledger = DedupLedger::load(&path).unwrap();
        ledger.record(key.clone(), &key, &ev);
        ledger.save().unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = DedupLedger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains(&key));
        let entry = reloaded.get(&key).unwrap();
        assert_eq!(entry.summary, "CS 1337 - Homework 3");
        assert_eq!(entry.remote_id, key);
    }

    #[test]
    fn save_without_changes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut ledger = DedupLedger::load(&path).unwrap();
        ledger.save().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "[1, 2").unwrap();
        let err = DedupLedger::load(&path).unwrap_err();
        assert!(matches!(err, SyncError::Ledger { .. }));
    }

    #[test]
    fn unknown_version_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, r#"{"version": 9, "entries": {}}"#).unwrap();
        let err = DedupLedger::load(&path).unwrap_err();
        assert!(err.to_string().contains("version 9"));
    }
}
