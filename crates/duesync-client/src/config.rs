//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/duesync/config.toml` by default.
//!
//! Credential values (`client_id`, `client_secret`) support secret references:
//! - `pass::path/in/store`: resolved via `pass show`
//! - `env::VAR_NAME`: resolved from the environment
//! - plain text: used as-is

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use duesync_core::{ColorTable, ColorTag};
use duesync_engine::{DedupConfig, RetryPolicy, SyncConfig};
use duesync_providers::NormalizerConfig;
use duesync_providers::google::{GoogleConfig, OAuthCredentials};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the duesync client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google Calendar settings.
    pub google: Option<GoogleSettings>,

    /// Normalization and sync settings.
    pub sync: SyncSettings,

    /// Cross-run duplicate suppression.
    pub dedup: DedupSettings,
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if absent.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("duesync")
    }

    /// Returns the Google settings, or defaults if the section is absent.
    pub fn google_settings(&self) -> GoogleSettings {
        self.google.clone().unwrap_or_default()
    }

    /// Builds the engine configuration from `[sync]` and `[dedup]`.
    pub fn sync_config(&self) -> Result<SyncConfig, String> {
        let config = SyncConfig::default()
            .with_min_interval(Duration::from_millis(self.sync.min_interval_ms))
            .with_timezone(self.sync.timezone()?)
            .with_reminders(self.sync.reminders.clone())
            .with_look_ahead_days(self.sync.look_ahead_days)
            .with_dedup(self.dedup.to_dedup_config())
            .with_retry(RetryPolicy::new(self.sync.max_attempts));
        config.validate()?;
        Ok(config)
    }

    /// Builds the normalizer configuration from `[sync]`.
    pub fn normalizer_config(&self) -> Result<NormalizerConfig, String> {
        Ok(NormalizerConfig::default()
            .with_timezone(self.sync.timezone()?)
            .with_colors(self.sync.color_table()))
    }
}

// ---------------------------------------------------------------------------
// SyncSettings
// ---------------------------------------------------------------------------

/// Normalization and sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// IANA zone used to interpret scraped dates and label entries.
    pub timezone: String,

    /// Minimum spacing between remote calls, in milliseconds.
    pub min_interval_ms: u64,

    /// Days ahead of now to sync; 0 means no upper bound.
    pub look_ahead_days: u32,

    /// Popup reminder offsets in minutes.
    pub reminders: Vec<u32>,

    /// Attempts per remote call; 1 disables retry.
    pub max_attempts: u32,

    /// Course prefix to color overrides, merged over the built-in table.
    pub colors: BTreeMap<String, ColorTag>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            min_interval_ms: 200,
            look_ahead_days: duesync_engine::DEFAULT_LOOK_AHEAD_DAYS,
            reminders: Vec::new(),
            max_attempts: 1,
            colors: BTreeMap::new(),
        }
    }
}

impl SyncSettings {
    /// Parses the configured zone name.
    pub fn timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| format!("unknown timezone: {}", self.timezone))
    }

    /// Returns the built-in color table with overrides applied.
    pub fn color_table(&self) -> ColorTable {
        self.colors
            .iter()
            .fold(ColorTable::default(), |table, (prefix, color)| {
                table.with_entry(prefix.to_ascii_uppercase(), *color)
            })
    }
}

// ---------------------------------------------------------------------------
// DedupSettings
// ---------------------------------------------------------------------------

/// Dedup ledger settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    /// Whether entries already pushed in earlier runs are skipped.
    pub enabled: bool,

    /// Ledger location; defaults to `~/.local/share/duesync/ledger.json`.
    pub ledger_path: Option<PathBuf>,
}

impl DedupSettings {
    fn to_dedup_config(&self) -> DedupConfig {
        let defaults = DedupConfig::default();
        DedupConfig {
            enabled: self.enabled,
            ledger_path: self.ledger_path.clone().unwrap_or(defaults.ledger_path),
        }
    }
}

// ---------------------------------------------------------------------------
// GoogleSettings (in config.toml, including credentials)
// ---------------------------------------------------------------------------

/// Google Calendar settings.
///
/// Credentials are only needed to refresh an expired access token. They
/// can be given inline (with secret references), through a Cloud Console
/// credentials file, or be embedded in the token file itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Cloud Console credentials JSON, used when the inline fields are unset.
    pub credentials_file: Option<PathBuf>,

    /// Target calendar.
    pub calendar_id: String,

    /// Token file written by the consent flow.
    pub token_path: Option<PathBuf>,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            credentials_file: None,
            calendar_id: GoogleConfig::DEFAULT_CALENDAR_ID.to_string(),
            token_path: None,
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GoogleSettings {
    /// Converts to provider configuration.
    ///
    /// Resolves credentials (expanding `pass::` / `env::` references) and
    /// builds a `GoogleConfig` suitable for the authorizer.
    pub fn to_provider_config(&self) -> Result<GoogleConfig, String> {
        let mut config = GoogleConfig::default()
            .with_calendar_id(&self.calendar_id)
            .with_timeout(Duration::from_secs(self.timeout_secs));

        if let Some(credentials) = self.resolve_credentials()? {
            config = config.with_credentials(credentials);
        }
        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolves OAuth credentials, if any are configured.
    ///
    /// Inline fields win over `credentials_file`. Setting only one of
    /// `client_id` and `client_secret` is an error.
    pub(crate) fn resolve_credentials(&self) -> Result<Option<OAuthCredentials>, String> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(raw_id), Some(raw_secret)) => {
                let id = crate::secret::resolve(raw_id)
                    .map_err(|e| format!("failed to resolve client_id: {}", e))?;
                let secret = crate::secret::resolve(raw_secret)
                    .map_err(|e| format!("failed to resolve client_secret: {}", e))?;
                let credentials = OAuthCredentials::new(id, secret);
                credentials
                    .validate()
                    .map_err(|e| format!("invalid Google credentials: {}", e))?;
                Ok(Some(credentials))
            }
            (Some(_), None) => {
                Err("client_secret is missing from [google] section in config.toml".to_string())
            }
            (None, Some(_)) => {
                Err("client_id is missing from [google] section in config.toml".to_string())
            }
            (None, None) => match self.credentials_file {
                Some(ref path) => OAuthCredentials::from_file(path).map(Some),
                None => Ok(None),
            },
        }
    }
}
