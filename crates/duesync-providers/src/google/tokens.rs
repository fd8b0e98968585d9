//! OAuth token file handling.
//!
//! The consent flow that produces the token file runs outside duesync.
//! [`TokenStorage`] reads that file, understands the layouts written by the
//! common Google client libraries, and writes refreshed tokens back
//! atomically with owner-only permissions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An OAuth token set.
///
/// Reads the canonical layout as well as the Python client's (`token`,
/// `expiry`) and the Node client's (`expiry_date` in milliseconds, `scope` as
/// a space-separated string).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The access token for API requests.
    #[serde(alias = "token")]
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// When the access token expires.
    #[serde(default, alias = "expiry")]
    pub expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes that were granted.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Client id embedded by some token writers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret embedded by some token writers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// When the tokens were last refreshed.
    #[serde(default = "Utc::now")]
    pub last_refresh: DateTime<Utc>,

    #[serde(default, skip_serializing)]
    expiry_date: Option<i64>,

    #[serde(default, skip_serializing)]
    scope: Option<String>,
}

impl TokenInfo {
    /// Creates a token set from OAuth response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
            client_id: None,
            client_secret: None,
            last_refresh: Utc::now(),
            expiry_date: None,
            scope: None,
        }
    }

    /// Folds the alternate field layouts into the canonical fields.
    fn canonicalize(mut self) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self
                .expiry_date
                .take()
                .and_then(DateTime::from_timestamp_millis);
        }
        if let Some(scope) = self.scope.take() {
            for s in scope.split_whitespace() {
                if !self.scopes.iter().any(|existing| existing == s) {
                    self.scopes.push(s.to_string());
                }
            }
        }
        self
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the access token is expired at `now`, with a margin.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_MARGIN_SECS) >= expires_at,
            None => false,
        }
    }

    /// Returns true if the token was granted `scope`.
    ///
    /// A token file without recorded scopes is trusted.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.is_empty() || self.scopes.iter().any(|s| s == scope)
    }

    /// Updates the access token after a refresh.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_from_now);
        self.last_refresh = Utc::now();
    }
}

fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs)
}

/// File-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    /// Creates storage for the token file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads tokens from disk.
    ///
    /// Returns `Ok(None)` when no token file exists.
    pub fn load(&self) -> ProviderResult<Option<TokenInfo>> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file {:?}", self.path))
                .with_source(e)
        })?;

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse token file {:?}", self.path))
                .with_source(e)
        })?;

        debug!("loaded tokens from {:?}", self.path);
        Ok(Some(tokens.canonicalize()))
    }

    /// Writes tokens to disk via a temp file and rename.
    pub fn save(&self, tokens: &TokenInfo) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration("failed to create token directory").with_source(e)
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(tokens).map_err(|e| {
            ProviderError::internal("failed to serialize tokens").with_source(e)
        })?;

        fs::write(&temp_path, &content).map_err(|e| {
            ProviderError::configuration("failed to write token file").with_source(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&temp_path, perms);
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration("failed to rename token file").with_source(e)
        })?;

        info!("saved tokens to {:?}", self.path);
        Ok(())
    }
}
