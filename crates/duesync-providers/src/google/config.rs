//! Google Calendar configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// OAuth 2.0 client credentials.
///
/// Needed only to refresh an expired access token; the consent flow that
/// produced the token file runs outside duesync.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

/// Structure of Google's OAuth client JSON file (`credentials.json`).
///
/// Accepts the Cloud Console layout with an "installed" or "web" section,
/// and the flat layout with `client_id`/`client_secret` at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a Google Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read credentials file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parses credentials from a Google credentials JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err("credentials file must contain 'installed'/'web' section or 'client_id'/'client_secret' at root level".to_string())
    }

    /// Checks that both values are present and the id looks like a Google client id.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Settings for writing to Google Calendar.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Client credentials used for token refresh, if configured.
    pub credentials: Option<OAuthCredentials>,

    /// Token file written by the consent flow.
    ///
    /// Defaults to `~/.local/share/duesync/google-token.json`.
    pub token_path: PathBuf,

    /// Calendar entries are written to. Defaults to `"primary"`.
    pub calendar_id: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Scope the stored token must carry.
    pub scope: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            token_path: Self::default_token_path(),
            calendar_id: Self::DEFAULT_CALENDAR_ID.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            scope: Self::DEFAULT_SCOPE.to_string(),
        }
    }
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Read/write calendar scope.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar";

    /// Default target calendar.
    pub const DEFAULT_CALENDAR_ID: &'static str = "primary";

    /// Returns the default token storage path.
    pub fn default_token_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".local").join("share"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("duesync")
            .join("google-token.json")
    }

    /// Sets the client credentials.
    pub fn with_credentials(mut self, credentials: OAuthCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the token storage path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the target calendar.
    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref credentials) = self.credentials {
            credentials
                .validate()
                .map_err(|e| format!("invalid credentials: {}", e))?;
        }

        if self.calendar_id.trim().is_empty() {
            return Err("calendar_id must not be empty".to_string());
        }

        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> OAuthCredentials {
        OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret")
    }

    #[test]
    fn credentials_validation() {
        assert!(test_credentials().validate().is_ok());
        assert!(OAuthCredentials::new("", "secret").validate().is_err());
        assert!(OAuthCredentials::new("bad-id", "secret").validate().is_err());
        assert!(
            OAuthCredentials::new("test.apps.googleusercontent.com", "")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn config_defaults() {
        let config = GoogleConfig::default();
        assert!(config.credentials.is_none());
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.scope, "https://www.googleapis.com/auth/calendar");
        assert!(config.token_path.ends_with("duesync/google-token.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_validation() {
        let config = GoogleConfig::default()
            .with_credentials(test_credentials())
            .with_calendar_id("school@group.calendar.google.com");
        assert!(config.validate().is_ok());

        let blank_calendar = GoogleConfig::default().with_calendar_id("  ");
        assert!(blank_calendar.validate().is_err());

        let zero_timeout = GoogleConfig::default().with_timeout(Duration::ZERO);
        assert!(zero_timeout.validate().is_err());

        let bad_credentials =
            GoogleConfig::default().with_credentials(OAuthCredentials::new("nope", "s"));
        assert!(bad_credentials.validate().unwrap_err().contains("client_id"));
    }

    #[test]
    fn credentials_from_json_installed() {
        let json = r#"{
            "installed": {
                "client_id": "test-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "project_id": "my-project"
            }
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn credentials_from_json_flat() {
        let json = r#"{
            "client_id": "flat-id.apps.googleusercontent.com",
            "client_secret": "flat-secret",
            "refresh_token": "some-refresh-token"
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "flat-id.apps.googleusercontent.com");
    }

    #[test]
    fn credentials_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"web": {"client_id": "w.apps.googleusercontent.com", "client_secret": "s"}}"#,
        )
        .unwrap();
        let creds = OAuthCredentials::from_file(&path).unwrap();
        assert_eq!(creds.client_secret, "s");

        assert!(OAuthCredentials::from_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn credentials_from_json_invalid() {
        assert!(
            OAuthCredentials::from_json(r#"{ "other": {} }"#)
                .unwrap_err()
                .contains("client_id")
        );
        assert!(OAuthCredentials::from_json("not json").unwrap_err().contains("parse"));
    }
}
