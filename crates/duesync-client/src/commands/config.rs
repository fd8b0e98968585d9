//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Renders the configuration as TOML with plain-text secrets masked.
pub fn render(config: &ClientConfig) -> ClientResult<String> {
    let mut shown = config.clone();
    if let Some(ref mut google) = shown.google
        && let Some(ref value) = google.client_secret
    {
        google.client_secret = Some(secret::redact(value));
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))
}

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    println!("# config.toml ({})", path.display());
    println!("{}", render(config)?);
    Ok(())
}

/// Checks every section, resolving secret references.
pub fn check(config: &ClientConfig) -> ClientResult<()> {
    config.sync_config().map_err(ClientError::Config)?;
    config.normalizer_config().map_err(ClientError::Config)?;
    if config.google.is_some() {
        config
            .google_settings()
            .to_provider_config()
            .map_err(|e| ClientError::Config(format!("[google]: {}", e)))?;
    }
    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    check(config)?;
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleSettings;

    #[test]
    fn render_masks_plain_secret() {
        let config = ClientConfig {
            google: Some(GoogleSettings {
                client_id: Some("id.apps.googleusercontent.com".to_string()),
                client_secret: Some("GOCSPX-plain".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = render(&config).unwrap();
        assert!(text.contains("<redacted>"));
        assert!(!text.contains("GOCSPX-plain"));
        assert!(text.contains("id.apps.googleusercontent.com"));
    }

    #[test]
    fn render_keeps_secret_references() {
        let config = ClientConfig {
            google: Some(GoogleSettings {
                client_secret: Some("pass::google/duesync".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(render(&config).unwrap().contains("pass::google/duesync"));
    }

    #[test]
    fn check_defaults() {
        assert!(check(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn check_reports_bad_section() {
        let config: ClientConfig = toml::from_str("[google]\ncalendar_id = \" \"\n").unwrap();
        let err = check(&config).unwrap_err();
        assert!(err.to_string().contains("[google]"));
    }
}
