//! `duesync sync`: push due dates to Google Calendar.

use std::path::Path;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use duesync_core::NormalizedEvent;
use duesync_engine::{
    RetryingCalendar, ShutdownHandle, SyncEngine, SyncError, SyncReport, filter_window,
};
use duesync_providers::google::GoogleAuthorizer;
use duesync_providers::{EventNormalizer, ProviderError, ProviderErrorCode};
use tracing::info;

use crate::cli::SyncArgs;
use crate::commands::normalize;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Reads a `duesync normalize` output file.
pub async fn load_normalized(path: &Path) -> ClientResult<Vec<NormalizedEvent>> {
    let content = tokio::fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content)
        .map_err(|e| ClientError::Input(format!("{}: {}", path.display(), e)))
}

/// Loads the events to sync, normalizing raw input on the fly.
pub async fn load_events(
    config: &ClientConfig,
    args: &SyncArgs,
    now: DateTime<Utc>,
) -> ClientResult<Vec<NormalizedEvent>> {
    if args.normalized {
        return load_normalized(&args.input).await;
    }
    let normalizer_config = config.normalizer_config().map_err(ClientError::Config)?;
    let raws = normalize::load_raw(&args.input).await?;
    Ok(normalize::normalize_raw(
        &EventNormalizer::new(normalizer_config),
        &raws,
        now,
    ))
}

/// Renders the dry-run listing.
pub fn plan(events: &[NormalizedEvent], tz: Tz) -> String {
    let mut out = String::new();
    for event in events {
        out.push_str(&format!(
            "{}  {}  [{}]\n",
            event.start_instant.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z"),
            event.summary,
            event.color_tag
        ));
    }
    out.push_str(&format!("{} event(s) would be synced", events.len()));
    out
}

/// Maps a finished report to the command result.
pub fn finish(report: &SyncReport) -> ClientResult<()> {
    if report.has_failures() {
        Err(ClientError::ItemsFailed(report.failed()))
    } else if let Some(ref err) = report.ledger_error {
        Err(ClientError::LedgerNotSaved(err.clone()))
    } else if report.cancelled {
        Err(ClientError::Cancelled)
    } else {
        Ok(())
    }
}

fn authorization_error(err: ProviderError) -> ClientError {
    match err.code() {
        ProviderErrorCode::AuthenticationFailed | ProviderErrorCode::AuthorizationFailed => {
            ClientError::Sync(SyncError::from(err))
        }
        _ => ClientError::Provider(err),
    }
}

/// Loads, filters and pushes events, then prints the run summary.
pub async fn run(config: &ClientConfig, args: SyncArgs) -> ClientResult<()> {
    let mut sync_config = config.sync_config().map_err(ClientError::Config)?;
    if let Some(days) = args.look_ahead_days {
        sync_config.look_ahead_days = days;
    }
    let now = args.now.unwrap_or_else(Utc::now);

    let events = load_events(config, &args, now).await?;
    let events = filter_window(events, now, sync_config.look_ahead_days);

    if args.dry_run {
        println!("{}", plan(&events, sync_config.timezone));
        return Ok(());
    }

    let google = config
        .google_settings()
        .to_provider_config()
        .map_err(ClientError::Config)?;
    let client = GoogleAuthorizer::new(google)
        .authorize()
        .await
        .map_err(authorization_error)?;

    let shutdown = ShutdownHandle::new();
    shutdown.spawn_signal_listener();

    let retry = sync_config.retry.clone();
    let engine = SyncEngine::new(sync_config).with_shutdown(shutdown.subscribe());
    info!(events = events.len(), retry = retry.is_enabled(), "syncing to Google Calendar");

    let report = if retry.is_enabled() {
        let client = RetryingCalendar::new(client, retry);
        engine.run(&events, &client).await?
    } else {
        engine.run(&events, &client).await?
    };

    println!("{}", report);
    finish(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use duesync_core::ColorTag;
    use duesync_engine::{ItemReport, SyncOutcome};
    use duesync_providers::RemoteId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 18, 0, 0).unwrap()
    }

    fn event(title: &str) -> NormalizedEvent {
        NormalizedEvent::new(
            title,
            "CS 1337",
            "",
            Utc.with_ymd_and_hms(2025, 2, 11, 5, 59, 0).unwrap(),
            ColorTag::Blue,
        )
    }

    fn args(input: &Path, normalized: bool) -> SyncArgs {
        SyncArgs {
            input: input.to_path_buf(),
            normalized,
            dry_run: true,
            look_ahead_days: None,
            now: Some(now()),
        }
    }

    #[tokio::test]
    async fn loads_normalized_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normalized.json");
        std::fs::write(&path, serde_json::to_string(&[event("HW 1")]).unwrap()).unwrap();

        let events = load_events(&ClientConfig::default(), &args(&path, true), now())
            .await
            .unwrap();
        assert_eq!(events, vec![event("HW 1")]);
    }

    #[tokio::test]
    async fn loads_and_normalizes_raw_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        std::fs::write(
            &path,
            r#"[{"title": "HW 1", "courseHint": "CS 1337", "dateText": "Feb 10, 2025"}]"#,
        )
        .unwrap();

        let events = load_events(&ClientConfig::default(), &args(&path, false), now())
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "CS 1337 - HW 1");
    }

    #[tokio::test]
    async fn malformed_normalized_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normalized.json");
        std::fs::write(&path, r#"[{"summary": 3}]"#).unwrap();

        let err = load_normalized(&path).await.unwrap_err();
        assert!(matches!(err, ClientError::Input(_)));
    }

    #[tokio::test]
    async fn dry_run_needs_no_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normalized.json");
        std::fs::write(&path, "[]").unwrap();

        run(&ClientConfig::default(), args(&path, true)).await.unwrap();
    }

    #[test]
    fn plan_lists_local_times() {
        let text = plan(&[event("HW 1")], chrono_tz::America::Chicago);
        assert_eq!(
            text,
            "2025-02-10 23:59 CST  CS 1337 - HW 1  [blue]\n1 event(s) would be synced"
        );
    }

    #[test]
    fn failures_and_cancellation_exit_non_zero() {
        let ok = ItemReport {
            summary: "a".to_string(),
            start: now(),
            outcome: SyncOutcome::Created(RemoteId::new("x")),
        };
        let failed = ItemReport {
            outcome: SyncOutcome::Failed("quota".to_string()),
            ..ok.clone()
        };

        let clean = SyncReport {
            items: vec![ok.clone()],
            ..Default::default()
        };
        assert!(finish(&clean).is_ok());

        let with_failure = SyncReport {
            items: vec![ok.clone(), failed],
            ..Default::default()
        };
        assert!(matches!(finish(&with_failure), Err(ClientError::ItemsFailed(1))));

        let unsaved = SyncReport {
            items: vec![ok.clone()],
            ledger_error: Some("ledger error at /x: failed to write".to_string()),
            ..Default::default()
        };
        assert!(matches!(finish(&unsaved), Err(ClientError::LedgerNotSaved(_))));

        let cancelled = SyncReport {
            items: vec![ok],
            cancelled: true,
            ..Default::default()
        };
        assert!(matches!(finish(&cancelled), Err(ClientError::Cancelled)));
    }

    #[test]
    fn auth_failures_become_auth_missing() {
        let err = authorization_error(
            ProviderError::authentication("no token").with_provider("google"),
        );
        assert!(matches!(err, ClientError::Sync(SyncError::AuthMissing { .. })));

        let err = authorization_error(ProviderError::network("timed out"));
        assert!(matches!(err, ClientError::Provider(_)));
    }
}
