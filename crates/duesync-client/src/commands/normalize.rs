//! `duesync normalize`: raw scraper records to a normalized events file.

use std::path::Path;

use chrono::{DateTime, Utc};
use duesync_core::{NormalizeWarning, NormalizedEvent};
use duesync_providers::{EventNormalizer, JsonFileSource, RawEvent, RawEventSource};
use tracing::info;

use crate::cli::NormalizeArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Reads the raw events hand-off file.
pub async fn load_raw(path: &Path) -> ClientResult<Vec<RawEvent>> {
    Ok(JsonFileSource::new(path).extract().await?)
}

/// Normalizes every record in order, tallying warnings for the log.
pub fn normalize_raw(
    normalizer: &EventNormalizer,
    raws: &[RawEvent],
    now: DateTime<Utc>,
) -> Vec<NormalizedEvent> {
    let mut degraded = 0;
    let mut unresolved = 0;

    let events: Vec<_> = raws
        .iter()
        .map(|raw| {
            let (event, warnings) = normalizer.normalize_with_warnings(raw, now);
            for warning in &warnings {
                match warning {
                    NormalizeWarning::ParseDegraded { .. } => degraded += 1,
                    NormalizeWarning::ResolutionUnknown { .. } => unresolved += 1,
                }
            }
            event
        })
        .collect();

    info!(events = events.len(), degraded, unresolved, "normalized raw events");
    events
}

/// Reads `args.input`, normalizes it and writes JSON to `args.output` or stdout.
pub async fn run(config: &ClientConfig, args: NormalizeArgs) -> ClientResult<()> {
    let normalizer_config = config.normalizer_config().map_err(ClientError::Config)?;
    let normalizer = EventNormalizer::new(normalizer_config);
    let raws = load_raw(&args.input).await?;
    let events = normalize_raw(&normalizer, &raws, args.now.unwrap_or_else(Utc::now));

    let json = serde_json::to_string_pretty(&events)
        .map_err(|e| ClientError::Input(format!("failed to serialize events: {}", e)))?;

    match args.output {
        Some(ref path) => {
            tokio::fs::write(path, format!("{}\n", json)).await?;
            info!(path = %path.display(), count = events.len(), "wrote normalized events");
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 18, 0, 0).unwrap()
    }

    #[test]
    fn normalized_artifact_shape() {
        let raws = vec![
            RawEvent::new("Homework 3", "Feb 10, 2025")
                .with_course_hint("CS 1337")
                .with_time_text("2:30 PM"),
            RawEvent::new("Reading <b>quiz</b>", "Feb 12")
                .with_course_hint("_48213_1")
                .with_description("Covers chapter 4\nMATH 2417"),
        ];

        let events = normalize_raw(&EventNormalizer::default(), &raws, now());

        insta::assert_json_snapshot!(events, @r#"
        [
          {
            "summary": "CS 1337 - Homework 3",
            "description": "Homework 3\nCourse: CS 1337",
            "courseCode": "CS 1337",
            "title": "Homework 3",
            "startInstant": "2025-02-10T20:30:00Z",
            "durationMinutes": 60,
            "colorTag": "blue"
          },
          {
            "summary": "MATH 2417 - Reading quiz",
            "description": "Covers chapter 4\nMATH 2417",
            "courseCode": "MATH 2417",
            "title": "Reading quiz",
            "startInstant": "2025-02-13T05:59:00Z",
            "durationMinutes": 60,
            "colorTag": "yellow"
          }
        ]
        "#);
    }

    #[tokio::test]
    async fn run_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.json");
        let output = dir.path().join("normalized.json");
        std::fs::write(
            &input,
            r#"[{"title": "Lab 2", "courseName": "PHYS 2325", "dateStr": "Feb 14, 2025", "timeStr": ""}]"#,
        )
        .unwrap();

        let args = NormalizeArgs {
            input,
            output: Some(output.clone()),
            now: Some(now()),
        };
        run(&ClientConfig::default(), args).await.unwrap();

        let written: Vec<NormalizedEvent> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].summary, "PHYS 2325 - Lab 2");
        assert_eq!(
            written[0].start_instant,
            Utc.with_ymd_and_hms(2025, 2, 15, 5, 59, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_raw(&dir.path().join("missing.json")).await.unwrap_err();
        assert!(matches!(err, ClientError::Provider(_)));
    }
}
