//! Event types for normalized due-date entries.
//!
//! This module provides the value types produced by the normalization stage:
//! - [`NormalizedEvent`]: A fully resolved due-date entry ready for sync
//! - [`ColorTag`]: The course color assigned to an entry
//! - [`ColorTable`]: The prefix-to-color mapping used to pick a [`ColorTag`]

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Course code used when no code could be resolved.
pub const UNKNOWN_COURSE: &str = "Unknown";

/// Title used when the scraped title is empty.
pub const UNTITLED: &str = "Untitled";

/// Fixed duration of a due-date entry, in minutes.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// The color assigned to an event, keyed by course prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    Blue,
    Yellow,
    Green,
    Flamingo,
    Orange,
    /// No course-specific color.
    #[default]
    Default,
}

impl ColorTag {
    /// Returns the lowercase name of this color.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Flamingo => "flamingo",
            Self::Orange => "orange",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Ok(Self::Blue),
            "yellow" => Ok(Self::Yellow),
            "green" => Ok(Self::Green),
            "flamingo" => Ok(Self::Flamingo),
            "orange" => Ok(Self::Orange),
            "default" => Ok(Self::Default),
            other => Err(format!("unknown color: {}", other)),
        }
    }
}

/// Maps course-code prefixes to colors.
///
/// A course code is matched by its leading run of uppercase ASCII letters,
/// which must equal a prefix in the table exactly (`"CSE 1325"` has the
/// prefix `"CSE"` and does not match `"CS"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    entries: Vec<(String, ColorTag)>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new(vec![
            ("CS".to_string(), ColorTag::Blue),
            ("MATH".to_string(), ColorTag::Yellow),
            ("PHYS".to_string(), ColorTag::Green),
            ("ENG".to_string(), ColorTag::Flamingo),
            ("HIST".to_string(), ColorTag::Orange),
        ])
    }
}

impl ColorTable {
    /// Creates a table from `(prefix, color)` pairs.
    pub fn new(entries: Vec<(String, ColorTag)>) -> Self {
        Self { entries }
    }

    /// Creates an empty table; every code maps to [`ColorTag::Default`].
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds or replaces the color for a prefix.
    pub fn with_entry(mut self, prefix: impl Into<String>, color: ColorTag) -> Self {
        let prefix = prefix.into();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = color,
            None => self.entries.push((prefix, color)),
        }
        self
    }

    /// Returns the configured `(prefix, color)` pairs.
    pub fn entries(&self) -> &[(String, ColorTag)] {
        &self.entries
    }

    /// Looks up the color for a course code.
    pub fn color_for(&self, course_code: &str) -> ColorTag {
        let prefix = leading_uppercase(course_code);
        if prefix.is_empty() {
            return ColorTag::Default;
        }
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, color)| *color)
            .unwrap_or_default()
    }
}

/// Returns the leading run of uppercase ASCII letters.
fn leading_uppercase(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_uppercase())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

/// A due-date entry after normalization.
///
/// This is the canonical hand-off between the normalization stage and the
/// sync stage, and serializes to the JSON artifact written by `duesync
/// normalize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    /// Entry summary: `"<course> - <title>"`, or the title alone.
    pub summary: String,
    /// Entry description.
    pub description: String,
    /// Resolved course code, [`UNKNOWN_COURSE`] when unresolved.
    pub course_code: String,
    /// The cleaned original title.
    pub title: String,
    /// When the entry starts (due instant).
    pub start_instant: DateTime<Utc>,
    /// Entry length in minutes.
    pub duration_minutes: i64,
    /// Course color.
    pub color_tag: ColorTag,
}

impl NormalizedEvent {
    /// Builds an event from its resolved parts.
    ///
    /// The summary and description are derived here so the rules live in
    /// one place. An empty `course_code` is stored as [`UNKNOWN_COURSE`] and
    /// an empty title as [`UNTITLED`].
    pub fn new(
        title: impl Into<String>,
        course_code: impl Into<String>,
        description: impl Into<String>,
        start_instant: DateTime<Utc>,
        color_tag: ColorTag,
    ) -> Self {
        let mut title = title.into();
        if title.trim().is_empty() {
            title = UNTITLED.to_string();
        }

        let mut course_code = course_code.into();
        if course_code.trim().is_empty() {
            course_code = UNKNOWN_COURSE.to_string();
        }

        let summary = if course_code == UNKNOWN_COURSE {
            title.clone()
        } else {
            format!("{} - {}", course_code, title)
        };

        let mut description = description.into();
        if description.trim().is_empty() {
            description = format!("{}\nCourse: {}", title, course_code);
        }

        Self {
            summary,
            description,
            course_code,
            title,
            start_instant,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            color_tag,
        }
    }

    /// Returns true if the course code was resolved.
    pub fn has_course(&self) -> bool {
        self.course_code != UNKNOWN_COURSE
    }

    /// Returns when the entry ends.
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.start_instant + Duration::minutes(self.duration_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 11, 5, 59, 0).unwrap()
    }

    #[test]
    fn color_table_defaults() {
        let table = ColorTable::default();
        assert_eq!(table.color_for("CS 1337"), ColorTag::Blue);
        assert_eq!(table.color_for("MATH 2417"), ColorTag::Yellow);
        assert_eq!(table.color_for("PHYS 2325"), ColorTag::Green);
        assert_eq!(table.color_for("ENG 1301"), ColorTag::Flamingo);
        assert_eq!(table.color_for("HIST 1301"), ColorTag::Orange);
    }

    #[test]
    fn color_table_unmatched_prefix() {
        let table = ColorTable::default();
        assert_eq!(table.color_for("BIOL 2311"), ColorTag::Default);
        assert_eq!(table.color_for("CSE 1325"), ColorTag::Default);
        assert_eq!(table.color_for(UNKNOWN_COURSE), ColorTag::Default);
        assert_eq!(table.color_for("cs 1337"), ColorTag::Default);
        assert_eq!(table.color_for(""), ColorTag::Default);
    }

    #[test]
    fn color_table_with_entry_overrides() {
        let table = ColorTable::default()
            .with_entry("CS", ColorTag::Orange)
            .with_entry("BIOL", ColorTag::Green);
        assert_eq!(table.color_for("CS 1337"), ColorTag::Orange);
        assert_eq!(table.color_for("BIOL 2311"), ColorTag::Green);
        assert_eq!(table.entries().len(), 6);
    }

    #[test]
    fn color_tag_parse() {
        assert_eq!("Flamingo".parse::<ColorTag>().unwrap(), ColorTag::Flamingo);
        assert_eq!(" blue ".parse::<ColorTag>().unwrap(), ColorTag::Blue);
        assert!("purple".parse::<ColorTag>().is_err());
    }

    #[test]
    fn event_summary_with_course() {
        let event = NormalizedEvent::new("Homework 3", "CS 1337", "", due(), ColorTag::Blue);
        assert_eq!(event.summary, "CS 1337 - Homework 3");
        assert_eq!(event.description, "Homework 3\nCourse: CS 1337");
        assert!(event.has_course());
        assert_eq!(event.duration_minutes, 60);
    }

    #[test]
    fn event_summary_without_course() {
        let event = NormalizedEvent::new("Quiz", "", "Read chapter 4", due(), ColorTag::Default);
        assert_eq!(event.summary, "Quiz");
        assert_eq!(event.course_code, UNKNOWN_COURSE);
        assert_eq!(event.description, "Read chapter 4");
        assert!(!event.has_course());
    }

    #[test]
    fn event_empty_title_is_untitled() {
        let event = NormalizedEvent::new("  ", "", "", due(), ColorTag::Default);
        assert_eq!(event.summary, UNTITLED);
        assert_eq!(event.description, "Untitled\nCourse: Unknown");
    }

    #[test]
    fn event_end_instant() {
        let event = NormalizedEvent::new("Lab", "PHYS 2125", "", due(), ColorTag::Green);
        assert_eq!(
            event.end_instant(),
            Utc.with_ymd_and_hms(2025, 2, 11, 6, 59, 0).unwrap()
        );
    }

    #[test]
    fn event_json_shape() {
        let event = NormalizedEvent::new("Homework 3", "CS 1337", "", due(), ColorTag::Blue);
        insta::assert_json_snapshot!(event, @r#"
        {
          "summary": "CS 1337 - Homework 3",
          "description": "Homework 3\nCourse: CS 1337",
          "courseCode": "CS 1337",
          "title": "Homework 3",
          "startInstant": "2025-02-11T05:59:00Z",
          "durationMinutes": 60,
          "colorTag": "blue"
        }
        "#);
    }

    #[test]
    fn event_json_roundtrip() {
        let event =
            NormalizedEvent::new("Essay", "ENG 1302", "Draft due", due(), ColorTag::Flamingo);
        let json = serde_json::to_string(&event).unwrap();
        let parsed: NormalizedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
