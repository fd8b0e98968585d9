//! Raw due-date records as produced by the LMS scraper.
//!
//! A [`RawEvent`] is the unprocessed record handed off by the scraper before
//! normalization. Every field is free text, may be empty, and may still carry
//! HTML fragments or entities from the page it was lifted from.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid HTML tag regex"));

static BREAK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(br|/p|/div|/li)\s*/?\s*>").expect("Invalid line break regex")
});

static SPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("Invalid whitespace regex"));

/// A scraped due-date record.
///
/// Deserializes from the scraper's hand-off names (`courseName`, `dateStr`,
/// `timeStr`, `description`) as well as the canonical camelCase names.
/// Missing fields default to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvent {
    /// The entry title as shown in the calendar view.
    pub title: String,
    /// Course label; may be human-readable or an opaque id like `_12345_1`.
    #[serde(alias = "courseName", alias = "course")]
    pub course_hint: String,
    /// Free-form date text.
    #[serde(alias = "dateStr", alias = "date")]
    pub date_text: String,
    /// Free-form time text, possibly empty.
    #[serde(alias = "timeStr", alias = "time")]
    pub time_text: String,
    /// Free-form description text.
    #[serde(alias = "description")]
    pub description_text: String,
}

impl RawEvent {
    /// Creates a raw event with the given title and date text.
    pub fn new(title: impl Into<String>, date_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date_text: date_text.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the course hint.
    pub fn with_course_hint(mut self, hint: impl Into<String>) -> Self {
        self.course_hint = hint.into();
        self
    }

    /// Builder method to set the time text.
    pub fn with_time_text(mut self, time: impl Into<String>) -> Self {
        self.time_text = time.into();
        self
    }

    /// Builder method to set the description text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description_text = description.into();
        self
    }

    /// Returns a copy with every field reduced to plain, trimmed text.
    ///
    /// Single-line fields have all whitespace collapsed; the description keeps
    /// its line structure.
    pub fn cleaned(&self) -> Self {
        Self {
            title: clean_line(&self.title),
            course_hint: clean_line(&self.course_hint),
            date_text: clean_line(&self.date_text),
            time_text: clean_line(&self.time_text),
            description_text: clean_text(&self.description_text),
        }
    }
}

/// Strips markup and collapses all whitespace into single spaces.
pub fn clean_line(text: &str) -> String {
    strip_markup(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips markup, collapses runs of spaces, and drops blank lines.
pub fn clean_text(text: &str) -> String {
    let stripped = strip_markup(&BREAK_REGEX.replace_all(text, "\n"));
    stripped
        .lines()
        .map(|line| SPACE_REGEX.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Removes tags and decodes the common HTML entities.
fn strip_markup(text: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(text, " ");
    // &amp; last so "&amp;lt;" decodes to "&lt;" and not "<"
    without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_scraper_names() {
        let json = r#"{
            "title": "Homework 2",
            "courseName": "_12345_1",
            "dateStr": "Feb 10, 2025",
            "timeStr": "11:59 PM",
            "description": "Submit on the CS 1337 page"
        }"#;
        let raw: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(raw.course_hint, "_12345_1");
        assert_eq!(raw.date_text, "Feb 10, 2025");
        assert_eq!(raw.time_text, "11:59 PM");
        assert_eq!(raw.description_text, "Submit on the CS 1337 page");
    }

    #[test]
    fn deserialize_canonical_names() {
        let json = r#"{"title": "Quiz", "courseHint": "MATH 2417", "dateText": "2025-03-01"}"#;
        let raw: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(raw.course_hint, "MATH 2417");
        assert_eq!(raw.date_text, "2025-03-01");
        assert_eq!(raw.time_text, "");
    }

    #[test]
    fn deserialize_missing_fields() {
        let raw: RawEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(raw, RawEvent::default());
    }

    #[test]
    fn clean_line_strips_tags_and_entities() {
        assert_eq!(
            clean_line("  <b>Lab&nbsp;3</b> &amp; report  "),
            "Lab 3 & report"
        );
        assert_eq!(clean_line("&lt;draft&gt; &quot;v2&quot;"), "<draft> \"v2\"");
        assert_eq!(clean_line("Rock &#39;n&#39; roll"), "Rock 'n' roll");
    }

    #[test]
    fn clean_text_keeps_lines() {
        let cleaned = clean_text("<p>Read ch. 4</p>\n\n<p>Answer   all questions</p><br/>");
        assert_eq!(cleaned, "Read ch. 4\nAnswer all questions");
    }

    #[test]
    fn double_encoded_entity_decodes_once() {
        assert_eq!(clean_line("a &amp;lt; b"), "a &lt; b");
    }

    #[test]
    fn cleaned_event() {
        let raw = RawEvent::new(" <span>Essay</span> ", " Feb 10 ")
            .with_course_hint("ENG\n1302")
            .with_time_text(" 5:00 pm ");
        let cleaned = raw.cleaned();
        assert_eq!(cleaned.title, "Essay");
        assert_eq!(cleaned.course_hint, "ENG 1302");
        assert_eq!(cleaned.date_text, "Feb 10");
        assert_eq!(cleaned.time_text, "5:00 pm");
    }
}
