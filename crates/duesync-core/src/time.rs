//! Date/time normalization for scraped due dates.
//!
//! This module provides [`DateTimeNormalizer`], which turns free-text date
//! and time strings into an absolute instant in an explicitly configured
//! time zone, and [`TimeWindow`] for bounding which instants are synced.
//!
//! Normalization never fails. An unparseable date falls back to the
//! reference date, an empty or unparseable time falls back to 23:59 (the
//! end-of-day due-date convention), and every substitution other than the
//! empty-time default is reported as a [`NormalizeWarning`].

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

use crate::warning::{DegradedField, NormalizeWarning};

/// Time of day used when no time is given: 23:59:00.
pub const END_OF_DAY: (u32, u32) = (23, 59);

/// Full-string date formats, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%A, %b %d, %Y",
    "%a, %B %d, %Y",
    "%A %B %d, %Y",
    "%a %b %d, %Y",
    "%a %b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
];

/// Year-less dates further than this before the reference date roll into
/// the following year.
const YEARLESS_ROLLOVER_DAYS: i64 = 183;

/// Date formats without a year; the reference year is appended before parsing.
const YEARLESS_FORMATS: &[&str] = &[
    "%b %d %Y",
    "%B %d %Y",
    "%A, %B %d %Y",
    "%a, %b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Datetime formats whose date part is used.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

static ORDINAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("Invalid ordinal regex")
});

static SEPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsept\b").expect("Invalid month regex"));

static ABBREV_DOT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]{3,9})\.").expect("Invalid abbreviation regex"));

/// Date-shaped substrings inside noisy text, most specific first.
static DATE_CANDIDATE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{1,2},?\s+\d{4}\b",
        r"(?i)\b\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*,?\s+\d{4}\b",
        r"\b\d{4}-\d{2}-\d{2}\b",
        r"\b\d{1,2}/\d{1,2}/(?:\d{4}|\d{2})\b",
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{1,2}\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid date candidate regex"))
    .collect()
});

/// `H:MM` or `HH:MM`, optional `:SS`, with an optional AM/PM marker.
static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})(?::\d{2})?(?:\s*([ap])\.?\s*m\b)?")
        .expect("Invalid time regex")
});

/// The result of normalizing a date/time pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInstant {
    /// The resolved instant.
    pub instant: DateTime<Utc>,
    /// Substitutions made while resolving it.
    pub warnings: Vec<NormalizeWarning>,
}

impl NormalizedInstant {
    /// Returns true if any part of the input had to be substituted.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Converts free-text date/time pairs into instants in a fixed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeNormalizer {
    timezone: Tz,
}

impl DateTimeNormalizer {
    /// Creates a normalizer for the given zone.
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Returns the configured zone.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Converts an instant to the configured zone.
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.timezone)
    }

    /// Normalizes a date/time pair.
    ///
    /// `reference_now` supplies the fallback date and anchors the year of
    /// dates written without one.
    pub fn normalize(
        &self,
        date_text: &str,
        time_text: &str,
        reference_now: DateTime<Utc>,
    ) -> NormalizedInstant {
        let mut warnings = Vec::new();
        let reference_date = self.to_local(reference_now).date_naive();

        let date = match parse_date(date_text, reference_date, &self.timezone) {
            Some(date) => date,
            None => {
                warn!(text = %date_text, fallback = %reference_date, "unparseable date text");
                warnings.push(NormalizeWarning::parse_degraded(
                    DegradedField::Date,
                    date_text,
                    reference_date.to_string(),
                ));
                reference_date
            }
        };

        let time = if time_text.trim().is_empty() {
            end_of_day()
        } else {
            match parse_time_of_day(time_text) {
                Some(time) => time,
                None => {
                    warn!(text = %time_text, "unparseable time text, using 23:59");
                    warnings.push(NormalizeWarning::parse_degraded(
                        DegradedField::Time,
                        time_text,
                        "23:59",
                    ));
                    end_of_day()
                }
            }
        };

        let instant = self.resolve_local(date.and_time(time), &mut warnings);
        NormalizedInstant { instant, warnings }
    }

    /// Resolves a local wall-clock time in the configured zone.
    ///
    /// Ambiguous times take the earlier instant. Times inside a DST gap are
    /// moved forward past the gap.
    fn resolve_local(
        &self,
        local: NaiveDateTime,
        warnings: &mut Vec<NormalizeWarning>,
    ) -> DateTime<Utc> {
        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => {
                let shifted = (1..=8)
                    .map(|step| local + Duration::minutes(30 * step))
                    .find_map(|candidate| {
                        self.timezone.from_local_datetime(&candidate).earliest()
                    })
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| Utc.from_utc_datetime(&local));
                warn!(local = %local, zone = %self.timezone, "local time does not exist, shifted");
                warnings.push(NormalizeWarning::parse_degraded(
                    DegradedField::LocalTime,
                    local.to_string(),
                    self.to_local(shifted).naive_local().to_string(),
                ));
                shifted
            }
        }
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(END_OF_DAY.0, END_OF_DAY.1, 0).unwrap_or(NaiveTime::MIN)
}

/// Parses a free-text date.
///
/// The whole text is tried first, then date-shaped substrings. Dates
/// written without a year take `reference`'s year, or the next one when
/// that would put them more than six months before `reference`. Datetimes
/// with an offset are converted to `tz` before their date is taken.
pub fn parse_date(text: &str, reference: NaiveDate, tz: &Tz) -> Option<NaiveDate> {
    let cleaned = clean_date_text(text);
    if cleaned.is_empty() {
        return None;
    }

    if let Some(date) = parse_exact_date(&cleaned, reference, tz) {
        return Some(date);
    }

    DATE_CANDIDATE_REGEXES.iter().find_map(|regex| {
        regex
            .find_iter(&cleaned)
            .find_map(|m| parse_exact_date(m.as_str(), reference, tz))
    })
}

/// Parses text that must be a date (or datetime) in its entirety.
fn parse_exact_date(text: &str, reference: NaiveDate, tz: &Tz) -> Option<NaiveDate> {
    let text = text.trim().trim_end_matches([',', '.']);

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(tz).date_naive());
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt.date());
    }

    let text = text.trim_end_matches(',');
    let date = parse_yearless(text, reference.year())?;
    if (reference - date).num_days() > YEARLESS_ROLLOVER_DAYS {
        return parse_yearless(text, reference.year() + 1).or(Some(date));
    }
    Some(date)
}

fn parse_yearless(text: &str, year: i32) -> Option<NaiveDate> {
    let with_year = format!("{} {}", text, year);
    YEARLESS_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_year, fmt).ok())
}

/// Strips ordinal suffixes and abbreviation dots, collapses whitespace.
fn clean_date_text(text: &str) -> String {
    let text = ORDINAL_REGEX.replace_all(text, "$1");
    let text = SEPT_REGEX.replace_all(&text, "Sep");
    let text = ABBREV_DOT_REGEX.replace_all(&text, "$1");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses the first `H:MM` / `HH:MM` time in `text`, honoring AM/PM.
///
/// - 12 PM stays 12, 12 AM becomes 0
/// - 1–11 PM gains 12 hours, 1–11 AM or no marker is unchanged
/// - a marker on hour 0 or an hour above 12 is ignored
/// - hours above 23 or minutes above 59 do not parse
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let caps = TIME_REGEX.captures(text)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;

    if hour > 23 || minute > 59 {
        return None;
    }

    if let Some(meridiem) = caps.get(3)
        && (1..=12).contains(&hour)
    {
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        hour = match (pm, hour) {
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, 12) => 0,
            (false, h) => h,
        };
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// A window of instants eligible for sync.
///
/// Represents the half-open interval `[start, end)`; an absent end means the
/// window is unbounded in the future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive), if bounded.
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Creates a window from `start` to an optional `end`.
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Creates a window from `now` extending `days` ahead; 0 means unbounded.
    ///
    /// A horizon past the representable range is treated as unbounded.
    pub fn look_ahead(now: DateTime<Utc>, days: u32) -> Self {
        let end = if days > 0 {
            Duration::try_days(i64::from(days)).and_then(|span| now.checked_add_signed(span))
        } else {
            None
        };
        Self { start: now, end }
    }

    /// Checks whether an instant falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && self.end.is_none_or(|end| instant < end)
    }
}
