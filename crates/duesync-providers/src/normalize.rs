//! RawEvent to NormalizedEvent conversion pipeline.
//!
//! The normalization process:
//! 1. Strips markup and collapses whitespace in every field
//! 2. Resolves the course code with the [`CourseResolver`]
//! 3. Resolves the due instant with the [`DateTimeNormalizer`]
//! 4. Picks the color from the [`ColorTable`]
//! 5. Builds the [`NormalizedEvent`], which derives summary and description
//!
//! Normalization is total: any [`RawEvent`] yields an event, and problems
//! with the input surface as [`NormalizeWarning`]s.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use duesync_core::{
    ColorTable, CourseResolver, DateTimeNormalizer, NormalizeWarning, NormalizedEvent,
};
use tracing::warn;

use crate::raw_event::RawEvent;

/// Zone used when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Chicago;

/// Settings for an [`EventNormalizer`].
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Zone the scraped wall-clock times are interpreted in.
    pub timezone: Tz,
    /// Prefix-to-color mapping.
    pub colors: ColorTable,
    /// Course code strategies.
    pub resolver: CourseResolver,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            colors: ColorTable::default(),
            resolver: CourseResolver::default(),
        }
    }
}

impl NormalizerConfig {
    /// Builder method to set the zone.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Builder method to set the color table.
    pub fn with_colors(mut self, colors: ColorTable) -> Self {
        self.colors = colors;
        self
    }

    /// Builder method to set the resolver.
    pub fn with_resolver(mut self, resolver: CourseResolver) -> Self {
        self.resolver = resolver;
        self
    }
}

/// Converts raw scraped records into normalized events.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    datetime: DateTimeNormalizer,
    colors: ColorTable,
    resolver: CourseResolver,
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl EventNormalizer {
    /// Creates a normalizer from its configuration.
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            datetime: DateTimeNormalizer::new(config.timezone),
            colors: config.colors,
            resolver: config.resolver,
        }
    }

    /// Returns the configured zone.
    pub fn timezone(&self) -> Tz {
        self.datetime.timezone()
    }

    /// Normalizes one record, discarding warnings.
    pub fn normalize(&self, raw: &RawEvent, reference_now: DateTime<Utc>) -> NormalizedEvent {
        self.normalize_with_warnings(raw, reference_now).0
    }

    /// Normalizes one record and reports what had to be substituted.
    pub fn normalize_with_warnings(
        &self,
        raw: &RawEvent,
        reference_now: DateTime<Utc>,
    ) -> (NormalizedEvent, Vec<NormalizeWarning>) {
        let raw = raw.cleaned();

        let course_code = self
            .resolver
            .resolve(&raw.title, &raw.course_hint, &raw.description_text);

        let resolved = self
            .datetime
            .normalize(&raw.date_text, &raw.time_text, reference_now);
        let mut warnings = resolved.warnings;

        if course_code.is_empty() {
            warn!(title = %raw.title, "no course code found");
            warnings.push(NormalizeWarning::ResolutionUnknown {
                title: raw.title.clone(),
            });
        }

        let color = self.colors.color_for(&course_code);
        let event = NormalizedEvent::new(
            raw.title,
            course_code,
            raw.description_text,
            resolved.instant,
            color,
        );
        (event, warnings)
    }

    /// Normalizes a batch, preserving input order.
    pub fn normalize_events(
        &self,
        raws: &[RawEvent],
        reference_now: DateTime<Utc>,
    ) -> Vec<NormalizedEvent> {
        raws.iter()
            .map(|raw| self.normalize(raw, reference_now))
            .collect()
    }
}

/// Normalizes one record with the default configuration.
pub fn normalize_event(raw: &RawEvent, reference_now: DateTime<Utc>) -> NormalizedEvent {
    EventNormalizer::default().normalize(raw, reference_now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use duesync_core::{ColorTag, DegradedField, UNKNOWN_COURSE};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 18, 0, 0).unwrap()
    }

    #[test]
    fn normalize_full_record() {
        let raw = RawEvent::new("CS1337 Homework 2", "Feb 10, 2025");
        let (event, warnings) = EventNormalizer::default().normalize_with_warnings(&raw, now());

        assert!(warnings.is_empty());
        assert_eq!(event.course_code, "CS 1337");
        assert_eq!(event.summary, "CS 1337 - CS1337 Homework 2");
        assert_eq!(event.description, "CS1337 Homework 2\nCourse: CS 1337");
        assert_eq!(
            event.start_instant,
            Utc.with_ymd_and_hms(2025, 2, 11, 5, 59, 0).unwrap()
        );
        assert_eq!(event.duration_minutes, 60);
        assert_eq!(event.color_tag, ColorTag::Blue);
    }

    #[test]
    fn normalize_with_time_and_hint() {
        let raw = RawEvent::new("Problem Set 4", "Monday, February 10, 2025")
            .with_course_hint("MATH 2417")
            .with_time_text("2:30 PM")
            .with_description("<p>Sections 3.1&ndash;3.4</p>");
        let event = EventNormalizer::default().normalize(&raw, now());

        assert_eq!(event.course_code, "MATH 2417");
        assert_eq!(event.color_tag, ColorTag::Yellow);
        assert_eq!(
            event.start_instant,
            Utc.with_ymd_and_hms(2025, 2, 10, 20, 30, 0).unwrap()
        );
        assert_eq!(event.description, "Sections 3.1&ndash;3.4");
    }

    #[test]
    fn normalize_opaque_hint_uses_description() {
        let raw = RawEvent::new("Lab report", "Feb 12, 2025")
            .with_course_hint("_48213_1")
            .with_description("Upload to the PHYS 2125 dropbox");
        let event = EventNormalizer::default().normalize(&raw, now());
        assert_eq!(event.course_code, "PHYS 2125");
        assert_eq!(event.summary, "PHYS 2125 - Lab report");
        assert_eq!(event.color_tag, ColorTag::Green);
    }

    #[test]
    fn normalize_unresolved_course() {
        let raw = RawEvent::new("Reading response", "Feb 12, 2025");
        let (event, warnings) = EventNormalizer::default().normalize_with_warnings(&raw, now());
        assert_eq!(event.course_code, UNKNOWN_COURSE);
        assert_eq!(event.summary, "Reading response");
        assert_eq!(event.description, "Reading response\nCourse: Unknown");
        assert_eq!(event.color_tag, ColorTag::Default);
        assert_eq!(
            warnings,
            vec![NormalizeWarning::ResolutionUnknown {
                title: "Reading response".to_string()
            }]
        );
    }

    #[test]
    fn normalize_unknown_prefix_is_default_color() {
        let raw = RawEvent::new("BIOL 2311 quiz", "Feb 12, 2025");
        let event = EventNormalizer::default().normalize(&raw, now());
        assert_eq!(event.course_code, "BIOL 2311");
        assert_eq!(event.color_tag, ColorTag::Default);
    }

    #[test]
    fn normalize_degraded_date_falls_back_to_reference() {
        let raw = RawEvent::new("ENG 1302 essay", "sometime soon").with_time_text("10:00 AM");
        let (event, warnings) = EventNormalizer::default().normalize_with_warnings(&raw, now());
        // 2025-01-20 10:00 in Chicago
        assert_eq!(
            event.start_instant,
            Utc.with_ymd_and_hms(2025, 1, 20, 16, 0, 0).unwrap()
        );
        assert!(matches!(
            warnings.as_slice(),
            [NormalizeWarning::ParseDegraded { field: DegradedField::Date, .. }]
        ));
    }

    #[test]
    fn normalize_custom_colors_and_zone() {
        let config = NormalizerConfig::default()
            .with_timezone(chrono_tz::UTC)
            .with_colors(ColorTable::empty().with_entry("BIOL", ColorTag::Orange));
        let normalizer = EventNormalizer::new(config);
        assert_eq!(normalizer.timezone(), chrono_tz::UTC);

        let event = normalizer.normalize(&RawEvent::new("BIOL 2311 quiz", "2025-02-12"), now());
        assert_eq!(event.color_tag, ColorTag::Orange);
        assert_eq!(
            event.start_instant,
            Utc.with_ymd_and_hms(2025, 2, 12, 23, 59, 0).unwrap()
        );

        let cs = normalizer.normalize(&RawEvent::new("CS 1337 quiz", "2025-02-12"), now());
        assert_eq!(cs.color_tag, ColorTag::Default);
    }

    #[test]
    fn normalize_is_total() {
        let inputs = [
            RawEvent::default(),
            RawEvent::new("", ""),
            RawEvent::new("<br>", "<br>").with_time_text("<i></i>"),
            RawEvent::new("   ", "99/99/9999").with_time_text("25:61 PM"),
            RawEvent::new("\u{1F4DA} Ünïcödé", "février 10").with_course_hint("_"),
            RawEvent::new("CS", "Feb 30, 2025").with_course_hint("   "),
            RawEvent::new("&amp;&amp;", "0000-00-00").with_description("_1_1"),
        ];
        let normalizer = EventNormalizer::default();
        for raw in &inputs {
            let event = normalizer.normalize(raw, now());
            assert!(!event.summary.is_empty(), "empty summary for {:?}", raw);
            assert!(!event.course_code.is_empty(), "empty course for {:?}", raw);
            assert_eq!(event.duration_minutes, 60);
        }
    }

    #[test]
    fn normalize_events_preserves_order() {
        let raws = vec![
            RawEvent::new("HIST 1301 essay", "Feb 3, 2025"),
            RawEvent::new("ENG 1302 draft", "Feb 1, 2025"),
        ];
        let events = EventNormalizer::default().normalize_events(&raws, now());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].color_tag, ColorTag::Orange);
        assert_eq!(events[1].color_tag, ColorTag::Flamingo);
        assert!(events[0].start_instant > events[1].start_instant);
    }

    #[test]
    fn normalize_event_uses_defaults() {
        let event = normalize_event(&RawEvent::new("CS 2336 exam", "Feb 10, 2025"), now());
        assert_eq!(event.course_code, "CS 2336");
        assert_eq!(
            event.start_instant,
            Utc.with_ymd_and_hms(2025, 2, 11, 5, 59, 0).unwrap()
        );
    }
}
