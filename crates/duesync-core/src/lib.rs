//! Core types: normalized events, course resolution, time parsing, warnings

pub mod course;
pub mod event;
pub mod time;
pub mod tracing;
pub mod warning;

pub use course::{CourseHints, CourseResolver, ResolveStrategy, find_course_code};
pub use event::{
    ColorTable, ColorTag, DEFAULT_DURATION_MINUTES, NormalizedEvent, UNKNOWN_COURSE, UNTITLED,
};
pub use time::{DateTimeNormalizer, NormalizedInstant, TimeWindow, parse_date, parse_time_of_day};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use warning::{DegradedField, NormalizeWarning};
