//! Non-fatal findings reported while normalizing scraped records.
//!
//! Normalization never fails: unparseable text is replaced by a documented
//! default and the substitution is reported here so callers can surface it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which input field was degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedField {
    /// The date text did not parse; the reference date was used.
    Date,
    /// The time text did not parse; 23:59 was used.
    Time,
    /// The local time does not exist in the zone (DST gap) and was shifted.
    LocalTime,
}

impl DegradedField {
    /// Returns the lowercase name of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::LocalTime => "local_time",
        }
    }
}

/// A recoverable problem found during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizeWarning {
    /// Date or time text was unusable and a default was substituted.
    ParseDegraded {
        field: DegradedField,
        text: String,
        fallback: String,
    },
    /// No course code could be resolved.
    ResolutionUnknown { title: String },
}

impl NormalizeWarning {
    /// Creates a parse-degraded warning.
    pub fn parse_degraded(
        field: DegradedField,
        text: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self::ParseDegraded {
            field,
            text: text.into(),
            fallback: fallback.into(),
        }
    }

    /// Returns true if this is a parse degradation.
    pub fn is_parse_degraded(&self) -> bool {
        matches!(self, Self::ParseDegraded { .. })
    }
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseDegraded {
                field,
                text,
                fallback,
            } => write!(
                f,
                "unparseable {} {:?}, using {}",
                field.as_str(),
                text,
                fallback
            ),
            Self::ResolutionUnknown { title } => {
                write!(f, "no course code found for {:?}", title)
            }
        }
    }
}
