//! Remote calendar abstraction.
//!
//! This module defines the [`RemoteCalendar`] trait implemented by calendar
//! backends that accept new entries, and the [`RemoteCalendarEntry`] payload
//! built from a [`NormalizedEvent`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use duesync_core::{ColorTag, NormalizedEvent};
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Using boxed futures keeps the traits object-safe so the engine can hold
/// a `&dyn RemoteCalendar`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Identifier the remote calendar assigned to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub String);

impl RemoteId {
    /// Creates a remote id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the Google Calendar color id for a color tag.
pub fn color_id(tag: ColorTag) -> &'static str {
    match tag {
        ColorTag::Blue => "9",
        ColorTag::Yellow => "5",
        ColorTag::Green => "10",
        ColorTag::Flamingo => "4",
        ColorTag::Orange => "6",
        ColorTag::Default => "1",
    }
}

/// An entry as sent to the remote calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCalendarEntry {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone name the entry is displayed in.
    pub time_zone: String,
    pub color_id: String,
    /// Deterministic id to create the entry under, if any.
    pub id: Option<String>,
    /// Popup reminder offsets in minutes; empty keeps the calendar defaults.
    pub reminder_minutes: Vec<u32>,
}

impl RemoteCalendarEntry {
    /// Builds the entry for a normalized event.
    pub fn from_event(event: &NormalizedEvent, time_zone: impl Into<String>) -> Self {
        Self {
            summary: event.summary.clone(),
            description: event.description.clone(),
            start: event.start_instant,
            end: event.end_instant(),
            time_zone: time_zone.into(),
            color_id: color_id(event.color_tag).to_string(),
            id: None,
            reminder_minutes: Vec::new(),
        }
    }

    /// Builder method to set a deterministic id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method to set reminder overrides.
    pub fn with_reminders(mut self, minutes: Vec<u32>) -> Self {
        self.reminder_minutes = minutes;
        self
    }
}

/// A calendar that accepts new entries.
///
/// Implementations must be `Send + Sync`; the sync engine calls them one at
/// a time and never overlaps two calls on the same calendar.
pub trait RemoteCalendar: Send + Sync {
    /// Returns the name of this backend (e.g. "google").
    fn name(&self) -> &str;

    /// Returns true if the calendar holds credentials usable for writes.
    fn is_authorized(&self) -> bool;

    /// Creates an entry and returns its remote id.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network, authentication, quota or
    /// validation failures. A `Conflict` code means `entry.id` already exists.
    fn insert_event<'a>(
        &'a self,
        entry: &'a RemoteCalendarEntry,
    ) -> BoxFuture<'a, ProviderResult<RemoteId>>;

    /// Overwrites the entry stored under `id`.
    ///
    /// The default implementation reports the operation as unsupported.
    fn update_event<'a>(
        &'a self,
        id: &'a str,
        entry: &'a RemoteCalendarEntry,
    ) -> BoxFuture<'a, ProviderResult<RemoteId>> {
        let _ = (id, entry);
        let name = self.name().to_string();
        Box::pin(async move {
            Err(ProviderError::unsupported("updating entries is not supported").with_provider(name))
        })
    }
}
