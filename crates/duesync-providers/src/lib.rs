//! Event sources, normalization, and remote calendars.
//!
//! This crate provides the pipeline stages on either side of the sync engine:
//!
//! - [`RawEventSource`] - Yields scraped [`RawEvent`] records
//! - [`EventNormalizer`] - Converts raw records to [`NormalizedEvent`]s
//! - [`RemoteCalendar`] - The trait calendar backends implement
//! - [`google`] - The Google Calendar backend
//! - [`ProviderError`] - Error types for source and calendar operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ JsonFileSource  │  scraper hand-off file
//! └────────┬────────┘
//!          │ RawEvent
//!          ▼
//! ┌─────────────────┐
//! │ EventNormalizer │  course code, due instant, color
//! └────────┬────────┘
//!          │ NormalizedEvent
//!          ▼
//!    (sync engine)
//!          │ RemoteCalendarEntry
//!          ▼
//! ┌──────────────────────┐
//! │ GoogleCalendarClient │
//! └──────────────────────┘
//! ```
//!
//! [`NormalizedEvent`]: duesync_core::NormalizedEvent

pub mod error;
pub mod google;
pub mod normalize;
pub mod raw_event;
pub mod remote;
pub mod source;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{DEFAULT_TIMEZONE, EventNormalizer, NormalizerConfig, normalize_event};
pub use raw_event::RawEvent;
pub use remote::{BoxFuture, RemoteCalendar, RemoteCalendarEntry, RemoteId, color_id};
pub use source::{JsonFileSource, MemorySource, RawEventSource};
