//! Raw event sources.
//!
//! The DOM scraper runs outside this workspace; its output reaches the
//! pipeline through a [`RawEventSource`]. An empty stream is a valid result,
//! only an unreachable or malformed source is an error.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;
use crate::remote::BoxFuture;

/// Yields the raw records of one scrape.
pub trait RawEventSource: Send + Sync {
    /// Returns a short name for logs (e.g. "json-file").
    fn name(&self) -> &str;

    /// Extracts all raw records in the order the source produced them.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the source cannot be read or parsed.
    /// "No events" is an empty vector, never an error.
    fn extract(&self) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>>;
}

/// Reads a JSON array of raw records written by the scraper.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Creates a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> ProviderResult<Vec<RawEvent>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read raw events from {}",
                self.path.display()
            ))
            .with_provider(self.name())
            .with_source(e)
        })?;

        if content.trim().is_empty() {
            debug!("raw event file {:?} is empty", self.path);
            return Ok(Vec::new());
        }

        let events: Vec<RawEvent> = serde_json::from_str(&content).map_err(|e| {
            ProviderError::invalid_response(format!(
                "invalid raw event JSON in {}",
                self.path.display()
            ))
            .with_provider(self.name())
            .with_source(e)
        })?;

        info!(count = events.len(), path = %self.path.display(), "loaded raw events");
        Ok(events)
    }
}

impl RawEventSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    fn extract(&self) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        Box::pin(self.read())
    }
}

/// A source over records already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    events: Vec<RawEvent>,
}

impl MemorySource {
    /// Creates a source that yields `events`.
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self { events }
    }
}

impl RawEventSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn extract(&self) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        let events = self.events.clone();
        Box::pin(async move { Ok(events) })
    }
}
