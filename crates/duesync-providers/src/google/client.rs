//! Google Calendar API client.
//!
//! This module provides the HTTP client that writes entries to a Google
//! calendar, including request building and status-to-error mapping.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::remote::{BoxFuture, RemoteCalendar, RemoteCalendarEntry, RemoteId};

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// 403 reasons Google uses for quota exhaustion rather than permission errors.
const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

/// Google Calendar API client bound to one calendar.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    calendar_id: String,
    base_url: String,
}

impl GoogleCalendarClient {
    /// Creates a client writing to `calendar_id` with the given access token.
    pub fn new(
        access_token: impl Into<String>,
        calendar_id: impl Into<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("duesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ProviderError::internal("failed to create HTTP client")
                    .with_provider("google")
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            calendar_id: calendar_id.into(),
            base_url: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the calendar this client writes to.
    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    /// Creates an entry (`POST /calendars/{id}/events`).
    pub async fn create(&self, entry: &RemoteCalendarEntry) -> ProviderResult<RemoteId> {
        let body = ApiEvent::from_entry(entry);
        let request = self
            .http_client
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .json(&body);

        let created = self.send(request).await?;
        debug!(id = %created.id, "created calendar entry");
        Ok(RemoteId::new(created.id))
    }

    /// Replaces the entry stored under `event_id` (`PUT .../events/{eventId}`).
    pub async fn replace(
        &self,
        event_id: &str,
        entry: &RemoteCalendarEntry,
    ) -> ProviderResult<RemoteId> {
        let mut body = ApiEvent::from_entry(entry);
        body.id = None;
        let url = format!("{}/{}", self.events_url(), urlencoding::encode(event_id));
        let request = self
            .http_client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body);

        let updated = self.send(request).await?;
        debug!(id = %updated.id, "updated calendar entry");
        Ok(RemoteId::new(updated.id))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ProviderResult<EventResponse> {
        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timeout".to_string()
            } else if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                format!("request failed: {}", e)
            };
            ProviderError::network(message).with_provider("google")
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e))
                .with_provider("google")
        })?;

        if !status.is_success() {
            return Err(map_status(status.as_u16(), &body, retry_after));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_provider("google")
                .with_status(status.as_u16())
        })
    }
}

impl RemoteCalendar for GoogleCalendarClient {
    fn name(&self) -> &str {
        "google"
    }

    fn is_authorized(&self) -> bool {
        !self.access_token.is_empty()
    }

    fn insert_event<'a>(
        &'a self,
        entry: &'a RemoteCalendarEntry,
    ) -> BoxFuture<'a, ProviderResult<RemoteId>> {
        Box::pin(self.create(entry))
    }

    fn update_event<'a>(
        &'a self,
        id: &'a str,
        entry: &'a RemoteCalendarEntry,
    ) -> BoxFuture<'a, ProviderResult<RemoteId>> {
        Box::pin(self.replace(id, entry))
    }
}

/// Maps a failed API response to a provider error.
fn map_status(status: u16, body: &str, retry_after: Option<u64>) -> ProviderError {
    let api_error = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .map(|r| r.error);
    let message = api_error
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.trim().to_string());
    let rate_limit_reason = api_error.as_ref().is_some_and(|e| {
        e.errors
            .iter()
            .any(|d| RATE_LIMIT_REASONS.contains(&d.reason.as_str()))
    });

    let error = match status {
        401 => {
            ProviderError::authentication(format!("access token expired or invalid: {}", message))
        }
        403 if rate_limit_reason => ProviderError::rate_limited(message),
        403 => ProviderError::authorization(format!("access denied to calendar: {}", message)),
        404 => ProviderError::not_found(message),
        409 => ProviderError::conflict(message),
        429 => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        400 => ProviderError::bad_request(message),
        s if s >= 500 => ProviderError::server(message),
        _ => ProviderError::invalid_response(format!("unexpected status: {}", message)),
    };
    error.with_provider("google").with_status(status)
}

/// Event resource as sent to the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    summary: String,
    description: String,
    start: ApiEventTime,
    end: ApiEventTime,
    color_id: String,
    reminders: ApiReminders,
}

impl ApiEvent {
    fn from_entry(entry: &RemoteCalendarEntry) -> Self {
        let reminders = if entry.reminder_minutes.is_empty() {
            ApiReminders {
                use_default: true,
                overrides: None,
            }
        } else {
            ApiReminders {
                use_default: false,
                overrides: Some(
                    entry
                        .reminder_minutes
                        .iter()
                        .map(|&minutes| ApiReminderOverride {
                            method: "popup",
                            minutes,
                        })
                        .collect(),
                ),
            }
        };

        Self {
            id: entry.id.clone(),
            summary: entry.summary.clone(),
            description: entry.description.clone(),
            start: ApiEventTime {
                date_time: entry.start.to_rfc3339(),
                time_zone: entry.time_zone.clone(),
            },
            end: ApiEventTime {
                date_time: entry.end.to_rfc3339(),
                time_zone: entry.time_zone.clone(),
            },
            color_id: entry.color_id.clone(),
            reminders,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date_time: String,
    time_zone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiReminders {
    use_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    overrides: Option<Vec<ApiReminderOverride>>,
}

#[derive(Debug, Serialize)]
struct ApiReminderOverride {
    method: &'static str,
    minutes: u32,
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: String,
}
