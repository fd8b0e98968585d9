//! Bounded retry around a remote calendar.
//!
//! [`RetryingCalendar`] wraps any [`RemoteCalendar`] and retries calls that
//! fail with a retryable error (network, rate limit, server), sleeping an
//! exponential backoff between attempts. The sync engine does not know it
//! is there; with the default policy of one attempt it is a pass-through.

use std::time::Duration;

use duesync_providers::{
    BoxFuture, ProviderError, ProviderResult, RemoteCalendar, RemoteCalendarEntry, RemoteId,
};
use tracing::warn;

/// Retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first. 1 disables retry.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Growth factor between successive delays.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` attempts with default backoff.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Builder: set backoff parameters.
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    /// Returns true if more than one attempt is allowed.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Calculates the delay after `consecutive_failures` failed attempts.
    pub fn backoff_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64();
        let multiplier = self
            .backoff_multiplier
            .powi(consecutive_failures as i32 - 1);
        let delay = base * multiplier;
        let max = self.max_backoff.as_secs_f64();

        Duration::from_secs_f64(delay.min(max))
    }
}

/// A remote calendar that retries transient failures.
pub struct RetryingCalendar<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: RemoteCalendar> RetryingCalendar<C> {
    /// Wraps `inner` with `policy`.
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped calendar.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn with_retry<'a, F>(&'a self, op: &'static str, mut call: F) -> ProviderResult<RemoteId>
    where
        F: FnMut() -> BoxFuture<'a, ProviderResult<RemoteId>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut failures = 0;
        loop {
            match call().await {
                Ok(id) => return Ok(id),
                Err(e) if e.is_retryable() && failures + 1 < attempts => {
                    failures += 1;
                    let delay = self.policy.backoff_delay(failures);
                    warn!(
                        op,
                        attempt = failures,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying remote call"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<C: RemoteCalendar> RemoteCalendar for RetryingCalendar<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_authorized(&self) -> bool {
        self.inner.is_authorized()
    }

    fn insert_event<'a>(
        &'a self,
        entry: &'a RemoteCalendarEntry,
    ) -> BoxFuture<'a, ProviderResult<RemoteId>> {
        Box::pin(self.with_retry("insert", move || self.inner.insert_event(entry)))
    }

    fn update_event<'a>(
        &'a self,
        id: &'a str,
        entry: &'a RemoteCalendarEntry,
    ) -> BoxFuture<'a, ProviderResult<RemoteId>> {
        Box::pin(self.with_retry("update", move || self.inner.update_event(id, entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::{TimeZone, Utc};
    use duesync_providers::ProviderErrorCode;
    use tokio::time::Instant;

    /// Fails the first `failures` calls with a clone-able error code.
    struct Flaky {
        failures: u32,
        code: ProviderErrorCode,
        calls: AtomicU32,
        call_times: Mutex<Vec<Instant>>,
    }

    impl Flaky {
        fn new(failures: u32, code: ProviderErrorCode) -> Self {
            Self {
                failures,
                code,
                calls: AtomicU32::new(0),
                call_times: Mutex::new(Vec::new()),
            }
        }
    }

    impl RemoteCalendar for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn is_authorized(&self) -> bool {
            true
        }

        fn insert_event<'a>(
            &'a self,
            _entry: &'a RemoteCalendarEntry,
        ) -> BoxFuture<'a, ProviderResult<RemoteId>> {
            Box::pin(async move {
                self.call_times.lock().unwrap().push(Instant::now());
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if n < self.failures {
                    Err(ProviderError::new(self.code, format!("failure {}", n)))
                } else {
                    Ok(RemoteId::new("ok"))
                }
            })
        }
    }

    fn entry() -> RemoteCalendarEntry {
        let start = Utc.with_ymd_and_hms(2025, 2, 11, 5, 59, 0).unwrap();
        RemoteCalendarEntry {
            summary: "CS 1337 - Homework".to_string(),
            description: String::new(),
            start,
            end: start,
            time_zone: "UTC".to_string(),
            color_id: "9".to_string(),
            id: None,
            reminder_minutes: Vec::new(),
        }
    }

    #[test]
    fn backoff_delay_grows_and_caps() {
        let policy = RetryPolicy::new(5).with_backoff(
            Duration::from_millis(100),
            Duration::from_millis(350),
            2.0,
        );
        assert_eq!(policy.backoff_delay(0), Duration::ZERO);
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(350));
    }

    #[test]
    fn default_policy_is_single_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.is_enabled());
        assert!(RetryPolicy::new(3).is_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_with_backoff() {
        let calendar = RetryingCalendar::new(
            Flaky::new(2, ProviderErrorCode::ServerError),
            RetryPolicy::new(3).with_backoff(Duration::from_secs(1), Duration::from_secs(10), 2.0),
        );

        let id = calendar.insert_event(&entry()).await.unwrap();
        assert_eq!(id.as_str(), "ok");
        assert_eq!(calendar.inner().calls.load(Ordering::SeqCst), 3);

        let times = calendar.inner().call_times.lock().unwrap().clone();
        assert!(times[1] - times[0] >= Duration::from_secs(1));
        assert!(times[2] - times[1] >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calendar = RetryingCalendar::new(
            Flaky::new(10, ProviderErrorCode::RateLimited),
            RetryPolicy::new(3),
        );
        let err = calendar.insert_event(&entry()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        assert_eq!(err.message(), "failure 2");
        assert_eq!(calendar.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let calendar = RetryingCalendar::new(
            Flaky::new(10, ProviderErrorCode::BadRequest),
            RetryPolicy::new(5),
        );
        assert!(calendar.insert_event(&entry()).await.is_err());
        assert_eq!(calendar.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_attempt_passes_through() {
        let calendar = RetryingCalendar::new(
            Flaky::new(1, ProviderErrorCode::NetworkError),
            RetryPolicy::default(),
        );
        assert!(calendar.insert_event(&entry()).await.is_err());
        assert_eq!(calendar.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(calendar.name(), "flaky");
        assert!(calendar.is_authorized());
    }
}
