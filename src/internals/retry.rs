//! Retry policy with exponential backoff and Retry-After support
//!
//! The HTTP client resubmits transient failures transparently:
//! - Exponential backoff: 1s, 2s, 4s with the default policy
//! - `retry-after` hints (delta-seconds or HTTP-date) take precedence
//! - At most `max_retries` retries per failure category per logical call
//! - A fixed 30s deadline per physical attempt
//!
//! Retry counters are kept per [`RetryCategory`], not per call. A call that
//! exhausts its rate-limit retries can still retry a later 5xx on the same
//! call, so an alternating 429/503 service sees up to
//! `1 + max_retries * 3` attempts. This is the intended ceiling.

use crate::error::NormalizedError;
use crate::logging::log_debug;

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Retry policy configuration for service requests
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryPolicy {
    /// Maximum retries per failure category for one logical call
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Upper bound for any single wait, including server-supplied hints
    pub max_delay: Duration,
    /// Random extra fraction of the delay (0.1 = up to 10%), 0 disables jitter
    pub jitter: f64,
    /// Deadline for each physical attempt
    pub request_timeout: Duration,
    /// Whether a `retry-after` header overrides the computed backoff
    pub honor_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.0,
            request_timeout: Duration::from_secs(30),
            honor_retry_after: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries, for callers that want a single attempt.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff for the retry with zero-based index `retry_count`:
    /// `base_delay * multiplier^retry_count` plus jitter, capped at `max_delay`.
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let delay_seconds = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        let with_jitter = if self.jitter > 0.0 {
            delay_seconds * (1.0 + fastrand::f64() * self.jitter)
        } else {
            delay_seconds
        };
        let capped = with_jitter.min(self.max_delay.as_secs_f64());

        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Wait before the next retry, preferring a server hint when allowed.
    pub fn delay_for(&self, retry_count: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after.filter(|_| self.honor_retry_after) {
            Some(hint) => hint.min(self.max_delay),
            None => self.backoff_delay(retry_count),
        }
    }

    /// Decide whether `attempt` may retry a failure in `category`.
    ///
    /// Returns the wait and bumps the category counter, or `None` once the
    /// category has used up `max_retries`.
    pub fn next_retry(
        &self,
        category: RetryCategory,
        attempt: &mut RequestAttempt,
        retry_after: Option<Duration>,
    ) -> Option<Duration> {
        let retry_count = attempt.retry_count(category);
        if retry_count >= self.max_retries {
            return None;
        }

        let delay = self.delay_for(retry_count, retry_after);
        attempt.record_retry(category);

        log_debug!(
            request_id = %attempt.request_id(),
            category = category.as_str(),
            retry = retry_count + 1,
            max_retries = self.max_retries,
            delay_ms = delay.as_millis() as u64,
            "Scheduling retry"
        );

        Some(delay)
    }
}

/// Failure categories that are resubmitted, each with its own counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryCategory {
    /// 429 Too Many Requests
    RateLimited,
    /// Any 5xx
    ServerError,
    /// Network failure or timeout: nothing came back
    NoResponse,
}

impl RetryCategory {
    pub const ALL: [RetryCategory; 3] = [
        RetryCategory::RateLimited,
        RetryCategory::ServerError,
        RetryCategory::NoResponse,
    ];

    /// Whether `error` belongs to this category.
    pub fn matches(&self, error: &NormalizedError) -> bool {
        match self {
            Self::RateLimited => error.is_rate_limited(),
            Self::ServerError => error.is_server_error(),
            Self::NoResponse => error.is_network_error() || error.is_timeout_error(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::NoResponse => "no_response",
        }
    }
}

/// Per-call retry bookkeeping: one initial attempt plus its retries.
///
/// Created by the client for each logical call and dropped when the call
/// settles. Never shared between calls.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    request_id: Uuid,
    dispatches: u32,
    rate_limited_retries: u32,
    server_error_retries: u32,
    no_response_retries: u32,
    started: Instant,
}

impl Default for RequestAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestAttempt {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            dispatches: 0,
            rate_limited_retries: 0,
            server_error_retries: 0,
            no_response_retries: 0,
            started: Instant::now(),
        }
    }

    /// Correlation id shared by every physical attempt of this call.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn retry_count(&self, category: RetryCategory) -> u32 {
        match category {
            RetryCategory::RateLimited => self.rate_limited_retries,
            RetryCategory::ServerError => self.server_error_retries,
            RetryCategory::NoResponse => self.no_response_retries,
        }
    }

    pub fn total_retries(&self) -> u32 {
        RetryCategory::ALL
            .iter()
            .map(|category| self.retry_count(*category))
            .sum()
    }

    pub(crate) fn record_retry(&mut self, category: RetryCategory) {
        let counter = match category {
            RetryCategory::RateLimited => &mut self.rate_limited_retries,
            RetryCategory::ServerError => &mut self.server_error_retries,
            RetryCategory::NoResponse => &mut self.no_response_retries,
        };
        *counter += 1;
    }

    /// Physical dispatches issued so far, including the first.
    pub fn dispatches(&self) -> u32 {
        self.dispatches
    }

    pub(crate) fn record_dispatch(&mut self) -> u32 {
        self.dispatches += 1;
        self.dispatches
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Parse a `retry-after` header value relative to the current time.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    parse_retry_after_at(value, Utc::now())
}

/// Parse a `retry-after` value: delta-seconds or an HTTP-date.
///
/// Dates in the past mean "retry now". Anything unparseable is ignored.
pub fn parse_retry_after_at(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = date.with_timezone(&Utc) - now;
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}
