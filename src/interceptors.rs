//! The request/failure pipeline of the HTTP client.
//!
//! Interceptors run in the order they were added. On the way out every
//! interceptor may edit the outgoing headers. On failure they are asked in
//! order and the first one that does not answer [`ErrorDecision::Continue`]
//! decides; if none claims the failure it is rejected. A retry re-enters the
//! same pipeline from the top with the same [`RequestAttempt`].
//!
//! The standard chain, in order:
//!
//! 1. [`BearerAuth`] attaches the stored session token
//! 2. [`SessionExpiry`] handles 401: sign out, redirect to login, reject
//! 3. [`ForbiddenAudit`] handles 403: audit log, reject
//! 4. [`RetryOnFailure`] for 429
//! 5. [`RetryOnFailure`] for 5xx
//! 6. [`RetryOnFailure`] for network failures and timeouts

use crate::config::ClientConfig;
use crate::error::{ApiResult, NormalizedError};
use crate::logging::{log_info, log_warn};
use crate::navigation::{is_auth_path, Navigator};
use crate::retry::{RequestAttempt, RetryCategory, RetryPolicy};
use crate::session::Session;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A classified failure of one physical attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub error: NormalizedError,
    /// Parsed `retry-after` header, when the response carried one.
    pub retry_after: Option<Duration>,
}

impl Failure {
    pub fn new(error: NormalizedError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

impl From<NormalizedError> for Failure {
    fn from(error: NormalizedError) -> Self {
        Self::new(error)
    }
}

/// What an interceptor wants done with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDecision {
    /// Not mine; ask the next interceptor.
    Continue,
    /// Surface the failure to the caller now.
    Reject,
    /// Wait, then resubmit the same request.
    Retry(Duration),
}

pub trait Interceptor: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Edit the outgoing headers of every physical attempt.
    fn on_request(&self, _headers: &mut HeaderMap) -> ApiResult<()> {
        Ok(())
    }

    fn on_error(&self, _failure: &Failure, _attempt: &mut RequestAttempt) -> ErrorDecision {
        ErrorDecision::Continue
    }
}

/// Ordered list of interceptors.
#[derive(Debug, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain every [`ApiClient`](crate::ApiClient) gets by default.
    pub fn standard(
        config: &ClientConfig,
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let policy = &config.retry_policy;
        Self::new()
            .with(BearerAuth::new(session.clone()))
            .with(SessionExpiry::new(
                session,
                navigator,
                config.login_path.clone(),
                config.auth_paths.clone(),
            ))
            .with(ForbiddenAudit)
            .with(RetryOnFailure::new(RetryCategory::RateLimited, policy.clone()))
            .with(RetryOnFailure::new(RetryCategory::ServerError, policy.clone()))
            .with(RetryOnFailure::new(RetryCategory::NoResponse, policy.clone()))
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.push(interceptor);
        self
    }

    pub fn push(&mut self, interceptor: impl Interceptor + 'static) {
        self.interceptors.push(Box::new(interceptor));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Run every request hook in order.
    pub fn prepare(&self, headers: &mut HeaderMap) -> ApiResult<()> {
        for interceptor in &self.interceptors {
            interceptor.on_request(headers)?;
        }
        Ok(())
    }

    /// First interceptor to claim the failure decides; unclaimed failures
    /// are rejected. Never returns [`ErrorDecision::Continue`].
    pub fn resolve(&self, failure: &Failure, attempt: &mut RequestAttempt) -> ErrorDecision {
        self.interceptors
            .iter()
            .map(|interceptor| interceptor.on_error(failure, attempt))
            .find(|decision| *decision != ErrorDecision::Continue)
            .unwrap_or(ErrorDecision::Reject)
    }
}

// ============================================================================
// Standard interceptors
// ============================================================================

/// Attaches `Authorization: Bearer <token>` when a session token is stored.
#[derive(Debug)]
pub struct BearerAuth {
    session: Arc<Session>,
}

impl BearerAuth {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

impl Interceptor for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer_auth"
    }

    fn on_request(&self, headers: &mut HeaderMap) -> ApiResult<()> {
        let Some(token) = self.session.token() else {
            return Ok(());
        };

        let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            NormalizedError::unexpected("Stored session token is not a valid header value")
        })?;
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// 401: the session is gone. Clear it and send the user to login unless
/// they are already on an authentication screen. The failure is still
/// rejected to the caller.
pub struct SessionExpiry {
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    auth_paths: Vec<String>,
}

impl fmt::Debug for SessionExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionExpiry")
            .field("login_path", &self.login_path)
            .field("auth_paths", &self.auth_paths)
            .finish_non_exhaustive()
    }
}

impl SessionExpiry {
    pub fn new(
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
        auth_paths: Vec<String>,
    ) -> Self {
        Self {
            session,
            navigator,
            login_path: login_path.into(),
            auth_paths,
        }
    }
}

impl Interceptor for SessionExpiry {
    fn name(&self) -> &'static str {
        "session_expiry"
    }

    fn on_error(&self, failure: &Failure, attempt: &mut RequestAttempt) -> ErrorDecision {
        if !failure.error.is_auth_error() {
            return ErrorDecision::Continue;
        }

        self.session.sign_out();

        let current = self.navigator.current_path();
        let redirect = !is_auth_path(&current, &self.auth_paths);
        log_info!(
            request_id = %attempt.request_id(),
            current_path = %current,
            redirect = redirect,
            "Session rejected by service, signing out"
        );

        if redirect {
            self.navigator.navigate(&self.login_path);
        }
        ErrorDecision::Reject
    }
}

/// 403: never retried. Logged with `audit = true` for review.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForbiddenAudit;

impl Interceptor for ForbiddenAudit {
    fn name(&self) -> &'static str {
        "forbidden_audit"
    }

    fn on_error(&self, failure: &Failure, attempt: &mut RequestAttempt) -> ErrorDecision {
        if !failure.error.is_forbidden() {
            return ErrorDecision::Continue;
        }

        log_warn!(
            audit = true,
            request_id = %attempt.request_id(),
            message = %failure.error.message(),
            "Access forbidden"
        );
        ErrorDecision::Reject
    }
}

/// Resubmits failures of one [`RetryCategory`] with backoff until the
/// category's counter reaches `max_retries`.
#[derive(Debug, Clone)]
pub struct RetryOnFailure {
    category: RetryCategory,
    policy: RetryPolicy,
}

impl RetryOnFailure {
    pub fn new(category: RetryCategory, policy: RetryPolicy) -> Self {
        Self { category, policy }
    }
}

impl Interceptor for RetryOnFailure {
    fn name(&self) -> &'static str {
        match self.category {
            RetryCategory::RateLimited => "retry_rate_limited",
            RetryCategory::ServerError => "retry_server_error",
            RetryCategory::NoResponse => "retry_no_response",
        }
    }

    fn on_error(&self, failure: &Failure, attempt: &mut RequestAttempt) -> ErrorDecision {
        if !self.category.matches(&failure.error) {
            return ErrorDecision::Continue;
        }

        match self
            .policy
            .next_retry(self.category, attempt, failure.retry_after)
        {
            Some(delay) => ErrorDecision::Retry(delay),
            None => {
                log_warn!(
                    request_id = %attempt.request_id(),
                    category = self.category.as_str(),
                    retries = attempt.retry_count(self.category),
                    status = failure.error.status_code(),
                    "Retries exhausted"
                );
                ErrorDecision::Reject
            }
        }
    }
}
