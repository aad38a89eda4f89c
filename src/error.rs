//! Error classification for the recipe service data-access layer.
//!
//! Every failure a request can hit (a refused connection, an elapsed deadline,
//! an unreadable body, a structured error payload from the service) is
//! converted into a single [`NormalizedError`] by [`classify`]. Nothing above
//! the HTTP client ever sees a raw transport error.
//!
//! # Taxonomy
//!
//! | Fault | `status_code` | Flags | Retryable |
//! |-------|---------------|-------|-----------|
//! | Network failure, no response | 0 | `is_network_error` | Yes |
//! | Deadline elapsed | 0 | `is_timeout_error` | Yes |
//! | 401 / 403 / 404 / other 4xx | status | none | No |
//! | 429 | 429 | none | Yes |
//! | 5xx | status | none | Yes |
//! | Unrecognized fault | 0 | none | No |
//!
//! # Example
//!
//! ```rust
//! use recipe_client::error::{classify, RawFault};
//!
//! let err = classify(RawFault::Deadline);
//! assert!(err.is_timeout_error());
//! assert!(err.is_retryable());
//! assert_eq!(err.user_message(), "The request took too long to complete. Please try again.");
//! ```

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default copy for a request that never reached the service.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Default copy for a request that exceeded its deadline.
pub const TIMEOUT_ERROR_MESSAGE: &str = "Request timed out. Please try again.";

/// Copy used when a fault carries nothing usable.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Field name → ordered messages, as reported by the service for a rejected form.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

/// Result alias used by every request path.
///
/// # Example
///
/// ```rust
/// use recipe_client::ApiResult;
///
/// fn recipe_title(raw: &str) -> ApiResult<String> {
///     Ok(raw.trim().to_string())
/// }
/// ```
pub type ApiResult<T> = std::result::Result<T, NormalizedError>;

// ============================================================================
// Categorization
// ============================================================================

/// High-level categorization for routing and alerting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller can fix it: bad input, missing auth, unknown resource.
    Client,

    /// Temporary: network, timeout, rate limiting. Retried by the client.
    Transient,

    /// The service failed (5xx).
    External,

    /// Something unexpected on this side: unreadable body, unknown fault shape.
    Internal,
}

/// Severity level for logging decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Action failed and is worth investigating.
    Error,

    /// Unexpected but recoverable.
    Warning,

    /// Expected failure such as a validation rejection or a 404.
    Info,
}

/// The protocol/transport classification of a [`NormalizedError`].
///
/// Computed from the stored fields, never stored itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Network,
    Timeout,
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    /// Any other 4xx.
    Client,
    Server,
    /// No response and no transport flag: an unrecognized fault.
    Unexpected,
}

// ============================================================================
// NormalizedError
// ============================================================================

/// The single error shape every request failure is converted to.
///
/// Exactly one of "received an HTTP response" (`status_code > 0`),
/// [`is_network_error`](Self::is_network_error) and
/// [`is_timeout_error`](Self::is_timeout_error) holds, except for
/// unrecognized faults where all three are false. The constructors are the
/// only way to build one, so the invariant cannot be broken from outside.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct NormalizedError {
    status_code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_errors: Option<ValidationErrors>,
    is_network_error: bool,
    is_timeout_error: bool,
}

impl NormalizedError {
    /// A transport failure where no response was received.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            message: non_empty_or(message.into(), NETWORK_ERROR_MESSAGE),
            validation_errors: None,
            is_network_error: true,
            is_timeout_error: false,
        }
    }

    /// A request aborted because its deadline elapsed.
    pub fn timeout() -> Self {
        Self {
            status_code: 0,
            message: TIMEOUT_ERROR_MESSAGE.to_string(),
            validation_errors: None,
            is_network_error: false,
            is_timeout_error: true,
        }
    }

    /// A failure that received an HTTP response.
    ///
    /// `message` falls back to a generic status line when the service gave
    /// none. Field errors are only kept for 4xx responses. A status of 0
    /// cannot describe a response and is treated as an unexpected fault.
    pub fn from_response(
        status_code: u16,
        message: Option<String>,
        validation_errors: Option<ValidationErrors>,
    ) -> Self {
        if status_code == 0 {
            return Self::unexpected(message.unwrap_or_default());
        }

        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status code {status_code}"));
        let validation_errors = validation_errors
            .filter(|errors| !errors.is_empty() && (400..500).contains(&status_code));

        Self {
            status_code,
            message,
            validation_errors,
            is_network_error: false,
            is_timeout_error: false,
        }
    }

    /// A fault that is neither a transport failure nor a response.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            message: non_empty_or(message.into(), UNEXPECTED_ERROR_MESSAGE),
            validation_errors: None,
            is_network_error: false,
            is_timeout_error: false,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        self.validation_errors.as_ref()
    }

    /// Messages reported for one form field, empty when there are none.
    pub fn field_errors(&self, field: &str) -> &[String] {
        self.validation_errors
            .as_ref()
            .and_then(|errors| errors.get(field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_network_error(&self) -> bool {
        self.is_network_error
    }

    pub fn is_timeout_error(&self) -> bool {
        self.is_timeout_error
    }

    /// Whether an HTTP response was received at all.
    pub fn has_response(&self) -> bool {
        self.status_code > 0
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    pub fn is_auth_error(&self) -> bool {
        self.status_code == 401
    }

    pub fn is_forbidden(&self) -> bool {
        self.status_code == 403
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code == 429
    }

    pub fn is_validation_error(&self) -> bool {
        self.is_client_error() && self.validation_errors.is_some()
    }

    /// Derived classification, checked most specific first.
    pub fn kind(&self) -> FaultKind {
        if self.is_network_error {
            return FaultKind::Network;
        }
        if self.is_timeout_error {
            return FaultKind::Timeout;
        }
        match self.status_code {
            0 => FaultKind::Unexpected,
            401 => FaultKind::Unauthorized,
            403 => FaultKind::Forbidden,
            404 => FaultKind::NotFound,
            429 => FaultKind::RateLimited,
            _ if self.is_validation_error() => FaultKind::Validation,
            _ if self.is_server_error() => FaultKind::Server,
            _ => FaultKind::Client,
        }
    }

    /// Whether the fault is transient and eligible for automatic resubmission.
    ///
    /// Network failures, timeouts, 429 and 5xx are retryable. Every other 4xx
    /// is a caller-fixable problem and terminal.
    pub fn is_retryable(&self) -> bool {
        self.is_network_error
            || self.is_timeout_error
            || self.is_rate_limited()
            || self.is_server_error()
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            FaultKind::Network | FaultKind::Timeout | FaultKind::RateLimited => {
                ErrorCategory::Transient
            }
            FaultKind::Server => ErrorCategory::External,
            FaultKind::Unexpected => ErrorCategory::Internal,
            _ => ErrorCategory::Client,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            FaultKind::Server | FaultKind::Unexpected | FaultKind::Forbidden => {
                ErrorSeverity::Error
            }
            FaultKind::Network | FaultKind::Timeout | FaultKind::RateLimited => {
                ErrorSeverity::Warning
            }
            FaultKind::Unauthorized
            | FaultKind::NotFound
            | FaultKind::Validation
            | FaultKind::Client => ErrorSeverity::Info,
        }
    }

    /// Copy suitable for the notification surface.
    ///
    /// This is the only place user-facing text is derived from the fault kind.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recipe_client::NormalizedError;
    ///
    /// let err = NormalizedError::from_response(503, None, None);
    /// assert_eq!(err.user_message(), "Something went wrong on our end. Please try again later.");
    /// ```
    pub fn user_message(&self) -> String {
        match self.kind() {
            FaultKind::Network => {
                "Unable to connect to the server. Please check your internet connection."
                    .to_string()
            }
            FaultKind::Timeout => {
                "The request took too long to complete. Please try again.".to_string()
            }
            FaultKind::RateLimited => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            FaultKind::Server => {
                "Something went wrong on our end. Please try again later.".to_string()
            }
            _ => self.message.clone(),
        }
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Free-function form of [`NormalizedError::user_message`].
pub fn user_message(error: &NormalizedError) -> String {
    error.user_message()
}

/// Free-function form of [`NormalizedError::is_retryable`].
pub fn is_retryable(error: &NormalizedError) -> bool {
    error.is_retryable()
}

// ============================================================================
// Raw faults and classification
// ============================================================================

/// Anything a request path can raise before classification.
#[derive(Debug)]
pub enum RawFault {
    /// Already classified; passed through unchanged.
    Normalized(NormalizedError),

    /// An error reported by the HTTP stack.
    Http(reqwest::Error),

    /// No response was received. `message` overrides the default copy.
    Network { message: Option<String> },

    /// The client-side deadline elapsed before the exchange completed.
    Deadline,

    /// The service answered with a failure status. `body` is the decoded
    /// payload: JSON when it parsed, otherwise the raw text as a string.
    Response { status: u16, body: Option<Value> },

    /// An ordinary error object raised on the success path.
    Error(anyhow::Error),

    /// A bare message.
    Message(String),

    /// A plain value of unknown shape.
    Value(Value),

    /// Nothing at all.
    Empty,
}

impl From<NormalizedError> for RawFault {
    fn from(error: NormalizedError) -> Self {
        Self::Normalized(error)
    }
}

impl From<reqwest::Error> for RawFault {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error)
    }
}

impl From<anyhow::Error> for RawFault {
    fn from(error: anyhow::Error) -> Self {
        Self::Error(error)
    }
}

impl From<serde_json::Error> for RawFault {
    fn from(error: serde_json::Error) -> Self {
        Self::Error(anyhow::Error::new(error))
    }
}

impl From<String> for RawFault {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for RawFault {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<Value> for RawFault {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::String(message) => Self::Message(message),
            other => Self::Value(other),
        }
    }
}

impl<T: Into<RawFault>> From<Option<T>> for RawFault {
    fn from(fault: Option<T>) -> Self {
        fault.map(Into::into).unwrap_or(Self::Empty)
    }
}

/// Convert any raised fault into a [`NormalizedError`].
///
/// Pure and total: it never panics, never logs and returns an already
/// normalized error unchanged, so `classify(classify(x)) == classify(x)`.
pub fn classify(fault: impl Into<RawFault>) -> NormalizedError {
    match fault.into() {
        RawFault::Normalized(error) => error,
        RawFault::Http(error) => classify_transport(&error),
        RawFault::Network { message } => {
            NormalizedError::network(message.unwrap_or_default())
        }
        RawFault::Deadline => NormalizedError::timeout(),
        RawFault::Response { status, body } => classify_response(status, body.as_ref()),
        RawFault::Error(error) => classify_error_object(error),
        RawFault::Message(message) => NormalizedError::unexpected(message),
        RawFault::Value(_) | RawFault::Empty => {
            NormalizedError::unexpected(UNEXPECTED_ERROR_MESSAGE)
        }
    }
}

fn classify_transport(error: &reqwest::Error) -> NormalizedError {
    if error.is_timeout() {
        return NormalizedError::timeout();
    }
    if let Some(status) = error.status() {
        return NormalizedError::from_response(status.as_u16(), None, None);
    }
    if error.is_connect() || error.is_request() || error.is_body() {
        return NormalizedError::network(NETWORK_ERROR_MESSAGE);
    }
    NormalizedError::unexpected(error.to_string())
}

fn classify_response(status: u16, body: Option<&Value>) -> NormalizedError {
    let message = body.and_then(payload_message);
    let validation_errors = body.and_then(payload_validation_errors);
    NormalizedError::from_response(status, message, validation_errors)
}

fn classify_error_object(error: anyhow::Error) -> NormalizedError {
    if let Some(normalized) = error.downcast_ref::<NormalizedError>() {
        return normalized.clone();
    }
    if let Some(transport) = error.downcast_ref::<reqwest::Error>() {
        return classify_transport(transport);
    }
    NormalizedError::unexpected(error.to_string())
}

/// The service's own summary: `message`, then `title`, then `detail`, or a
/// bare string body.
fn payload_message(body: &Value) -> Option<String> {
    let message = match body {
        Value::String(text) => Some(text.as_str()),
        Value::Object(map) => ["message", "title", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str)),
        _ => None,
    }?;

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// The `errors` object of a validation response, one message list per field.
fn payload_validation_errors(body: &Value) -> Option<ValidationErrors> {
    let errors = body.get("errors")?.as_object()?;

    let mut fields = ValidationErrors::new();
    for (field, messages) in errors {
        let messages: Vec<String> = match messages {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Value::String(message) => vec![message.clone()],
            _ => continue,
        };
        if !messages.is_empty() {
            fields.insert(field.clone(), messages);
        }
    }

    (!fields.is_empty()).then_some(fields)
}
