use crate::config::{ClientConfig, ConfigError};
use crate::error::{classify, ApiResult, RawFault};
use crate::interceptors::{ErrorDecision, Failure, InterceptorChain};
use crate::logging::{log_debug, log_warn};
use crate::navigation::Navigator;
use crate::request::{ApiRequest, ApiResponse, RequestBody};
use crate::retry::{parse_retry_after, RequestAttempt, RetryPolicy};
use crate::session::Session;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::sleep;

/// Header carrying the per-call correlation id. Identical on every retry.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client core for the recipe service.
///
/// Every call runs through the [`InterceptorChain`]: credentials are
/// attached on the way out, failures are classified and then either
/// retried after a backoff or surfaced as a
/// [`NormalizedError`](crate::NormalizedError). Retries of one call are
/// strictly sequential; only one physical attempt is ever in flight.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
    session: Arc<Session>,
    interceptors: InterceptorChain,
}

impl ApiClient {
    /// Build a client with the standard interceptor chain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid or the HTTP
    /// client cannot be initialised.
    pub fn new(
        config: ClientConfig,
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ConfigError> {
        let interceptors = InterceptorChain::standard(&config, session.clone(), navigator);
        Self::with_interceptors(config, session, interceptors)
    }

    /// Build a client with a caller-assembled interceptor chain.
    pub fn with_interceptors(
        config: ClientConfig,
        session: Arc<Session>,
        interceptors: InterceptorChain,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        log_debug!(
            base_url = %config.base_url,
            max_retries = config.retry_policy.max_retries,
            request_timeout_ms = config.retry_policy.request_timeout.as_millis() as u64,
            interceptors = ?interceptors.names(),
            "ApiClient created"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            policy: config.retry_policy,
            session,
            interceptors,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Send a request, retrying transient failures per the retry policy.
    ///
    /// The caller only ever sees the final outcome.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let mut attempt = RequestAttempt::new();

        loop {
            let dispatch = attempt.record_dispatch();
            let failure = match self.dispatch(&request, &attempt).await {
                Ok(response) => {
                    log_debug!(
                        request_id = %attempt.request_id(),
                        method = %request.method(),
                        path = %request.path(),
                        status = response.status(),
                        dispatches = dispatch,
                        elapsed_ms = attempt.elapsed().as_millis() as u64,
                        "Request succeeded"
                    );
                    return Ok(response);
                }
                Err(failure) => failure,
            };

            match self.interceptors.resolve(&failure, &mut attempt) {
                ErrorDecision::Retry(delay) => sleep(delay).await,
                ErrorDecision::Reject | ErrorDecision::Continue => {
                    log_warn!(
                        request_id = %attempt.request_id(),
                        method = %request.method(),
                        path = %request.path(),
                        status = failure.error.status_code(),
                        network = failure.error.is_network_error(),
                        timeout = failure.error.is_timeout_error(),
                        dispatches = dispatch,
                        retries = attempt.total_retries(),
                        message = %failure.error.message(),
                        "Request failed"
                    );
                    return Err(failure.error);
                }
            }
        }
    }

    /// Send and decode the JSON body as `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        self.send(request).await?.json()
    }

    /// Send and discard the body.
    pub async fn send_empty(&self, request: ApiRequest) -> ApiResult<()> {
        self.send(request).await.map(|_| ())
    }

    /// One physical attempt under the request deadline.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        attempt: &RequestAttempt,
    ) -> Result<ApiResponse, Failure> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&attempt.request_id().to_string()) {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        self.interceptors.prepare(&mut headers)?;

        let mut builder = self
            .http
            .request(request.method().clone(), self.url(request.path()))
            .headers(headers);
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(body) => builder.multipart(body.to_form()?),
        };

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, body.to_vec()))
        };

        let (status, headers, body) =
            match tokio::time::timeout(self.policy.request_timeout, exchange).await {
                Ok(Ok(parts)) => parts,
                Ok(Err(e)) => {
                    log_debug!(request_id = %attempt.request_id(), error = %e, "Transport failure");
                    return Err(Failure::new(classify(e)));
                }
                Err(_elapsed) => return Err(Failure::new(classify(RawFault::Deadline))),
            };

        if (200..300).contains(&status) {
            return Ok(ApiResponse::new(status, headers, body));
        }

        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        let error = classify(RawFault::Response {
            status,
            body: decode_error_body(&body),
        });

        Err(Failure::new(error).with_retry_after(retry_after))
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// JSON when the body parses, otherwise the text itself, `None` when empty.
fn decode_error_body(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(body)
        .ok()
        .or_else(|| Some(Value::String(String::from_utf8_lossy(body).into_owned())))
}
