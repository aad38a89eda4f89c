// Unit Tests for the Interceptor Chain
//
// UNIT UNDER TEST: InterceptorChain::standard and its interceptors
//
// BUSINESS RESPONSIBILITY:
//   - Attaches the stored bearer token to every attempt
//   - Signs the user out on 401 and redirects unless already on an auth screen
//   - Rejects 403 without retrying
//   - Grants retries to 429, 5xx, network failures and timeouts until each
//     category is exhausted
//
// TEST COVERAGE:
//   - Header preparation with and without a session token
//   - 401 redirect decisions driven by the current path
//   - Terminal decisions for 403 and other 4xx
//   - Retry decisions and exhaustion for every retryable category

use crate::config::ClientConfig;
use crate::error::{classify, NormalizedError, RawFault};
use crate::interceptors::{ErrorDecision, Failure, InterceptorChain};
use crate::navigation::{MockNavigator, Navigator};
use crate::retry::{RequestAttempt, RetryCategory, RetryPolicy};
use crate::session::{MemorySessionStore, Session};

use mockall::predicate::eq;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> ClientConfig {
    ClientConfig::default().with_retry_policy(RetryPolicy {
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        ..RetryPolicy::default()
    })
}

fn signed_in_session() -> Arc<Session> {
    Arc::new(Session::new(Arc::new(MemorySessionStore::with_token(
        "token-123",
    ))))
}

fn chain_with(session: Arc<Session>, navigator: MockNavigator) -> InterceptorChain {
    let navigator: Arc<dyn Navigator> = Arc::new(navigator);
    InterceptorChain::standard(&fast_config(), session, navigator)
}

fn status_failure(status: u16) -> Failure {
    Failure::new(NormalizedError::from_response(status, None, None))
}

#[cfg(test)]
mod request_preparation_tests {
    use super::*;

    #[test]
    fn test_standard_chain_order() {
        // Arrange
        let chain = chain_with(signed_in_session(), MockNavigator::new());

        // Act & Assert
        assert_eq!(
            chain.names(),
            vec![
                "bearer_auth",
                "session_expiry",
                "forbidden_audit",
                "retry_rate_limited",
                "retry_server_error",
                "retry_no_response"
            ]
        );
    }

    #[test]
    fn test_bearer_token_is_attached_when_signed_in() {
        // Arrange
        let chain = chain_with(signed_in_session(), MockNavigator::new());
        let mut headers = HeaderMap::new();

        // Act
        chain.prepare(&mut headers).expect("prepare succeeds");

        // Assert
        assert_eq!(
            headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer token-123")
        );
    }

    #[test]
    fn test_no_authorization_header_without_token() {
        // Arrange
        let chain = chain_with(Arc::new(Session::in_memory()), MockNavigator::new());
        let mut headers = HeaderMap::new();

        // Act
        chain.prepare(&mut headers).expect("prepare succeeds");

        // Assert
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_token_with_newline_is_rejected_before_dispatch() {
        // Arrange
        let session = Arc::new(Session::new(Arc::new(MemorySessionStore::with_token(
            "bad\ntoken",
        ))));
        let chain = chain_with(session, MockNavigator::new());
        let mut headers = HeaderMap::new();

        // Act
        let result = chain.prepare(&mut headers);

        // Assert
        let error = result.expect_err("invalid header value must fail");
        assert_eq!(error.status_code(), 0);
        assert!(!error.is_retryable());
    }
}

#[cfg(test)]
mod session_expiry_tests {
    use super::*;

    #[test]
    fn test_unauthorized_on_dashboard_signs_out_and_redirects() {
        // Test verifies an expired session off the auth screens clears the
        // token and sends the user to the login screen exactly once

        // Arrange
        let session = signed_in_session();
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .return_const("/dashboard/recipes".to_string());
        navigator
            .expect_navigate()
            .with(eq("/login"))
            .times(1)
            .return_const(());
        let chain = chain_with(session.clone(), navigator);
        let mut attempt = RequestAttempt::new();

        // Act
        let decision = chain.resolve(&status_failure(401), &mut attempt);

        // Assert
        assert_eq!(decision, ErrorDecision::Reject);
        assert!(session.token().is_none(), "Token must be cleared");
        assert_eq!(attempt.total_retries(), 0);
    }

    #[test]
    fn test_unauthorized_on_login_screen_does_not_redirect() {
        // Arrange
        let session = signed_in_session();
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .return_const("/login".to_string());
        navigator.expect_navigate().times(0);
        let chain = chain_with(session.clone(), navigator);

        // Act
        let decision = chain.resolve(&status_failure(401), &mut RequestAttempt::new());

        // Assert
        assert_eq!(decision, ErrorDecision::Reject);
        assert!(session.token().is_none());
    }

    #[test]
    fn test_unauthorized_on_nested_auth_screen_does_not_redirect() {
        // Arrange
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .return_const("/reset-password/abc?email=a@b.c".to_string());
        navigator.expect_navigate().times(0);
        let chain = chain_with(signed_in_session(), navigator);

        // Act
        let decision = chain.resolve(&status_failure(401), &mut RequestAttempt::new());

        // Assert
        assert_eq!(decision, ErrorDecision::Reject);
    }
}

#[cfg(test)]
mod error_decision_tests {
    use super::*;

    #[test]
    fn test_forbidden_is_rejected_without_touching_session() {
        // Arrange
        let session = signed_in_session();
        let chain = chain_with(session.clone(), MockNavigator::new());
        let mut attempt = RequestAttempt::new();

        // Act
        let decision = chain.resolve(&status_failure(403), &mut attempt);

        // Assert
        assert_eq!(decision, ErrorDecision::Reject);
        assert!(session.token().is_some(), "403 must not sign the user out");
        assert_eq!(attempt.total_retries(), 0);
    }

    #[test]
    fn test_other_client_errors_are_rejected_immediately() {
        // Arrange
        let chain = chain_with(signed_in_session(), MockNavigator::new());

        for status in [400, 404, 409, 422] {
            let mut attempt = RequestAttempt::new();

            // Act
            let decision = chain.resolve(&status_failure(status), &mut attempt);

            // Assert
            assert_eq!(decision, ErrorDecision::Reject, "{status} is terminal");
            assert_eq!(attempt.total_retries(), 0);
        }
    }

    #[test]
    fn test_server_errors_retry_until_exhausted() {
        // Arrange
        let chain = chain_with(signed_in_session(), MockNavigator::new());
        let mut attempt = RequestAttempt::new();
        let failure = status_failure(503);

        // Act
        let decisions: Vec<ErrorDecision> =
            (0..4).map(|_| chain.resolve(&failure, &mut attempt)).collect();

        // Assert
        assert_eq!(
            decisions,
            vec![
                ErrorDecision::Retry(Duration::from_millis(10)),
                ErrorDecision::Retry(Duration::from_millis(20)),
                ErrorDecision::Retry(Duration::from_millis(40)),
                ErrorDecision::Reject
            ]
        );
        assert_eq!(attempt.retry_count(RetryCategory::ServerError), 3);
    }

    #[test]
    fn test_rate_limit_honors_retry_after() {
        // Arrange
        let chain = chain_with(signed_in_session(), MockNavigator::new());
        let failure = status_failure(429).with_retry_after(Some(Duration::from_millis(35)));

        // Act
        let decision = chain.resolve(&failure, &mut RequestAttempt::new());

        // Assert
        assert_eq!(decision, ErrorDecision::Retry(Duration::from_millis(35)));
    }

    #[test]
    fn test_network_and_timeout_share_the_no_response_budget() {
        // Arrange
        let chain = chain_with(signed_in_session(), MockNavigator::new());
        let mut attempt = RequestAttempt::new();
        let network = Failure::new(classify(RawFault::Network { message: None }));
        let timeout = Failure::new(classify(RawFault::Deadline));

        // Act
        chain.resolve(&network, &mut attempt);
        chain.resolve(&timeout, &mut attempt);
        chain.resolve(&network, &mut attempt);
        let fourth = chain.resolve(&timeout, &mut attempt);

        // Assert
        assert_eq!(fourth, ErrorDecision::Reject);
        assert_eq!(attempt.retry_count(RetryCategory::NoResponse), 3);
    }

    #[test]
    fn test_unexpected_faults_are_rejected() {
        // Arrange
        let chain = InterceptorChain::new();
        let failure = Failure::new(classify(RawFault::Empty));

        // Act & Assert
        assert_eq!(
            chain.resolve(&failure, &mut RequestAttempt::new()),
            ErrorDecision::Reject
        );
    }
}
