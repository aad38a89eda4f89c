use crate::error::{classify, NormalizedError, RawFault};
use crate::retry::{parse_retry_after_at, RequestAttempt, RetryCategory, RetryPolicy};
use chrono::{TimeZone, Utc};
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to create fast test retry policy to prevent slow tests
    fn create_fast_test_retry_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(50),
            jitter: 0.0,
            request_timeout: Duration::from_millis(200),
            honor_retry_after: true,
        }
    }

    // Unit Tests for RetryPolicy
    //
    // UNIT UNDER TEST: RetryPolicy (concrete implementation)
    //
    // BUSINESS RESPONSIBILITY:
    //   - Defines the exponential backoff progression (1s, 2s, 4s)
    //   - Caps every wait, including server-supplied hints
    //   - Limits retries per failure category for one logical call
    //
    // TEST COVERAGE:
    //   - Default configuration values
    //   - Backoff progression and ceiling
    //   - retry-after precedence
    //   - Per-category retry ceilings

    #[test]
    fn test_retry_policy_defaults_match_production_requirements() {
        // Arrange
        let policy = RetryPolicy::default();

        // Act & Assert
        assert_eq!(policy.max_retries, 3, "Should retry each category 3 times");
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.backoff_multiplier, 2.0);
        assert_eq!(policy.request_timeout, Duration::from_secs(30));
        assert_eq!(policy.jitter, 0.0, "Jitter should be off by default");
        assert!(policy.honor_retry_after);
    }

    #[test]
    fn test_backoff_doubles_from_one_second() {
        // Arrange
        let policy = RetryPolicy::default();

        // Act
        let delays: Vec<Duration> = (0..3).map(|n| policy.backoff_delay(n)).collect();

        // Assert
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[test]
    fn test_backoff_is_capped_at_max_delay() {
        // Arrange
        let policy = create_fast_test_retry_policy();

        // Act
        let delay = policy.backoff_delay(10);

        // Assert
        assert_eq!(delay, Duration::from_millis(50));
    }

    #[test]
    fn test_jitter_only_lengthens_the_delay() {
        // Arrange
        let policy = RetryPolicy {
            jitter: 0.5,
            ..RetryPolicy::default()
        };

        for _ in 0..20 {
            // Act
            let delay = policy.backoff_delay(0);

            // Assert
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_jittered_delay_never_exceeds_max_delay() {
        // Arrange
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(1000),
            jitter: 1.0,
            ..RetryPolicy::default()
        };

        for retry_count in 0..5 {
            // Act
            let delay = policy.backoff_delay(retry_count);

            // Assert
            assert_eq!(delay, Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_retry_after_overrides_backoff_when_honored() {
        // Arrange
        let policy = RetryPolicy::default();
        let ignoring = RetryPolicy {
            honor_retry_after: false,
            ..RetryPolicy::default()
        };

        // Act & Assert
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(600))),
            Duration::from_secs(30),
            "Hints are capped at max_delay"
        );
        assert_eq!(
            ignoring.delay_for(1, Some(Duration::from_secs(5))),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_next_retry_stops_after_max_retries_per_category() {
        // Arrange
        let policy = create_fast_test_retry_policy();
        let mut attempt = RequestAttempt::new();

        // Act
        let granted: Vec<Option<Duration>> = (0..4)
            .map(|_| policy.next_retry(RetryCategory::ServerError, &mut attempt, None))
            .collect();

        // Assert
        assert_eq!(
            granted,
            vec![
                Some(Duration::from_millis(10)),
                Some(Duration::from_millis(20)),
                Some(Duration::from_millis(40)),
                None
            ]
        );
        assert_eq!(attempt.retry_count(RetryCategory::ServerError), 3);
    }

    #[test]
    fn test_categories_keep_independent_counters() {
        // Test pins the ceiling for alternating failures: each category has
        // its own budget, so one call may see 1 + 3 * 3 attempts at most

        // Arrange
        let policy = create_fast_test_retry_policy();
        let mut attempt = RequestAttempt::new();
        for _ in 0..3 {
            policy.next_retry(RetryCategory::RateLimited, &mut attempt, None);
        }

        // Act
        let rate_limited = policy.next_retry(RetryCategory::RateLimited, &mut attempt, None);
        let server = policy.next_retry(RetryCategory::ServerError, &mut attempt, None);

        // Assert
        assert!(rate_limited.is_none());
        assert_eq!(server, Some(Duration::from_millis(10)));
        assert_eq!(attempt.total_retries(), 4);
    }

    #[test]
    fn test_no_retries_policy_refuses_first_retry() {
        // Arrange
        let policy = RetryPolicy::no_retries();
        let mut attempt = RequestAttempt::new();

        // Act & Assert
        assert!(policy
            .next_retry(RetryCategory::NoResponse, &mut attempt, None)
            .is_none());
    }

    // Unit Tests for RetryCategory and retry-after parsing
    //
    // UNIT UNDER TEST: RetryCategory::matches, parse_retry_after_at
    //
    // BUSINESS RESPONSIBILITY:
    //   - Routes each retryable fault to exactly one counter
    //   - Reads both retry-after formats a service may send
    //
    // TEST COVERAGE:
    //   - 429, 5xx, network and timeout routing
    //   - Delta-seconds, HTTP-date, past dates and garbage

    #[test]
    fn test_categories_match_their_faults() {
        // Arrange
        let rate_limited = NormalizedError::from_response(429, None, None);
        let server = NormalizedError::from_response(502, None, None);
        let network = classify(RawFault::Network { message: None });
        let timeout = classify(RawFault::Deadline);
        let not_found = NormalizedError::from_response(404, None, None);

        // Assert
        assert!(RetryCategory::RateLimited.matches(&rate_limited));
        assert!(RetryCategory::ServerError.matches(&server));
        assert!(RetryCategory::NoResponse.matches(&network));
        assert!(RetryCategory::NoResponse.matches(&timeout));
        assert!(RetryCategory::ALL
            .iter()
            .all(|category| !category.matches(&not_found)));
    }

    #[test]
    fn test_parse_retry_after_formats() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();

        // Act & Assert
        assert_eq!(
            parse_retry_after_at("120", now),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            parse_retry_after_at("Wed, 21 Oct 2015 07:28:30 GMT", now),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            parse_retry_after_at("Wed, 21 Oct 2015 07:00:00 GMT", now),
            Some(Duration::ZERO),
            "Past dates mean retry now"
        );
        assert_eq!(parse_retry_after_at("soon", now), None);
        assert_eq!(parse_retry_after_at("  ", now), None);
    }

    #[test]
    fn test_request_attempt_counts_dispatches_under_one_id() {
        // Arrange
        let mut attempt = RequestAttempt::new();
        let id = attempt.request_id();

        // Act
        attempt.record_dispatch();
        let second = attempt.record_dispatch();

        // Assert
        assert_eq!(second, 2);
        assert_eq!(attempt.dispatches(), 2);
        assert_eq!(attempt.request_id(), id);
    }
}
