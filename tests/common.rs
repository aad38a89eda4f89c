//! Test helper utilities for recipe-client integration tests
//!
//! Builds clients and services against a wiremock server with retry
//! timings short enough to keep the suite fast.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use recipe_client::{
    ApiClient, ClientConfig, MemoryNavigator, MemoryNotifier, MemoryQueryCache, QueryCache,
    RecipeService, RetryPolicy, Session,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{MockServer, Request};

/// Retry policy with millisecond delays.
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(10),
        backoff_multiplier: 2.0,
        max_delay: Duration::from_millis(100),
        jitter: 0.0,
        request_timeout: Duration::from_secs(2),
        honor_retry_after: true,
    }
}

pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(format!("{}/api", server.uri())).with_retry_policy(fast_retry_policy())
}

/// Everything a test may want to inspect after driving the client.
pub struct TestHarness {
    pub session: Arc<Session>,
    pub navigator: Arc<MemoryNavigator>,
    pub cache: Arc<MemoryQueryCache>,
    pub notifier: Arc<MemoryNotifier>,
}

impl TestHarness {
    /// Signed out, currently on `/dashboard/recipes`.
    pub fn new() -> Self {
        Self {
            session: Arc::new(Session::in_memory()),
            navigator: Arc::new(MemoryNavigator::new("/dashboard/recipes")),
            cache: Arc::new(MemoryQueryCache::new()),
            notifier: Arc::new(MemoryNotifier::new()),
        }
    }

    pub fn signed_in(token: &str) -> Self {
        let harness = Self::new();
        harness.session.sign_in(token, None);
        harness
    }

    pub fn on_path(self, path: &str) -> Self {
        Self {
            navigator: Arc::new(MemoryNavigator::new(path)),
            ..self
        }
    }

    pub fn client(&self, config: ClientConfig) -> Arc<ApiClient> {
        Arc::new(
            ApiClient::new(config, self.session.clone(), self.navigator.clone())
                .expect("test config is valid"),
        )
    }

    pub fn service(&self, config: ClientConfig) -> RecipeService {
        let cache: Arc<dyn QueryCache> = self.cache.clone();
        RecipeService::new(
            config,
            self.session.clone(),
            self.navigator.clone(),
            cache,
            self.notifier.clone(),
        )
        .expect("test config is valid")
    }
}

/// A base URL nothing listens on.
pub fn unreachable_config() -> ClientConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    ClientConfig::new(format!("http://127.0.0.1:{port}/api")).with_retry_policy(fast_retry_policy())
}

pub async fn received(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}
