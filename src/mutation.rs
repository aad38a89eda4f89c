//! Optimistic mutation coordination.
//!
//! Every state-changing operation follows the same sequence:
//!
//! 1. snapshot the cached view of the target collection
//! 2. write the speculative view so the screen updates immediately
//! 3. dispatch the remote call
//! 4. success: drop the snapshot. failure: restore it and notify the user once
//! 5. either way: invalidate the affected keys so the next read re-fetches
//!
//! Steps 1 and 2 run synchronously before the dispatch future is first
//! polled. Nothing here retries; the HTTP client already did.
//!
//! Concurrent mutations on the same key are not serialized. Whichever
//! settles last decides the cached value until the invalidation-triggered
//! re-fetch replaces it with the service's state.

use crate::cache::{QueryCache, QueryKey};
use crate::error::ApiResult;
use crate::logging::{log_debug, log_warn};
use crate::notify::{NotificationLevel, Notifier};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// One optimistic state change.
#[async_trait]
pub trait OptimisticMutation: Send + Sized {
    type Output: Send;

    /// Short name for logs.
    fn label(&self) -> &str;

    /// Cache entry that is snapshotted and speculatively updated.
    fn target(&self) -> QueryKey;

    /// Patterns invalidated once the mutation settles.
    fn invalidates(&self) -> Vec<QueryKey> {
        vec![self.target()]
    }

    /// The speculative view given the current one. `None` leaves the cache
    /// untouched.
    fn speculate(&self, current: Option<&Value>) -> Option<Value>;

    /// Message for the success notification, if any.
    fn success_message(&self) -> Option<String> {
        None
    }

    /// Issue the remote call.
    async fn dispatch(self) -> ApiResult<Self::Output>;
}

/// Snapshot and rollback for one mutation.
///
/// Consumed at settlement by [`commit`](Self::commit) or
/// [`rollback`](Self::rollback).
pub struct OptimisticContext<'c> {
    cache: &'c dyn QueryCache,
    key: QueryKey,
    snapshot: Option<Value>,
    speculated: bool,
}

impl<'c> OptimisticContext<'c> {
    /// Take the snapshot and apply the speculative update.
    pub fn begin<F>(cache: &'c dyn QueryCache, key: QueryKey, speculate: F) -> Self
    where
        F: FnOnce(Option<&Value>) -> Option<Value>,
    {
        let snapshot = cache.read(&key);
        let speculative = speculate(snapshot.as_ref());
        let speculated = speculative.is_some();
        if let Some(value) = speculative {
            cache.write(&key, value);
        }

        Self {
            cache,
            key,
            snapshot,
            speculated,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn snapshot(&self) -> Option<&Value> {
        self.snapshot.as_ref()
    }

    /// The speculative value stays until invalidation re-fetches.
    pub fn commit(self) {}

    /// Put the snapshot back. If nothing was cached before, the speculative
    /// entry is invalidated instead since there is no value to restore.
    pub fn rollback(self) {
        if !self.speculated {
            return;
        }
        match self.snapshot {
            Some(snapshot) => self.cache.write(&self.key, snapshot),
            None => self.cache.invalidate(&self.key),
        }
    }
}

/// Runs [`OptimisticMutation`]s against a cache and a notifier.
#[derive(Clone)]
pub struct MutationCoordinator {
    cache: Arc<dyn QueryCache>,
    notifier: Arc<dyn Notifier>,
}

impl MutationCoordinator {
    pub fn new(cache: Arc<dyn QueryCache>, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, notifier }
    }

    pub fn cache(&self) -> &Arc<dyn QueryCache> {
        &self.cache
    }

    pub async fn run<M: OptimisticMutation>(&self, mutation: M) -> ApiResult<M::Output> {
        let label = mutation.label().to_string();
        let invalidates = mutation.invalidates();
        let success_message = mutation.success_message();

        let context = OptimisticContext::begin(self.cache.as_ref(), mutation.target(), |current| {
            mutation.speculate(current)
        });
        log_debug!(
            mutation = %label,
            key = %context.key(),
            had_snapshot = context.snapshot().is_some(),
            "Optimistic update applied"
        );

        let result = mutation.dispatch().await;

        match &result {
            Ok(_) => {
                context.commit();
                if let Some(message) = success_message {
                    self.notifier.notify(NotificationLevel::Success, &message);
                }
            }
            Err(error) => {
                context.rollback();
                log_warn!(
                    mutation = %label,
                    status = error.status_code(),
                    message = %error.message(),
                    "Mutation failed, optimistic update rolled back"
                );
                self.notifier
                    .notify(NotificationLevel::Error, &error.user_message());
            }
        }

        for pattern in &invalidates {
            self.cache.invalidate(pattern);
        }

        result
    }
}
