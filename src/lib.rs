//! # recipe-client
//!
//! Data-access layer for the recipe manager: a REST client for the recipe
//! service with uniform error classification, automatic retry of transient
//! failures, session handling and optimistic cache mutations.
//!
//! ## Key Features
//!
//! - **Error classification**: every failure becomes one [`NormalizedError`]
//! - **Resilience**: exponential backoff and `retry-after` for 429, 5xx,
//!   network failures and timeouts
//! - **Session handling**: bearer token on every request, sign-out and
//!   redirect on 401
//! - **Optimistic mutations**: snapshot, speculate, rollback on failure,
//!   invalidate on settle
//!
//! ## Example
//!
//! ```rust,no_run
//! use recipe_client::{
//!     ClientConfig, MemoryNavigator, MemoryQueryCache, RecipeService, Session, TracingNotifier,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = RecipeService::new(
//!     ClientConfig::new("http://localhost:5000/api"),
//!     Arc::new(Session::in_memory()),
//!     Arc::new(MemoryNavigator::default()),
//!     Arc::new(MemoryQueryCache::new()),
//!     Arc::new(TracingNotifier),
//! )?;
//!
//! service.users().login("cook@example.com", "secret").await?;
//! service.load_favorites().await?;
//! service.mutations().add_favorite(42).await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_errors_doc)]

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod interceptors;
pub mod internals;
pub mod mutation;
pub mod mutations;
pub mod navigation;
pub mod notify;
pub mod request;
pub mod resources;
pub mod service;
pub mod session;
pub mod types;

pub use internals::retry;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use cache::{MemoryQueryCache, QueryCache, QueryCacheExt, QueryKey};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{
    classify, ApiResult, ErrorCategory, ErrorSeverity, FaultKind, NormalizedError, RawFault,
    ValidationErrors,
};
pub use interceptors::{ErrorDecision, Failure, Interceptor, InterceptorChain};
pub use mutation::{MutationCoordinator, OptimisticContext, OptimisticMutation};
pub use mutations::{CollectionMutation, ListEdit, Mutations};
pub use navigation::{MemoryNavigator, Navigator};
pub use notify::{MemoryNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use request::{ApiRequest, ApiResponse, Attachment, MultipartBody};
pub use resources::{CategoriesApi, FavoritesApi, RecipesApi, TagsApi, UsersApi};
pub use retry::{RequestAttempt, RetryCategory, RetryPolicy};
pub use service::RecipeService;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use types::{
    Category, CategoryInput, Favorite, Recipe, RecipeInput, RecipeQuery, Tag, User, UserInput,
};
