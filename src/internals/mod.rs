//! Internal machinery for recipe-client
//!
//! Implementation details of the HTTP client. `RetryPolicy` and friends are
//! re-exported through `lib.rs` as `recipe_client::retry`.

pub mod retry;
