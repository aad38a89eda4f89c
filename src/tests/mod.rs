// Test modules for recipe-client crate
//
// Each source file has a corresponding test file that focuses on business
// logic verification. HTTP behaviour against a live mock server lives in
// the integration tests under tests/.

pub mod config;
pub mod interceptors;
pub mod request;
pub mod retry;
