//! Provider transport over HTTP
//!
//! - Vendor request/response bodies
//! - Retry with exponential backoff for transient failures
//! - `ProviderClient` port implementation

pub mod http_client;
pub mod retry;
pub mod wire;

pub use http_client::HttpProviderClient;
pub use retry::RetryPolicy;
