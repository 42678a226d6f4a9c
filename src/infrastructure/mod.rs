//! Infrastructure layer module
//!
//! Adapters satisfying the domain ports, plus process plumbing:
//! - Configuration loading (figment)
//! - Logging setup (tracing-subscriber, tracing-appender)
//! - Provider HTTP client for Anthropic, OpenAI and Gemini
//! - Fleet manifest and manifest-driven health scanning
//! - Inbox-file task dispatch
//! - In-process knowledge graph

pub mod config;
pub mod dispatch;
pub mod fleet;
pub mod knowledge;
pub mod logging;
pub mod providers;
