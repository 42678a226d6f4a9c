//! Nightwatch - autonomous fleet patrol
//!
//! A periodic patrol over a fleet of managed projects. Each tick scans
//! project health; drifted projects go through a plan and critique pipeline
//! staffed by model-backed roles and the resulting task is dispatched to the
//! project. A sliding-window rate gate bounds how many runs start per window,
//! and a calm fleet occasionally runs a "dream" scenario aimed at the
//! metasystem itself.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): rate gate, role router, pipeline, scheduler
//! - **Infrastructure Layer** (`infrastructure`): config, logging and adapters
//! - **Application Layer** (`application`): runtime assembly
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use nightwatch::application::PatrolRuntime;
//! use nightwatch::infrastructure::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = PatrolRuntime::from_config(ConfigLoader::load()?)?;
//!     let report = runtime.scheduler.tick().await;
//!     println!("dispatched {}", report.dispatched());
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use application::{Collaborators, PatrolRuntime};
pub use domain::models::{
    Config, HealthStatus, PipelinePhase, PipelineReport, ProjectHealth, Role, Scenario,
};
pub use domain::ports::{HealthScanner, KnowledgeGraph, ProviderClient, TaskDispatcher};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DriftPipeline, PatrolScheduler, RateGate, RoleRouter, TickReport};
