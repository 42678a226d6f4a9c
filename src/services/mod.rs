//! Service layer: the patrol core.
//!
//! - RateGate: sliding-window limit on autonomous actions
//! - RoleRouter: role → provider routing with decision logging
//! - ContextAssembler: knowledge context for pipeline prompts
//! - DriftPipeline: plan, critique, dispatch, log
//! - PatrolScheduler: the periodic loop

pub mod bounded;
pub mod drift_pipeline;
pub mod knowledge_context;
pub mod patrol_scheduler;
pub mod rate_gate;
pub mod role_router;
pub mod scenarios;

pub use drift_pipeline::{critique_prompt, DriftPipeline, PipelineSettings};
pub use knowledge_context::ContextAssembler;
pub use patrol_scheduler::{PatrolScheduler, PatrolSettings, ScenarioRun, TickReport};
pub use rate_gate::{GateState, RateGate};
pub use role_router::{CallMetadata, RoleOutcome, RoleRouter, ERROR_MARKER};
pub use scenarios::SCENARIOS;
