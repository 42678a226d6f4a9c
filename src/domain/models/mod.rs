pub mod config;
pub mod dispatch;
pub mod health;
pub mod knowledge;
pub mod pipeline;
pub mod role;
pub mod scenario;

pub use config::{
    Config, EndpointConfig, FleetConfig, KnowledgeConfig, LoggingConfig, PatrolConfig,
    ProvidersConfig, RateGateConfig, TimeoutConfig,
};
pub use dispatch::{DispatchReceipt, DispatchRecord};
pub use health::{HealthStatus, ProjectHealth};
pub use knowledge::{Decision, DecisionCategory, DecisionRecord, FileChange, ProjectContext};
pub use pipeline::{PipelineContext, PipelinePhase, PipelineReport, Priority, TaskKind};
pub use role::{CostTier, ProviderDescriptor, ProviderVendor, Role, RoleAssignments, UnknownRole};
pub use scenario::Scenario;
