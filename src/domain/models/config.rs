use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::role::RoleAssignments;

/// Main configuration structure for nightwatch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Patrol loop configuration
    #[serde(default)]
    pub patrol: PatrolConfig,

    /// Sliding-window rate gate configuration
    #[serde(default)]
    pub rate_gate: RateGateConfig,

    /// Role → provider assignments
    #[serde(default)]
    pub roles: RoleAssignments,

    /// Per-collaborator call timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Knowledge context assembly and decision log settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Provider HTTP endpoint settings
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Fleet manifest location
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Patrol loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PatrolConfig {
    /// Seconds between patrol ticks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Chance per calm tick of running a scenario
    #[serde(default = "default_scenario_probability")]
    pub scenario_probability: f64,

    /// Workspace name scenarios are dispatched to
    #[serde(default = "default_metasystem_name")]
    pub metasystem_name: String,
}

const fn default_interval_secs() -> u64 {
    3600
}

const fn default_scenario_probability() -> f64 {
    0.05
}

fn default_metasystem_name() -> String {
    "omni-dromenon-machina".to_string()
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            scenario_probability: default_scenario_probability(),
            metasystem_name: default_metasystem_name(),
        }
    }
}

impl PatrolConfig {
    /// Tick period.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Rate gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateGateConfig {
    /// Trailing window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum autonomous actions per window
    #[serde(default = "default_max_actions")]
    pub max_actions: u32,
}

const fn default_window_secs() -> u64 {
    3600
}

const fn default_max_actions() -> u32 {
    5
}

impl Default for RateGateConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_actions: default_max_actions(),
        }
    }
}

impl RateGateConfig {
    /// Trailing window length.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Timeouts bounding every collaborator call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    #[serde(default = "default_provider_secs")]
    pub provider_secs: u64,

    #[serde(default = "default_knowledge_secs")]
    pub knowledge_secs: u64,

    #[serde(default = "default_dispatch_secs")]
    pub dispatch_secs: u64,

    #[serde(default = "default_health_secs")]
    pub health_secs: u64,

    #[serde(default = "default_inbox_secs")]
    pub inbox_secs: u64,
}

const fn default_provider_secs() -> u64 {
    300
}

const fn default_knowledge_secs() -> u64 {
    10
}

const fn default_dispatch_secs() -> u64 {
    30
}

const fn default_health_secs() -> u64 {
    60
}

const fn default_inbox_secs() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            provider_secs: default_provider_secs(),
            knowledge_secs: default_knowledge_secs(),
            dispatch_secs: default_dispatch_secs(),
            health_secs: default_health_secs(),
            inbox_secs: default_inbox_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn provider(&self) -> Duration {
        Duration::from_secs(self.provider_secs)
    }

    pub fn knowledge(&self) -> Duration {
        Duration::from_secs(self.knowledge_secs)
    }

    pub fn dispatch(&self) -> Duration {
        Duration::from_secs(self.dispatch_secs)
    }

    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }

    pub fn inbox(&self) -> Duration {
        Duration::from_secs(self.inbox_secs)
    }

    /// Same timeout for every collaborator. Handy in tests.
    pub fn uniform(timeout: Duration) -> Self {
        let secs = timeout.as_secs().max(1);
        Self {
            provider_secs: secs,
            knowledge_secs: secs,
            dispatch_secs: secs,
            health_secs: secs,
            inbox_secs: secs,
        }
    }
}

/// Knowledge context assembly and decision log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KnowledgeConfig {
    /// Lookback for the project activity summary
    #[serde(default = "default_project_context_hours")]
    pub project_context_hours: u32,

    /// Lookback for recently modified files
    #[serde(default = "default_recent_files_hours")]
    pub recent_files_hours: u32,

    /// Characters of a role result kept in router decision logs
    #[serde(default = "default_summary_chars")]
    pub summary_chars: usize,

    /// Characters of a plan kept in the post-dispatch decision log
    #[serde(default = "default_rationale_chars")]
    pub rationale_chars: usize,

    /// Decisions (and file changes per project) the in-process store keeps
    /// before dropping the oldest
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

const fn default_project_context_hours() -> u32 {
    168
}

const fn default_recent_files_hours() -> u32 {
    48
}

const fn default_summary_chars() -> usize {
    300
}

const fn default_rationale_chars() -> usize {
    500
}

const fn default_max_records() -> usize {
    10_000
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            project_context_hours: default_project_context_hours(),
            recent_files_hours: default_recent_files_hours(),
            summary_chars: default_summary_chars(),
            rationale_chars: default_rationale_chars(),
            max_records: default_max_records(),
        }
    }
}

/// HTTP endpoint for one vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointConfig {
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

/// Provider HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProvidersConfig {
    #[serde(default = "default_anthropic")]
    pub anthropic: EndpointConfig,

    #[serde(default = "default_openai")]
    pub openai: EndpointConfig,

    #[serde(default = "default_gemini")]
    pub gemini: EndpointConfig,

    /// Max tokens requested per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_anthropic() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://api.anthropic.com".to_string(),
        api_key_env: "ANTHROPIC_API_KEY".to_string(),
    }
}

fn default_openai() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://api.openai.com".to_string(),
        api_key_env: "OPENAI_API_KEY".to_string(),
    }
}

fn default_gemini() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://generativelanguage.googleapis.com".to_string(),
        api_key_env: "GEMINI_API_KEY".to_string(),
    }
}

const fn default_max_tokens() -> u32 {
    4096
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            anthropic: default_anthropic(),
            openai: default_openai(),
            gemini: default_gemini(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Fleet manifest location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FleetConfig {
    /// Path to the YAML fleet manifest
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
}

fn default_manifest_path() -> String {
    "metasystem.yaml".to_string()
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
