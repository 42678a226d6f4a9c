//! Patrol runtime assembly.
//!
//! Builds the rate gate, role router, pipeline and scheduler from a
//! [`Config`] and a set of collaborators. The CLI builds one runtime per
//! invocation; tests swap in fakes through [`Collaborators`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::models::Config;
use crate::domain::ports::{
    Clock, HealthScanner, Inbox, KnowledgeGraph, NullInbox, ProviderClient, RandomSource,
    SystemClock, TaskDispatcher, ThreadRandom,
};
use crate::infrastructure::dispatch::InboxDispatcher;
use crate::infrastructure::fleet::ManifestHealthScanner;
use crate::infrastructure::knowledge::InMemoryKnowledgeGraph;
use crate::infrastructure::providers::HttpProviderClient;
use crate::services::{
    DriftPipeline, PatrolScheduler, PatrolSettings, PipelineSettings, RateGate, RoleRouter,
};

/// External collaborators the patrol core talks to.
pub struct Collaborators {
    pub client: Arc<dyn ProviderClient>,
    pub knowledge: Arc<dyn KnowledgeGraph>,
    pub scanner: Arc<dyn HealthScanner>,
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub inbox: Arc<dyn Inbox>,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
}

impl Collaborators {
    /// Production adapters: HTTP providers, the manifest-driven scanner and
    /// inbox dispatcher, and a process-local knowledge graph.
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let client = HttpProviderClient::new(config.providers.clone(), config.timeouts.provider())
            .context("Failed to build provider HTTP client")?;
        let manifest = &config.fleet.manifest_path;

        Ok(Self {
            client: Arc::new(client),
            knowledge: Arc::new(
                InMemoryKnowledgeGraph::with_clock(clock.clone())
                    .with_max_records(config.knowledge.max_records),
            ),
            scanner: Arc::new(ManifestHealthScanner::new(manifest)),
            dispatcher: Arc::new(InboxDispatcher::new(manifest).with_clock(clock.clone())),
            inbox: Arc::new(NullInbox),
            clock,
            random: Arc::new(ThreadRandom),
        })
    }
}

/// A fully wired patrol.
pub struct PatrolRuntime {
    pub config: Config,
    pub gate: Arc<RateGate>,
    pub router: Arc<RoleRouter>,
    pub pipeline: Arc<DriftPipeline>,
    pub scheduler: Arc<PatrolScheduler>,
    pub knowledge: Arc<dyn KnowledgeGraph>,
}

impl PatrolRuntime {
    /// Validate `config` and wire the production adapters.
    pub fn from_config(config: Config) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Self::assemble(config, collaborators)
    }

    /// Wire services over caller-supplied collaborators. Tests use this with fakes.
    pub fn assemble(config: Config, collaborators: Collaborators) -> Result<Self> {
        let Collaborators {
            client,
            knowledge,
            scanner,
            dispatcher,
            inbox,
            clock,
            random,
        } = collaborators;

        let gate = Arc::new(
            RateGate::from_config(&config.rate_gate, clock).context("Invalid rate gate settings")?,
        );

        let router = RoleRouter::new(config.roles.clone(), client, knowledge.clone())
            .context("Invalid role assignments")?
            .with_timeouts(config.timeouts.provider(), config.timeouts.knowledge())
            .with_summary_chars(config.knowledge.summary_chars)
            .with_system_name(config.patrol.metasystem_name.clone());
        let router = Arc::new(router);

        let pipeline = Arc::new(DriftPipeline::new(
            router.clone(),
            dispatcher,
            knowledge.clone(),
            PipelineSettings::from_config(&config),
        ));

        let scheduler = PatrolScheduler::new(
            gate.clone(),
            scanner,
            pipeline.clone(),
            PatrolSettings::from_config(&config),
        )
        .context("Invalid patrol settings")?
        .with_inbox(inbox)
        .with_random(random);

        info!(
            interval_secs = config.patrol.interval_secs,
            max_actions = config.rate_gate.max_actions,
            window_secs = config.rate_gate.window_secs,
            "patrol runtime assembled"
        );

        Ok(Self {
            config,
            gate,
            router,
            pipeline,
            scheduler: Arc::new(scheduler),
            knowledge,
        })
    }
}
