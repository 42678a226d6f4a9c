//! The patrol loop.
//!
//! Each tick is rate gated, scans fleet health, runs the drift pipeline for
//! every drifted project the gate allows, and when the fleet is calm may
//! run a random scenario. Ticks never fail; they return a [`TickReport`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{Collaborator, CollaboratorError, ConfigurationError, RateExceeded};
use crate::domain::models::{Config, PipelineReport, ProjectHealth, Scenario};
use crate::domain::ports::{HealthScanner, Inbox, NullInbox, RandomSource, ThreadRandom};
use crate::services::bounded::bounded;
use crate::services::drift_pipeline::DriftPipeline;
use crate::services::rate_gate::RateGate;
use crate::services::scenarios::SCENARIOS;

/// Loop parameters.
#[derive(Debug, Clone)]
pub struct PatrolSettings {
    pub interval: Duration,
    pub scenario_probability: f64,
    pub health_timeout: Duration,
    pub inbox_timeout: Duration,
}

impl PatrolSettings {
    /// Loop parameters from the `patrol` and `timeouts` sections.
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.patrol.interval(),
            scenario_probability: config.patrol.scenario_probability,
            health_timeout: config.timeouts.health(),
            inbox_timeout: config.timeouts.inbox(),
        }
    }

    /// Reject a zero interval or a probability outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.interval.is_zero() {
            return Err(ConfigurationError::InvalidInterval(self.interval));
        }
        if !(0.0..=1.0).contains(&self.scenario_probability) {
            return Err(ConfigurationError::InvalidProbability(self.scenario_probability));
        }
        Ok(())
    }
}

impl Default for PatrolSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A scenario run triggered during a calm tick or by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRun {
    pub name: &'static str,
    pub report: PipelineReport,
}

/// What one patrol tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    /// The gate was open at tick start; nothing was touched.
    Skipped(RateExceeded),
    /// The project list could not be obtained.
    Unscanned { reason: String },
    /// At least one project needed attention.
    Drift {
        /// One report per attempted run, in scan order.
        ran: Vec<PipelineReport>,
        /// Drifted projects left for a later tick by the gate.
        deferred: Vec<String>,
    },
    /// Every project was healthy.
    Calm { scenario: Option<ScenarioRun> },
}

impl TickReport {
    /// Number of tasks actually handed off this tick.
    pub fn dispatched(&self) -> usize {
        match self {
            Self::Drift { ran, .. } => ran.iter().filter(|r| r.is_dispatched()).count(),
            Self::Calm {
                scenario: Some(run),
            } => usize::from(run.report.is_dispatched()),
            _ => 0,
        }
    }
}

/// The night watchman.
///
/// Owns the loop task while awake. The loop only holds a weak reference, so
/// dropping the last `Arc` ends it at the next tick.
pub struct PatrolScheduler {
    gate: Arc<RateGate>,
    scanner: Arc<dyn HealthScanner>,
    pipeline: Arc<DriftPipeline>,
    inbox: Arc<dyn Inbox>,
    random: Arc<dyn RandomSource>,
    scenarios: Vec<Scenario>,
    settings: PatrolSettings,
    awake: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PatrolScheduler {
    /// Scheduler over the built-in scenario catalog, with no inbox and an
    /// OS-seeded random source.
    pub fn new(
        gate: Arc<RateGate>,
        scanner: Arc<dyn HealthScanner>,
        pipeline: Arc<DriftPipeline>,
        settings: PatrolSettings,
    ) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        Ok(Self {
            gate,
            scanner,
            pipeline,
            inbox: Arc::new(NullInbox),
            random: Arc::new(ThreadRandom),
            scenarios: SCENARIOS.to_vec(),
            settings,
            awake: AtomicBool::new(false),
            handle: Mutex::new(None),
        })
    }

    /// Inbox drained at the start of every tick.
    pub fn with_inbox(mut self, inbox: Arc<dyn Inbox>) -> Self {
        self.inbox = inbox;
        self
    }

    /// Random source for the dream roll and scenario pick.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Replace the scenario catalog. An empty catalog never dreams.
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// The shared rate gate.
    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    /// Scenarios a calm tick may pick from.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Whether the periodic loop is running.
    pub fn is_awake(&self) -> bool {
        self.awake.load(Ordering::SeqCst)
    }

    /// Start the periodic loop. Returns false if it was already running.
    ///
    /// The first tick fires one full interval after the call. Must be called
    /// from within a Tokio runtime.
    pub fn start_watch(self: &Arc<Self>) -> bool {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if self
            .awake
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("patrol already awake");
            return false;
        }

        let period = self.settings.interval;
        info!(interval_secs = period.as_secs(), "the night watch begins");

        let scheduler = Arc::downgrade(self);
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(scheduler) = scheduler.upgrade() else {
                    break;
                };
                let report = scheduler.tick().await;
                debug!(dispatched = report.dispatched(), "patrol tick finished");
            }
        }));
        true
    }

    /// Stop the periodic loop. A tick in progress is cancelled.
    pub fn stop_watch(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = handle.take() {
            task.abort();
            info!("the night watch ends");
        }
        self.awake.store(false, Ordering::SeqCst);
    }

    /// Run one patrol tick.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> TickReport {
        if let Err(exceeded) = self.gate.check() {
            info!(
                recent_actions = exceeded.recent_actions,
                max_actions = exceeded.max_actions,
                reopens_at = ?exceeded.reopens_at,
                "rate gate open; skipping patrol"
            );
            return TickReport::Skipped(exceeded);
        }

        self.process_inbox().await;

        let health = match self.fleet_health().await {
            Ok(health) => health,
            Err(err) => {
                warn!(error = %err, "could not list fleet projects");
                return TickReport::Unscanned {
                    reason: err.to_string(),
                };
            }
        };

        let drifted: Vec<&ProjectHealth> = health.iter().filter(|h| h.needs_attention()).collect();
        if drifted.is_empty() {
            info!(projects = health.len(), "the fleet is calm");
            return TickReport::Calm {
                scenario: self.maybe_dream().await,
            };
        }

        info!(count = drifted.len(), "found drifted projects");
        let mut ran = Vec::with_capacity(drifted.len());
        let mut deferred = Vec::new();
        for project in drifted {
            if !self.gate.can_proceed() {
                deferred.push(project.name.clone());
                continue;
            }
            let report = self.pipeline.run_drift(project).await;
            self.gate.register_action();
            ran.push(report);
        }

        if !deferred.is_empty() {
            info!(?deferred, gate = self.gate.state().as_str(), "deferring drifted projects");
        }
        TickReport::Drift { ran, deferred }
    }

    /// Health of every project in scan order. A failed or slow scan of one
    /// project reports it healthy.
    pub async fn fleet_health(&self) -> Result<Vec<ProjectHealth>, CollaboratorError> {
        let timeout = self.settings.health_timeout;
        let projects = bounded(Collaborator::HealthScan, timeout, self.scanner.projects()).await?;

        let scans = projects.iter().map(|name| async move {
            match bounded(Collaborator::HealthScan, timeout, self.scanner.scan(name)).await {
                Ok(health) => health,
                Err(err) => {
                    warn!(project = %name, error = %err, "health scan failed; assuming healthy");
                    ProjectHealth::healthy(name.clone())
                }
            }
        });
        Ok(join_all(scans).await)
    }

    /// Run a scenario by hand. Rate gated like any other pipeline run.
    pub async fn run_scenario(&self, scenario: &Scenario) -> Result<ScenarioRun, RateExceeded> {
        self.gate.check()?;
        Ok(self.execute_scenario(scenario).await)
    }

    async fn maybe_dream(&self) -> Option<ScenarioRun> {
        if self.scenarios.is_empty() {
            return None;
        }
        if self.random.next_f64() >= self.settings.scenario_probability {
            return None;
        }
        let scenario = self.scenarios[self.random.pick_index(self.scenarios.len())];
        Some(self.execute_scenario(&scenario).await)
    }

    async fn execute_scenario(&self, scenario: &Scenario) -> ScenarioRun {
        let report = self.pipeline.run_scenario(scenario).await;
        self.gate.register_action();
        ScenarioRun {
            name: scenario.name,
            report,
        }
    }

    async fn process_inbox(&self) {
        match bounded(
            Collaborator::Inbox,
            self.settings.inbox_timeout,
            self.inbox.process_pending(),
        )
        .await
        {
            Ok(0) => debug!("inbox empty"),
            Ok(count) => info!(count, "processed inbox tasks"),
            Err(err) => warn!(error = %err, "inbox processing failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        DispatchReceipt, DispatchRecord, PipelinePhase, ProviderDescriptor, RoleAssignments,
    };
    use crate::domain::ports::{
        DispatchError, HealthError, ManualClock, NullKnowledgeGraph, ProviderClient,
        ProviderError, ProviderReply, SeededRandom, TaskDispatcher,
    };
    use crate::services::drift_pipeline::PipelineSettings;
    use crate::services::role_router::RoleRouter;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;

    struct FixedFleet {
        projects: Vec<ProjectHealth>,
        list_calls: AtomicUsize,
    }

    impl FixedFleet {
        fn new(projects: Vec<ProjectHealth>) -> Self {
            Self {
                projects,
                list_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HealthScanner for FixedFleet {
        async fn projects(&self) -> Result<Vec<String>, HealthError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.projects.iter().map(|p| p.name.clone()).collect())
        }

        async fn scan(&self, project: &str) -> Result<ProjectHealth, HealthError> {
            self.projects
                .iter()
                .find(|p| p.name == project)
                .cloned()
                .ok_or_else(|| HealthError::UnknownProject(project.to_string()))
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl ProviderClient for EchoProvider {
        async fn invoke(
            &self,
            _: &ProviderDescriptor,
            _: &str,
            _: &str,
        ) -> Result<ProviderReply, ProviderError> {
            Ok(ProviderReply::new("ok"))
        }
    }

    #[derive(Default)]
    struct CountingDispatcher {
        subjects: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TaskDispatcher for CountingDispatcher {
        async fn dispatch(&self, record: &DispatchRecord) -> Result<DispatchReceipt, DispatchError> {
            let mut subjects = self.subjects.lock().unwrap();
            subjects.push(record.subject_name.clone());
            Ok(DispatchReceipt {
                task_id: format!("task-{}", subjects.len()),
                location: None,
                dispatched_at: Utc::now(),
            })
        }
    }

    struct Harness {
        scheduler: PatrolScheduler,
        fleet: Arc<FixedFleet>,
        dispatcher: Arc<CountingDispatcher>,
    }

    /// Never answers.
    struct StalledProvider;

    #[async_trait]
    impl ProviderClient for StalledProvider {
        async fn invoke(
            &self,
            _: &ProviderDescriptor,
            _: &str,
            _: &str,
        ) -> Result<ProviderReply, ProviderError> {
            std::future::pending().await
        }
    }

    fn harness(projects: Vec<ProjectHealth>, max_actions: u32, settings: PatrolSettings) -> Harness {
        harness_with(projects, max_actions, settings, Arc::new(EchoProvider))
    }

    fn harness_with(
        projects: Vec<ProjectHealth>,
        max_actions: u32,
        settings: PatrolSettings,
        provider: Arc<dyn ProviderClient>,
    ) -> Harness {
        let fleet = Arc::new(FixedFleet::new(projects));
        let dispatcher = Arc::new(CountingDispatcher::default());
        let knowledge = Arc::new(NullKnowledgeGraph::new());
        let router = Arc::new(
            RoleRouter::new(RoleAssignments::default(), provider, knowledge.clone())
                .unwrap()
                .with_timeouts(Duration::from_secs(30), Duration::from_secs(5)),
        );
        let pipeline = Arc::new(DriftPipeline::new(
            router,
            dispatcher.clone(),
            knowledge,
            PipelineSettings::default(),
        ));
        let gate = Arc::new(
            RateGate::new(
                Duration::from_secs(3600),
                max_actions,
                Arc::new(ManualClock::starting_now()),
            )
            .unwrap(),
        );
        let scheduler = PatrolScheduler::new(gate, fleet.clone(), pipeline, settings).unwrap();
        Harness {
            scheduler,
            fleet,
            dispatcher,
        }
    }

    fn quiet() -> PatrolSettings {
        PatrolSettings {
            scenario_probability: 0.0,
            ..PatrolSettings::default()
        }
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let bad_interval = PatrolSettings {
            interval: Duration::ZERO,
            ..PatrolSettings::default()
        };
        assert!(matches!(
            bad_interval.validate(),
            Err(ConfigurationError::InvalidInterval(_))
        ));

        let bad_probability = PatrolSettings {
            scenario_probability: 1.5,
            ..PatrolSettings::default()
        };
        assert!(matches!(
            bad_probability.validate(),
            Err(ConfigurationError::InvalidProbability(_))
        ));
    }

    #[tokio::test]
    async fn test_ceiling_defers_excess_drift() {
        let projects = vec![
            ProjectHealth::drifted("a", vec!["auth".to_string()]),
            ProjectHealth::drifted("b", vec!["api".to_string()]),
            ProjectHealth::drifted("c", vec!["db".to_string()]),
        ];
        let h = harness(projects, 2, quiet());

        let report = h.scheduler.tick().await;
        match &report {
            TickReport::Drift { ran, deferred } => {
                assert_eq!(ran.len(), 2);
                assert_eq!(deferred, &vec!["c".to_string()]);
            }
            other => panic!("expected drift report, got {other:?}"),
        }
        assert_eq!(report.dispatched(), 2);
        assert_eq!(*h.dispatcher.subjects.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(h.scheduler.gate().recent_actions(), 2);
    }

    #[tokio::test]
    async fn test_open_gate_skips_without_side_effects() {
        let h = harness(vec![ProjectHealth::drifted("a", vec![])], 1, quiet());
        h.scheduler.gate().register_action();

        let report = h.scheduler.tick().await;
        assert!(matches!(report, TickReport::Skipped(_)));
        assert_eq!(h.fleet.list_calls.load(Ordering::SeqCst), 0);
        assert!(h.dispatcher.subjects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_errored_projects_are_remediated() {
        let projects = vec![ProjectHealth::healthy("ok"), ProjectHealth::errored("broken")];
        let h = harness(projects, 5, quiet());

        let report = h.scheduler.tick().await;
        assert_eq!(report.dispatched(), 1);
        assert_eq!(*h.dispatcher.subjects.lock().unwrap(), vec!["broken"]);
    }

    #[tokio::test]
    async fn test_failed_scan_assumes_healthy() {
        struct FlakyFleet;

        #[async_trait]
        impl HealthScanner for FlakyFleet {
            async fn projects(&self) -> Result<Vec<String>, HealthError> {
                Ok(vec!["flaky".to_string()])
            }
            async fn scan(&self, project: &str) -> Result<ProjectHealth, HealthError> {
                Err(HealthError::ScanFailed {
                    project: project.to_string(),
                    reason: "scanner crashed".to_string(),
                })
            }
        }

        let h = harness(Vec::new(), 5, quiet());
        let scheduler = PatrolScheduler {
            scanner: Arc::new(FlakyFleet),
            ..h.scheduler
        };

        let health = scheduler.fleet_health().await.unwrap();
        assert_eq!(health.len(), 1);
        assert!(!health[0].needs_attention());
        assert!(matches!(scheduler.tick().await, TickReport::Calm { scenario: None }));
    }

    #[tokio::test]
    async fn test_scenario_rate_matches_probability() {
        let settings = PatrolSettings {
            scenario_probability: 0.05,
            ..PatrolSettings::default()
        };
        let h = harness(vec![ProjectHealth::healthy("calm")], 100_000, settings);
        let scheduler = h.scheduler.with_random(Arc::new(SeededRandom::new(2024)));

        let ticks = 10_000;
        let mut scenarios = 0;
        for _ in 0..ticks {
            if let TickReport::Calm { scenario: Some(run) } = scheduler.tick().await {
                assert!(run.report.is_dispatched());
                scenarios += 1;
            }
        }

        let rate = f64::from(scenarios) / f64::from(ticks);
        assert!((0.035..=0.065).contains(&rate), "scenario rate {rate}");
        assert_eq!(scheduler.gate().recent_actions(), scenarios as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_provider_cannot_wedge_tick() {
        let projects = vec![
            ProjectHealth::drifted("a", vec!["auth".to_string()]),
            ProjectHealth::drifted("b", vec!["api".to_string()]),
        ];
        let h = harness_with(projects, 5, quiet(), Arc::new(StalledProvider));

        let report = h.scheduler.tick().await;
        let TickReport::Drift { ran, deferred } = &report else {
            panic!("expected drift report, got {report:?}");
        };
        assert!(deferred.is_empty());
        assert_eq!(ran.len(), 2);
        for run in ran {
            match run {
                PipelineReport::Aborted { phase, reason, .. } => {
                    assert_eq!(*phase, PipelinePhase::Plan);
                    assert!(reason.contains("timed out"), "reason: {reason}");
                }
                other => panic!("expected plan abort, got {other:?}"),
            }
        }
        assert_eq!(report.dispatched(), 0);
        assert!(h.dispatcher.subjects.lock().unwrap().is_empty());
        // Aborted runs still count against the gate.
        assert_eq!(h.scheduler.gate().recent_actions(), 2);
    }

    #[tokio::test]
    async fn test_dream_picks_from_configured_catalog() {
        let always = PatrolSettings {
            scenario_probability: 1.0,
            ..PatrolSettings::default()
        };
        let only = Scenario {
            name: "lint-sweep",
            description: "tidy warnings",
            prompt: "Fix every compiler warning",
        };
        let h = harness(vec![ProjectHealth::healthy("calm")], 5, always.clone());
        let scheduler = h
            .scheduler
            .with_random(Arc::new(SeededRandom::new(7)))
            .with_scenarios(vec![only]);

        match scheduler.tick().await {
            TickReport::Calm { scenario: Some(run) } => assert_eq!(run.name, "lint-sweep"),
            other => panic!("expected a dream, got {other:?}"),
        }

        let h = harness(vec![ProjectHealth::healthy("calm")], 5, always);
        let scheduler = h.scheduler.with_scenarios(Vec::new());
        assert!(matches!(scheduler.tick().await, TickReport::Calm { scenario: None }));
        assert!(h.dispatcher.subjects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_scenario_is_rate_gated() {
        let h = harness(vec![], 1, quiet());
        let scenario = SCENARIOS[0];

        let run = h.scheduler.run_scenario(&scenario).await.unwrap();
        assert_eq!(run.name, scenario.name);
        assert!(h.scheduler.run_scenario(&scenario).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_watch_is_idempotent() {
        let settings = PatrolSettings {
            interval: Duration::from_secs(60),
            ..quiet()
        };
        let h = harness(vec![ProjectHealth::healthy("calm")], 5, settings);
        let fleet = h.fleet.clone();
        let scheduler = Arc::new(h.scheduler);

        assert!(scheduler.start_watch());
        assert!(!scheduler.start_watch());
        assert!(scheduler.is_awake());

        tokio::time::sleep(Duration::from_secs(210)).await;
        assert_eq!(fleet.list_calls.load(Ordering::SeqCst), 3);

        scheduler.stop_watch();
        assert!(!scheduler.is_awake());
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(fleet.list_calls.load(Ordering::SeqCst), 3);
    }
}
