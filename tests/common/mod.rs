//! Common test utilities for integration tests
//!
//! Scripted collaborators and a runtime builder shared by the patrol
//! integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;

use nightwatch::application::{Collaborators, PatrolRuntime};
use nightwatch::domain::models::{
    Config, DispatchReceipt, DispatchRecord, ProjectHealth, ProviderDescriptor, Role,
};
use nightwatch::domain::ports::{
    DispatchError, HealthError, HealthScanner, KnowledgeGraph, ManualClock, NullInbox,
    ProviderClient, ProviderError, ProviderReply, RandomSource, TaskDispatcher,
};
use nightwatch::infrastructure::knowledge::InMemoryKnowledgeGraph;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Provider that answers per role, keyed on the role named in the system prompt.
pub struct ScriptedProvider {
    answers: Vec<(Role, Result<String, u16>)>,
    calls: Mutex<Vec<(Role, String)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            answers: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(mut self, role: Role, text: &str) -> Self {
        self.answers.push((role, Ok(text.to_string())));
        self
    }

    /// Fail calls for `role` with an HTTP status.
    pub fn fail(mut self, role: Role, status: u16) -> Self {
        self.answers.push((role, Err(status)));
        self
    }

    pub fn calls(&self) -> Vec<(Role, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, role: Role) -> usize {
        self.calls().iter().filter(|(r, _)| *r == role).count()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn invoke(
        &self,
        _provider: &ProviderDescriptor,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderReply, ProviderError> {
        let role = Role::ALL
            .into_iter()
            .find(|r| system_prompt.contains(&format!("You are the {}", r.display_name())))
            .expect("system prompt names a role");
        self.calls
            .lock()
            .unwrap()
            .push((role, user_prompt.to_string()));

        match self.answers.iter().find(|(r, _)| *r == role) {
            Some((_, Ok(text))) => Ok(ProviderReply::new(text.clone())),
            Some((_, Err(status))) => Err(ProviderError::Http {
                status: *status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(ProviderReply::new(format!("{} says ok", role.display_name()))),
        }
    }
}

/// Scanner returning a fixed fleet.
pub struct StaticScanner {
    fleet: Mutex<Vec<ProjectHealth>>,
}

impl StaticScanner {
    pub fn new(fleet: Vec<ProjectHealth>) -> Self {
        Self {
            fleet: Mutex::new(fleet),
        }
    }

    pub fn set(&self, fleet: Vec<ProjectHealth>) {
        *self.fleet.lock().unwrap() = fleet;
    }
}

#[async_trait]
impl HealthScanner for StaticScanner {
    async fn projects(&self) -> Result<Vec<String>, HealthError> {
        Ok(self.fleet.lock().unwrap().iter().map(|p| p.name.clone()).collect())
    }

    async fn scan(&self, project: &str) -> Result<ProjectHealth, HealthError> {
        self.fleet
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == project)
            .cloned()
            .ok_or_else(|| HealthError::UnknownProject(project.to_string()))
    }
}

/// Dispatcher that records every task it is handed.
#[derive(Default)]
pub struct RecordingDispatcher {
    records: Mutex<Vec<DispatchRecord>>,
}

impl RecordingDispatcher {
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskDispatcher for RecordingDispatcher {
    async fn dispatch(&self, record: &DispatchRecord) -> Result<DispatchReceipt, DispatchError> {
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        Ok(DispatchReceipt {
            task_id: format!("task-{}", records.len()),
            location: None,
            dispatched_at: Utc::now(),
        })
    }
}

/// Randomness that always draws the same value.
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }

    fn pick_index(&self, _len: usize) -> usize {
        0
    }
}

pub struct Harness {
    pub runtime: PatrolRuntime,
    pub provider: Arc<ScriptedProvider>,
    pub scanner: Arc<StaticScanner>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub knowledge: Arc<InMemoryKnowledgeGraph>,
    pub clock: Arc<ManualClock>,
}

/// Assemble a runtime around scripted collaborators.
///
/// `draw` is the value every scenario-trigger draw returns; anything at or
/// above the configured probability means no scenario ever runs.
pub fn harness(
    config: Config,
    provider: ScriptedProvider,
    fleet: Vec<ProjectHealth>,
    draw: f64,
) -> Harness {
    let provider = Arc::new(provider);
    let scanner = Arc::new(StaticScanner::new(fleet));
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let clock = Arc::new(ManualClock::starting_now());
    let knowledge = Arc::new(InMemoryKnowledgeGraph::with_clock(clock.clone()));

    let runtime = PatrolRuntime::assemble(
        config,
        Collaborators {
            client: provider.clone(),
            knowledge: knowledge.clone() as Arc<dyn KnowledgeGraph>,
            scanner: scanner.clone(),
            dispatcher: dispatcher.clone(),
            inbox: Arc::new(NullInbox),
            clock: clock.clone(),
            random: Arc::new(FixedRandom(draw)),
        },
    )
    .expect("runtime assembles");

    Harness {
        runtime,
        provider,
        scanner,
        dispatcher,
        knowledge,
        clock,
    }
}
