//! End-to-end patrol ticks over scripted collaborators.

mod common;

use chrono::Duration;

use common::{harness, ScriptedProvider};
use nightwatch::domain::models::{Config, PipelinePhase, PipelineReport, Priority, ProjectHealth, Role, TaskKind};
use nightwatch::TickReport;

fn config(max_actions: u32) -> Config {
    let mut config = Config::default();
    config.rate_gate.max_actions = max_actions;
    config.rate_gate.window_secs = 3600;
    config.patrol.metasystem_name = "meta".to_string();
    config
}

fn drifted(name: &str, missing: &[&str]) -> ProjectHealth {
    ProjectHealth::drifted(name, missing.iter().map(|m| m.to_string()).collect())
}

#[tokio::test]
async fn test_drifted_project_is_planned_reviewed_and_dispatched() {
    let provider = ScriptedProvider::new()
        .answer(Role::Planner, "PLAN: add auth module")
        .answer(Role::Reviewer, "Looks safe. Approved.");
    let h = harness(
        config(5),
        provider,
        vec![drifted("proj-A", &["auth"]), ProjectHealth::healthy("proj-B")],
        0.99,
    );

    let report = h.runtime.scheduler.tick().await;

    match &report {
        TickReport::Drift { ran, deferred } => {
            assert_eq!(ran.len(), 1);
            assert!(deferred.is_empty());
            assert!(ran[0].is_dispatched());
            assert_eq!(ran[0].subject_name(), "proj-A");
        }
        other => panic!("expected a drift tick, got {other:?}"),
    }
    assert_eq!(report.dispatched(), 1);

    let records = h.dispatcher.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.subject_name, "proj-A");
    assert_eq!(record.priority, Priority::High);
    assert_eq!(record.task_kind, TaskKind::DriftFix);
    assert!(record.description.contains("PLAN: add auth module"));
    assert!(record.description.contains("Looks safe. Approved."));

    let decisions = h.knowledge.decisions().await;
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].project, "proj-A");
    assert!(decisions[0].tags.iter().any(|t| t == "auth"));

    let calls = h.provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, Role::Planner);
    assert!(calls[0].1.contains("Missing modules: auth"));
    assert_eq!(calls[1].0, Role::Reviewer);
    assert!(calls[1].1.contains("PLAN: add auth module"));
    assert_eq!(h.provider.calls_for(Role::Builder), 0);
}

#[tokio::test]
async fn test_failed_plan_dispatches_nothing() {
    let provider = ScriptedProvider::new().fail(Role::Planner, 401);
    let h = harness(config(5), provider, vec![drifted("proj-A", &["auth"])], 0.99);

    let report = h.runtime.scheduler.tick().await;

    let TickReport::Drift { ran, .. } = &report else {
        panic!("expected a drift tick, got {report:?}");
    };
    assert!(matches!(
        &ran[0],
        PipelineReport::Aborted { phase: PipelinePhase::Plan, .. }
    ));
    assert_eq!(h.provider.calls_for(Role::Reviewer), 0);
    assert!(h.dispatcher.records().is_empty());
    assert!(h.knowledge.decisions().await.is_empty());
    // An aborted run still counts against the gate.
    assert_eq!(h.runtime.gate.recent_actions(), 1);
}

#[tokio::test]
async fn test_failed_critique_dispatches_nothing() {
    let provider = ScriptedProvider::new()
        .answer(Role::Planner, "PLAN")
        .fail(Role::Reviewer, 500);
    let h = harness(config(5), provider, vec![drifted("proj-A", &["auth"])], 0.99);

    let report = h.runtime.scheduler.tick().await;

    let TickReport::Drift { ran, .. } = &report else {
        panic!("expected a drift tick, got {report:?}");
    };
    assert!(matches!(
        &ran[0],
        PipelineReport::Aborted { phase: PipelinePhase::Critique, .. }
    ));
    assert!(h.dispatcher.records().is_empty());
    assert!(h.knowledge.decisions().await.is_empty());
}

#[tokio::test]
async fn test_gate_ceiling_holds_across_ticks() {
    let fleet = vec![
        drifted("a", &["x"]),
        drifted("b", &["y"]),
        drifted("c", &["z"]),
    ];
    let h = harness(config(2), ScriptedProvider::new(), fleet, 0.99);
    let scheduler = &h.runtime.scheduler;

    let first = scheduler.tick().await;
    let TickReport::Drift { ran, deferred } = &first else {
        panic!("expected a drift tick, got {first:?}");
    };
    assert_eq!(ran.len(), 2);
    assert_eq!(deferred, &vec!["c".to_string()]);

    let second = scheduler.tick().await;
    assert!(matches!(second, TickReport::Skipped(ref e) if e.recent_actions == 2));
    assert_eq!(h.dispatcher.records().len(), 2);

    h.clock.advance(Duration::seconds(3601));
    let third = scheduler.tick().await;
    assert_eq!(third.dispatched(), 2);
    assert_eq!(h.dispatcher.records().len(), 4);
}

#[tokio::test]
async fn test_calm_fleet_dreams_a_scenario() {
    let provider = ScriptedProvider::new()
        .answer(Role::Planner, "DREAM PLAN")
        .answer(Role::Reviewer, "fine");
    let h = harness(config(5), provider, vec![ProjectHealth::healthy("proj-A")], 0.0);

    let report = h.runtime.scheduler.tick().await;

    let TickReport::Calm {
        scenario: Some(run),
    } = &report
    else {
        panic!("expected a dream, got {report:?}");
    };
    let expected = h.runtime.scheduler.scenarios()[0].name;
    assert_eq!(run.name, expected);
    assert!(run.report.is_dispatched());

    let records = h.dispatcher.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subject_name, "meta");
    assert_eq!(records[0].priority, Priority::Low);
    assert_eq!(records[0].title, format!("Dream: {expected}"));

    let decisions = h.knowledge.decisions().await;
    assert_eq!(decisions.len(), 1);
    assert!(decisions[0].tags.iter().any(|t| t == "scenario"));
}

#[tokio::test]
async fn test_calm_fleet_without_dream_does_nothing() {
    let h = harness(
        config(5),
        ScriptedProvider::new(),
        vec![ProjectHealth::healthy("proj-A")],
        0.99,
    );

    let report = h.runtime.scheduler.tick().await;

    assert!(matches!(report, TickReport::Calm { scenario: None }));
    assert!(h.provider.calls().is_empty());
    assert_eq!(h.runtime.gate.recent_actions(), 0);
}

#[tokio::test]
async fn test_past_decisions_feed_later_plans() {
    let provider = ScriptedProvider::new()
        .answer(Role::Planner, "PLAN: add auth module")
        .answer(Role::Reviewer, "ok");
    let h = harness(config(5), provider, vec![drifted("proj-A", &["auth"])], 0.99);

    h.runtime.scheduler.tick().await;
    h.clock.advance(Duration::minutes(5));
    h.runtime.scheduler.tick().await;

    let plans: Vec<String> = h
        .provider
        .calls()
        .into_iter()
        .filter(|(role, _)| *role == Role::Planner)
        .map(|(_, prompt)| prompt)
        .collect();
    assert_eq!(plans.len(), 2);
    assert!(!plans[0].contains("Fix drift in proj-A"));
    assert!(plans[1].contains("### Past Decisions Related to Drift:"));
    assert!(plans[1].contains("Fix drift in proj-A: auth"));
}
