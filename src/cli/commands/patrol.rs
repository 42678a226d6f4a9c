use anyhow::Result;
use serde::Serialize;

use super::report::{runs_table, TickView};
use crate::application::PatrolRuntime;
use crate::cli::display::{action_success, output, CommandOutput};
use crate::domain::models::Config;

/// Result of a single patrol tick.
#[derive(Debug, Serialize)]
pub struct PatrolOutput {
    #[serde(flatten)]
    pub tick: TickView,
}

impl CommandOutput for PatrolOutput {
    fn to_human(&self) -> String {
        let tick = &self.tick;
        let mut lines = Vec::new();
        match tick.outcome {
            "skipped" => {
                let gate = tick.gate.as_ref();
                lines.push(format!(
                    "Rate gate open ({}/{} actions in window); patrol skipped.",
                    gate.map_or(0, |g| g.recent_actions),
                    gate.map_or(0, |g| g.max_actions),
                ));
                if let Some(at) = gate.and_then(|g| g.reopens_at.as_deref()) {
                    lines.push(format!("Closes again at {at}"));
                }
            }
            "unscanned" => lines.push(format!(
                "Could not list fleet projects: {}",
                tick.reason.as_deref().unwrap_or("unknown")
            )),
            "calm" if tick.scenario.is_none() => lines.push(action_success("The fleet is calm.")),
            "calm" => lines.push(format!(
                "The fleet is calm. Dreamed scenario {}.",
                tick.scenario.as_deref().unwrap_or_default()
            )),
            _ => lines.push(format!("{} drifted project(s) handled.", tick.runs.len())),
        }
        if !tick.runs.is_empty() {
            lines.push(runs_table(&tick.runs));
        }
        if !tick.deferred.is_empty() {
            lines.push(format!("Deferred until the gate closes: {}", tick.deferred.join(", ")));
        }
        lines.join("\n")
    }
}

/// Run one patrol tick
pub async fn execute(config: Config, json: bool) -> Result<()> {
    let runtime = PatrolRuntime::from_config(config)?;
    let report = runtime.scheduler.tick().await;
    output(
        &PatrolOutput {
            tick: TickView::from(&report),
        },
        json,
    );
    Ok(())
}
