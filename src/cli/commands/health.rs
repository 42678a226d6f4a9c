use anyhow::Result;
use serde::Serialize;

use crate::application::PatrolRuntime;
use crate::cli::display::{colorize_gate, colorize_health, label, list_table, output, render_list, CommandOutput};
use crate::domain::models::{Config, ProjectHealth};

/// Fleet health listing.
#[derive(Debug, Serialize)]
pub struct HealthOutput {
    pub projects: Vec<ProjectHealth>,
    pub gate: &'static str,
    pub recent_actions: usize,
    pub max_actions: u32,
}

impl CommandOutput for HealthOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["project", "status", "tests", "missing"]);
        for p in &self.projects {
            table.add_row(vec![
                p.name.clone(),
                colorize_health(p.status.as_str()).to_string(),
                if p.last_test_result { "pass" } else { "fail" }.to_string(),
                p.missing_modules.join(", "),
            ]);
        }
        format!(
            "{}\n\n{} {} ({}/{} actions in window)",
            render_list("project", &table, self.projects.len()),
            label("Rate gate"),
            colorize_gate(self.gate),
            self.recent_actions,
            self.max_actions,
        )
    }
}

/// Scan the fleet without remediating anything
pub async fn execute(config: Config, json: bool) -> Result<()> {
    let runtime = PatrolRuntime::from_config(config)?;
    let projects = runtime.scheduler.fleet_health().await?;
    output(
        &HealthOutput {
            projects,
            gate: runtime.gate.state().as_str(),
            recent_actions: runtime.gate.recent_actions(),
            max_actions: runtime.gate.max_actions(),
        },
        json,
    );
    Ok(())
}
