use anyhow::{anyhow, Result};
use serde::Serialize;

use super::report::{runs_table, RunRow};
use crate::application::PatrolRuntime;
use crate::cli::display::{list_table, output, render_list, truncate, CommandOutput};
use crate::cli::types::ScenarioCommands;
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
pub struct ScenarioEntry {
    pub name: &'static str,
    pub description: &'static str,
}

/// The scenario catalog.
#[derive(Debug, Serialize)]
pub struct ScenarioListOutput {
    pub scenarios: Vec<ScenarioEntry>,
}

impl CommandOutput for ScenarioListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["name", "description"]);
        for s in &self.scenarios {
            table.add_row(vec![s.name.to_string(), truncate(s.description, 72)]);
        }
        render_list("scenario", &table, self.scenarios.len())
    }
}

/// Result of a hand-triggered scenario.
#[derive(Debug, Serialize)]
pub struct ScenarioRunOutput {
    pub scenario: &'static str,
    pub run: RunRow,
}

impl CommandOutput for ScenarioRunOutput {
    fn to_human(&self) -> String {
        format!(
            "Scenario {}:\n{}",
            self.scenario,
            runs_table(std::slice::from_ref(&self.run))
        )
    }
}

pub async fn execute(command: ScenarioCommands, config: Config, json: bool) -> Result<()> {
    let runtime = PatrolRuntime::from_config(config)?;
    let scheduler = &runtime.scheduler;

    match command {
        ScenarioCommands::List => {
            let scenarios = scheduler
                .scenarios()
                .iter()
                .map(|s| ScenarioEntry {
                    name: s.name,
                    description: s.description,
                })
                .collect();
            output(&ScenarioListOutput { scenarios }, json);
        }
        ScenarioCommands::Run { name } => {
            let scenario = scheduler
                .scenarios()
                .iter()
                .find(|s| s.name == name)
                .copied()
                .ok_or_else(|| anyhow!("Unknown scenario: {name}"))?;
            let run = scheduler.run_scenario(&scenario).await?;
            output(
                &ScenarioRunOutput {
                    scenario: run.name,
                    run: RunRow::from(&run.report),
                },
                json,
            );
        }
    }
    Ok(())
}
