use anyhow::{bail, Result};
use serde::Serialize;

use crate::application::PatrolRuntime;
use crate::cli::display::{output, CommandOutput};
use crate::domain::models::{Config, Role, TaskKind};
use crate::services::CallMetadata;

/// Answer of a single role call.
#[derive(Debug, Serialize)]
pub struct RoleOutput {
    pub role: String,
    pub provider: String,
    pub model: String,
    pub result: String,
}

impl CommandOutput for RoleOutput {
    fn to_human(&self) -> String {
        self.result.clone()
    }
}

/// Call one role and print its answer
pub async fn execute(
    config: Config,
    role: &str,
    prompt: &str,
    project: Option<String>,
    context: &str,
    json: bool,
) -> Result<()> {
    let role: Role = role.parse()?;
    let runtime = PatrolRuntime::from_config(config)?;
    let metadata = project.map(|p| CallMetadata::for_subject(p, TaskKind::Feature));

    let outcome = runtime
        .router
        .call_role(role, prompt, context, metadata.as_ref())
        .await;
    let Some(result) = outcome.text() else {
        bail!(outcome.render());
    };

    let provider = runtime.router.provider_for(role);
    output(
        &RoleOutput {
            role: role.to_string(),
            provider: provider.vendor.to_string(),
            model: provider.model.clone(),
            result: result.to_string(),
        },
        json,
    );
    Ok(())
}
