use anyhow::{Context, Result};
use tracing::info;

use crate::application::PatrolRuntime;
use crate::cli::display::action_success;
use crate::domain::models::Config;

/// Run the patrol loop until Ctrl-C
pub async fn execute(mut config: Config, interval: Option<u64>, json: bool) -> Result<()> {
    if let Some(secs) = interval {
        config.patrol.interval_secs = secs;
    }
    let runtime = PatrolRuntime::from_config(config)?;
    let scheduler = runtime.scheduler.clone();

    scheduler.start_watch();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "watching": true,
                "interval_secs": runtime.config.patrol.interval_secs,
            })
        );
    } else {
        println!(
            "{}",
            action_success(&format!(
                "Patrolling every {}s. Press Ctrl-C to stop.",
                runtime.config.patrol.interval_secs
            ))
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("interrupt received");
    scheduler.stop_watch();
    Ok(())
}
