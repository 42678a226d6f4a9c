//! Nightwatch CLI entry point.

use anyhow::Result;
use clap::Parser;

use nightwatch::cli::commands;
use nightwatch::cli::{Cli, Commands};
use nightwatch::domain::models::Config;
use nightwatch::infrastructure::config::ConfigLoader;
use nightwatch::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        nightwatch::cli::handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config: Config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    match cli.command {
        Commands::Watch { interval } => commands::watch::execute(config, interval, cli.json).await,
        Commands::Patrol => commands::patrol::execute(config, cli.json).await,
        Commands::Scenario(command) => commands::scenario::execute(command, config, cli.json).await,
        Commands::Role {
            role,
            prompt,
            project,
            context,
        } => commands::role::execute(config, &role, &prompt, project, &context, cli.json).await,
        Commands::Health => commands::health::execute(config, cli.json).await,
        Commands::Config(command) => commands::config::execute(command, &config, cli.json),
    }
}
