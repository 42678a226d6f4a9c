//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line interface for the nightwatch patrol.
#[derive(Parser)]
#[command(name = "nightwatch")]
#[command(about = "Nightwatch - autonomous fleet patrol", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Load configuration from this file instead of .nightwatch/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the patrol loop until interrupted
    Watch {
        /// Override the patrol interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single patrol tick and report what happened
    Patrol,

    /// Dream scenario commands
    #[command(subcommand)]
    Scenario(ScenarioCommands),

    /// Call one role directly
    Role {
        /// planner, builder or reviewer
        role: String,

        /// Prompt sent to the role
        prompt: String,

        /// Project the call is about; enables decision logging
        #[arg(short, long)]
        project: Option<String>,

        /// Background context for the system prompt
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Show fleet health and rate gate state
    Health,

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Scenario subcommands.
#[derive(Subcommand)]
pub enum ScenarioCommands {
    /// List the scenario catalog
    List,

    /// Run a scenario now (rate gated)
    Run {
        /// Scenario name
        name: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}
