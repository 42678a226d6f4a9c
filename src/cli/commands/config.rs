use anyhow::Result;

use crate::cli::types::ConfigCommands;
use crate::domain::models::Config;

pub fn execute(command: ConfigCommands, config: &Config, json: bool) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print!("{}", serde_yaml::to_string(config)?);
            }
        }
    }
    Ok(())
}
