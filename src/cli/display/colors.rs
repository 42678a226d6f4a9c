//! Color mapping for health, gate and pipeline states.

use console::{style, StyledObject};

pub fn colorize_health(status: &str) -> StyledObject<&str> {
    match status {
        "healthy" => style(status).green(),
        "drifted" => style(status).yellow().bold(),
        "error" => style(status).red().bold(),
        _ => style(status),
    }
}

/// Closed means actions may proceed.
pub fn colorize_gate(state: &str) -> StyledObject<&str> {
    match state {
        "closed" => style(state).green(),
        "open" => style(state).red().bold(),
        _ => style(state),
    }
}

pub fn colorize_outcome(outcome: &str) -> StyledObject<&str> {
    if outcome == "dispatched" {
        style(outcome).green().bold()
    } else {
        style(outcome).red()
    }
}

/// Styled label for key-value lines.
pub fn label(name: &str) -> String {
    format!("{}{}", style(name).bold(), style(":").dim())
}

pub fn section_header(title: &str) -> String {
    format!("\n{}", style(title).bold().underlined())
}
