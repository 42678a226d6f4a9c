use serde::Serialize;

/// A canned self-improvement task for the metasystem.
///
/// Scenarios only run when the whole fleet is calm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    /// Prompt handed to the planner.
    pub prompt: &'static str,
}
