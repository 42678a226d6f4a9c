//! Built-in scenario catalog.

use crate::domain::models::Scenario;

/// Self-improvement tasks the patrol may run against the metasystem when the
/// fleet is calm.
pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "documentation-sweep",
        description: "Find public modules without usage documentation and draft it",
        prompt: "Survey the metasystem workspaces for modules that lack a README or \
                 usage notes. Propose documentation for the three most used ones.",
    },
    Scenario {
        name: "dependency-hygiene",
        description: "Flag duplicated or outdated dependencies across workspaces",
        prompt: "Compare the dependency manifests of every workspace. Propose a plan to \
                 consolidate duplicated libraries and upgrade anything more than one \
                 major version behind.",
    },
    Scenario {
        name: "test-gap-hunt",
        description: "Locate modules with no automated tests and plan coverage",
        prompt: "Identify the modules with the weakest automated test coverage and \
                 propose focused tests for their most critical behaviour.",
    },
    Scenario {
        name: "manifest-reconciliation",
        description: "Reconcile the fleet manifest with the workspaces on disk",
        prompt: "Check that every workspace in the fleet manifest declares an accurate \
                 tech stack and expected module list. Propose corrections.",
    },
    Scenario {
        name: "knowledge-graph-gardening",
        description: "Consolidate stale or contradictory decisions in the knowledge graph",
        prompt: "Review recent recorded decisions for contradictions or superseded \
                 choices. Propose which should be marked obsolete and why.",
    },
];

/// Look up a scenario by name.
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}
