//! YAML fleet manifest.
//!
//! ```yaml
//! workspaces:
//!   - name: proj-a
//!     path: ../proj-a
//!     tech_stack: [rust]
//!     expected_modules: [src/auth, src/api]
//! ```
//!
//! Workspaces nested under `components:` are accepted too. Paths resolve
//! relative to the manifest's directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to read or parse the fleet manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Workspace '{0}' is declared more than once")]
    DuplicateWorkspace(String),
}

/// One managed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Paths, relative to the workspace, that must exist.
    #[serde(default)]
    pub expected_modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    workspaces: Vec<WorkspaceEntry>,
    #[serde(default)]
    components: Option<RawComponents>,
}

#[derive(Debug, Deserialize)]
struct RawComponents {
    #[serde(default)]
    workspaces: Vec<WorkspaceEntry>,
}

/// Parsed `metasystem.yaml` with paths resolved against its directory.
#[derive(Debug, Clone)]
pub struct FleetManifest {
    root: PathBuf,
    workspaces: Vec<WorkspaceEntry>,
}

impl FleetManifest {
    /// Parse manifest text. `root` is the directory workspace paths resolve against.
    pub fn parse(yaml: &str, root: impl Into<PathBuf>) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_yaml::from_str(yaml)?;
        let mut workspaces = raw.workspaces;
        if let Some(components) = raw.components {
            workspaces.extend(components.workspaces);
        }

        let mut seen = HashSet::new();
        for ws in &workspaces {
            if !seen.insert(ws.name.as_str()) {
                return Err(ManifestError::DuplicateWorkspace(ws.name.clone()));
            }
        }

        Ok(Self {
            root: root.into(),
            workspaces,
        })
    }

    /// Read and parse the manifest at `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let root = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::parse(&text, root)
    }

    /// Workspaces in manifest order.
    pub fn workspaces(&self) -> &[WorkspaceEntry] {
        &self.workspaces
    }

    /// Workspace named `name`, if listed.
    pub fn find(&self, name: &str) -> Option<&WorkspaceEntry> {
        self.workspaces.iter().find(|ws| ws.name == name)
    }

    /// Absolute or manifest-relative directory of a workspace.
    pub fn resolve(&self, workspace: &WorkspaceEntry) -> PathBuf {
        self.root.join(&workspace.path)
    }
}
