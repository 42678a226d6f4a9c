use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use super::manifest::FleetManifest;
use crate::domain::models::ProjectHealth;
use crate::domain::ports::{HealthError, HealthScanner};

/// Health scanner driven by the fleet manifest.
///
/// A workspace is drifted when any of its `expected_modules` is absent. A
/// workspace whose directory is missing entirely is reported healthy. The
/// manifest is re-read on every call so edits apply on the next tick.
pub struct ManifestHealthScanner {
    manifest_path: PathBuf,
}

impl ManifestHealthScanner {
    /// Scanner for the fleet listed in the manifest at `manifest_path`.
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }

    async fn manifest(&self) -> Result<FleetManifest, HealthError> {
        FleetManifest::load(&self.manifest_path)
            .await
            .map_err(|e| HealthError::Manifest(e.to_string()))
    }
}

#[async_trait]
impl HealthScanner for ManifestHealthScanner {
    async fn projects(&self) -> Result<Vec<String>, HealthError> {
        let manifest = self.manifest().await?;
        Ok(manifest.workspaces().iter().map(|w| w.name.clone()).collect())
    }

    async fn scan(&self, project: &str) -> Result<ProjectHealth, HealthError> {
        let manifest = self.manifest().await?;
        let workspace = manifest
            .find(project)
            .ok_or_else(|| HealthError::UnknownProject(project.to_string()))?;
        let root = manifest.resolve(workspace);
        let tech_stack = workspace.tech_stack.clone();

        info!(project, path = %root.display(), "evaluating workspace");

        let present = tokio::fs::try_exists(&root)
            .await
            .map_err(|e| HealthError::ScanFailed {
                project: project.to_string(),
                reason: e.to_string(),
            })?;
        if !present {
            debug!(project, "workspace directory missing; reporting healthy");
            return Ok(ProjectHealth::healthy(project).with_tech_stack(tech_stack));
        }

        let mut missing = Vec::new();
        for module in &workspace.expected_modules {
            let exists = tokio::fs::try_exists(root.join(module))
                .await
                .map_err(|e| HealthError::ScanFailed {
                    project: project.to_string(),
                    reason: e.to_string(),
                })?;
            if !exists {
                missing.push(module.clone());
            }
        }

        let health = if missing.is_empty() {
            ProjectHealth::healthy(project)
        } else {
            ProjectHealth::drifted(project, missing)
        };
        Ok(health.with_tech_stack(tech_stack))
    }
}
