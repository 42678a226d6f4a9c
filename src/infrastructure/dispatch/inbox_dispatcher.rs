//! Writes dispatched tasks as Markdown files into a workspace inbox.
//!
//! Layout: `<workspace>/.orchestrator/inbox/TASK_<id>.md`, YAML front-matter
//! followed by the task description.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::models::{DispatchReceipt, DispatchRecord};
use crate::domain::ports::{Clock, DispatchError, SystemClock, TaskDispatcher};
use crate::infrastructure::fleet::FleetManifest;

const AUTHOR: &str = "Nightwatch Orchestrator";

#[derive(Debug, Serialize)]
struct FrontMatter<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    title: &'a str,
    created: String,
    priority: &'a str,
    author: &'a str,
}

/// [`TaskDispatcher`] that resolves workspaces through the fleet manifest.
///
/// The manifest is re-read on every dispatch so workspaces added while the
/// patrol runs are picked up.
pub struct InboxDispatcher {
    manifest_path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl InboxDispatcher {
    /// Dispatcher for the fleet described by the manifest at `manifest_path`.
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for task ids and the `created` stamp.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Inbox directory for a workspace root.
    pub fn inbox_dir(workspace_root: &std::path::Path) -> PathBuf {
        workspace_root.join(".orchestrator").join("inbox")
    }

    fn render(&self, record: &DispatchRecord, task_id: &str, created: String) -> Result<String, DispatchError> {
        let front = FrontMatter {
            id: task_id,
            kind: record.task_kind.as_str(),
            title: &record.title,
            created,
            priority: record.priority.as_str(),
            author: AUTHOR,
        };
        let yaml = serde_yaml::to_string(&front).map_err(|e| DispatchError::Encode(e.to_string()))?;
        Ok(format!(
            "---\n{yaml}---\n\n# Task Description\n{}\n\n## Context\nDispatched by the nightwatch patrol.\n",
            record.description
        ))
    }
}

#[async_trait]
impl TaskDispatcher for InboxDispatcher {
    async fn dispatch(&self, record: &DispatchRecord) -> Result<DispatchReceipt, DispatchError> {
        let manifest = FleetManifest::load(&self.manifest_path)
            .await
            .map_err(|e| DispatchError::Manifest(e.to_string()))?;
        let workspace = manifest
            .find(&record.subject_name)
            .ok_or_else(|| DispatchError::UnknownWorkspace(record.subject_name.clone()))?;

        let now = self.clock.now();
        let suffix = Uuid::new_v4().simple().to_string();
        let task_id = format!("task-{}-{}", now.timestamp_millis(), &suffix[..8]);

        let inbox = Self::inbox_dir(&manifest.resolve(workspace));
        tokio::fs::create_dir_all(&inbox).await?;

        let path = inbox.join(format!("TASK_{task_id}.md"));
        let content = self.render(record, &task_id, now.to_rfc3339())?;
        tokio::fs::write(&path, content).await?;

        info!(
            task_id = %task_id,
            workspace = %record.subject_name,
            path = %path.display(),
            "task dispatched to workspace inbox"
        );

        Ok(DispatchReceipt {
            task_id,
            location: Some(path),
            dispatched_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Priority, TaskKind};
    use crate::domain::ports::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn record(subject: &str) -> DispatchRecord {
        DispatchRecord {
            subject_name: subject.to_string(),
            task_kind: TaskKind::DriftFix,
            title: "Auto-Fix Drift: proj-a (Reviewed by Critic)".to_string(),
            description: "## PLANNER PLAN\nadd auth".to_string(),
            priority: Priority::High,
        }
    }

    fn fleet() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("metasystem.yaml");
        fs::write(&manifest, "workspaces:\n  - name: proj-a\n    path: proj-a\n").unwrap();
        (dir, manifest)
    }

    #[tokio::test]
    async fn test_writes_task_file_with_front_matter() {
        let (dir, manifest) = fleet();
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let dispatcher =
            InboxDispatcher::new(&manifest).with_clock(Arc::new(ManualClock::new(created)));

        let receipt = dispatcher.dispatch(&record("proj-a")).await.unwrap();
        let path = receipt.location.clone().unwrap();
        assert_eq!(path.parent().unwrap(), dir.path().join("proj-a/.orchestrator/inbox"));
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("TASK_{}.md", receipt.task_id)
        );
        assert_eq!(receipt.dispatched_at, created);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("---\n"));
        let (front, body) = text[4..].split_once("---\n").unwrap();

        let front: serde_yaml::Value = serde_yaml::from_str(front).unwrap();
        assert_eq!(front["id"].as_str(), Some(receipt.task_id.as_str()));
        assert_eq!(front["type"].as_str(), Some("drift-fix"));
        assert_eq!(front["title"].as_str(), Some("Auto-Fix Drift: proj-a (Reviewed by Critic)"));
        assert_eq!(front["priority"].as_str(), Some("high"));
        assert_eq!(front["author"].as_str(), Some(AUTHOR));
        assert_eq!(front["created"].as_str(), Some(created.to_rfc3339().as_str()));

        assert!(body.contains("# Task Description\n## PLANNER PLAN\nadd auth"));
    }

    #[tokio::test]
    async fn test_unknown_workspace() {
        let (_dir, manifest) = fleet();
        let err = InboxDispatcher::new(&manifest)
            .dispatch(&record("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownWorkspace(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_task_ids_are_unique() {
        let (_dir, manifest) = fleet();
        let dispatcher = InboxDispatcher::new(&manifest);
        let a = dispatcher.dispatch(&record("proj-a")).await.unwrap();
        let b = dispatcher.dispatch(&record("proj-a")).await.unwrap();
        assert_ne!(a.task_id, b.task_id);
    }
}
