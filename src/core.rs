use crate::config::{InstanceInfo, ServiceConfig};
use crate::db::{MemoryBackend, MongoBackend, TaskBackend};
use crate::error::{Result, TaskError};
use crate::models::{
    DatabaseState, Health, ReadinessReport, ReadinessStatus, Task, TaskDocument, TaskSummary,
};
use crate::resolver::ResolvedTarget;
use bson::oid::ObjectId;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Task operations shared by every request path of one instance.
///
/// Cloning is cheap and every clone talks to the same backend handle.
#[derive(Clone)]
pub struct TaskStore {
    backend: Arc<dyn TaskBackend>,
    ping_timeout: Duration,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn TaskBackend>, ping_timeout: Duration) -> Self {
        TaskStore {
            backend,
            ping_timeout,
        }
    }

    /// Open the MongoDB handle for a resolved target
    pub async fn connect(target: &ResolvedTarget, config: &ServiceConfig) -> Result<Self> {
        let backend = MongoBackend::connect(target, config.ping_timeout).await?;
        Ok(Self::new(Arc::new(backend), config.ping_timeout))
    }

    /// Store backed by process memory
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryBackend::new()),
            crate::config::DEFAULT_PING_TIMEOUT,
        )
    }

    // ==================== Task Operations ====================

    /// Create a task with a trimmed, non-empty title
    pub async fn create(&self, title: &str, instance: &str) -> Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }

        let doc = TaskDocument::new(title, Utc::now(), instance);
        self.backend.insert(&doc).await?;
        info!(id = %doc.id, instance, "Task created");

        Ok(doc.into())
    }

    /// All tasks, oldest first
    pub async fn list(&self) -> Result<Vec<Task>> {
        let docs = self.backend.find_all().await?;
        Ok(docs.into_iter().map(Task::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Task> {
        let oid = parse_id(id)?;
        self.backend
            .find_one(oid)
            .await?
            .map(Task::from)
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))
    }

    /// Flip `completed` and record who changed it.
    ///
    /// Concurrent toggles of the same task are applied one after another by
    /// the database; the final state depends on arrival order.
    pub async fn toggle_complete(&self, id: &str, instance: &str) -> Result<Task> {
        let oid = parse_id(id)?;
        let doc = self
            .backend
            .toggle_completed(oid, Utc::now(), instance)
            .await?
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))?;

        info!(
            id,
            instance,
            "Task marked as {}",
            if doc.completed { "completed" } else { "pending" }
        );
        Ok(doc.into())
    }

    /// Remove one task. A second delete of the same id is `TaskNotFound`.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let oid = parse_id(id)?;
        if !self.backend.delete_one(oid).await? {
            return Err(TaskError::TaskNotFound(id.to_string()));
        }
        info!(id, "Task deleted");
        Ok(())
    }

    /// Remove every task; an empty collection yields zero
    pub async fn delete_all(&self) -> Result<u64> {
        let removed = self.backend.delete_many(false).await?;
        info!(removed, "All tasks deleted");
        Ok(removed)
    }

    /// Remove only completed tasks
    pub async fn delete_completed(&self) -> Result<u64> {
        let removed = self.backend.delete_many(true).await?;
        info!(removed, "Completed tasks deleted");
        Ok(removed)
    }

    pub async fn summary(&self) -> Result<TaskSummary> {
        let total = self.backend.count(None).await?;
        let completed = self.backend.count(Some(true)).await?;
        Ok(TaskSummary {
            total,
            completed,
            pending: total.saturating_sub(completed),
        })
    }

    // ==================== Health ====================

    /// Ping the database, giving up after the configured timeout
    pub async fn check_connectivity(&self) -> Health {
        let outcome = match tokio::time::timeout(self.ping_timeout, self.backend.ping()).await {
            Ok(result) => result,
            Err(_) => Err(TaskError::Timeout(self.ping_timeout)),
        };

        match outcome {
            Ok(()) => Health::Healthy,
            Err(e) => {
                error!("Connectivity check failed: {e}");
                Health::Unhealthy {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Connectivity check shaped as the readiness probe body
    pub async fn readiness(&self, instance: &InstanceInfo) -> ReadinessReport {
        let (status, database, error) = match self.check_connectivity().await {
            Health::Healthy => (ReadinessStatus::Ready, DatabaseState::Connected, None),
            Health::Unhealthy { reason } => (
                ReadinessStatus::NotReady,
                DatabaseState::Disconnected,
                Some(reason),
            ),
        };

        ReadinessReport {
            status,
            pod: instance.name.clone(),
            pod_ip: instance.ip.clone(),
            database,
            error,
            timestamp: Utc::now(),
        }
    }
}

/// Malformed ids are indistinguishable from missing ones
fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id.trim()).map_err(|_| TaskError::TaskNotFound(id.to_string()))
}
