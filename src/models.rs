use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task as handed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Hex form of the stored ObjectId
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub created_by_instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by_instance: Option<String>,
}

impl Task {
    pub fn status(&self) -> &'static str {
        if self.completed { "completed" } else { "pending" }
    }

    pub fn icon(&self) -> &'static str {
        if self.completed { "✓" } else { "○" }
    }
}

impl From<TaskDocument> for Task {
    fn from(doc: TaskDocument) -> Self {
        Task {
            id: doc.id.to_hex(),
            title: doc.title,
            completed: doc.completed,
            created_at: doc.created_at.to_chrono(),
            created_by_instance: doc.created_by_pod,
            updated_at: doc.updated_at.map(bson::DateTime::to_chrono),
            updated_by_instance: doc.updated_by_pod,
        }
    }
}

/// Stored shape of a task in the `tasks` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: bson::DateTime,
    #[serde(default)]
    pub created_by_pod: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by_pod: Option<String>,
}

impl TaskDocument {
    /// A fresh, not yet completed task
    pub fn new(title: &str, created_at: DateTime<Utc>, instance: &str) -> Self {
        TaskDocument {
            id: ObjectId::new(),
            title: title.to_string(),
            completed: false,
            created_at: bson::DateTime::from_chrono(created_at),
            created_by_pod: instance.to_string(),
            updated_at: None,
            updated_by_pod: None,
        }
    }
}

/// Counts shown alongside the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
}

/// Outcome of a connectivity round-trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy { reason: String },
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadinessStatus {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "not ready")]
    NotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseState {
    Connected,
    Disconnected,
}

/// Body of the readiness probe response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub status: ReadinessStatus,
    pub pod: String,
    /// Address of the instance that answered
    pub pod_ip: String,
    pub database: DatabaseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.status == ReadinessStatus::Ready
    }
}
