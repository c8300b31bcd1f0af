//! Storage backends for the task collection.
//!
//! Every method is a single database call, so single-document atomicity is
//! all the store relies on. Concurrent writers to the same task race at the
//! database and the last write wins.

use crate::error::{Result, TaskError};
use crate::models::TaskDocument;
use crate::resolver::ResolvedTarget;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Document, doc};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use tokio::sync::RwLock;

pub const COLLECTION: &str = "tasks";

/// Persistence operations the task store is built on
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn insert(&self, task: &TaskDocument) -> Result<()>;

    /// All tasks, oldest first, ties broken by id
    async fn find_all(&self) -> Result<Vec<TaskDocument>>;

    async fn find_one(&self, id: ObjectId) -> Result<Option<TaskDocument>>;

    /// Negate `completed` and stamp the update, returning the new state
    async fn toggle_completed(
        &self,
        id: ObjectId,
        at: DateTime<Utc>,
        instance: &str,
    ) -> Result<Option<TaskDocument>>;

    async fn delete_one(&self, id: ObjectId) -> Result<bool>;

    /// Remove every task, or only completed ones
    async fn delete_many(&self, completed_only: bool) -> Result<u64>;

    /// Count all tasks, or those with the given completion state
    async fn count(&self, completed: Option<bool>) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}

fn completed_filter(completed: Option<bool>) -> Document {
    match completed {
        Some(state) => doc! { "completed": state },
        None => doc! {},
    }
}

// ==================== MongoDB ====================

/// Long-lived handle on the `tasks` collection of the resolved database
#[derive(Clone)]
pub struct MongoBackend {
    database: Database,
    tasks: Collection<TaskDocument>,
}

impl MongoBackend {
    /// Build a client for `target`. Servers are not contacted until the first
    /// operation, though a `mongodb+srv://` string is resolved through DNS
    /// here. `timeout` bounds server selection and connecting.
    pub async fn connect(target: &ResolvedTarget, timeout: Duration) -> Result<Self> {
        let mut options = ClientOptions::parse(target.connection_string.as_str()).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        // The database comes from the resolved name, never from the URI path.
        let database = client.database(&target.database_name);
        let tasks = database.collection::<TaskDocument>(COLLECTION);

        Ok(MongoBackend { database, tasks })
    }
}

/// A stored document the driver cannot decode into a task is `Corrupt`,
/// anything else stays a database error.
fn read_error(err: mongodb::error::Error) -> TaskError {
    if let mongodb::error::ErrorKind::BsonDeserialization(cause) = err.kind.as_ref() {
        return TaskError::Corrupt(cause.to_string());
    }
    TaskError::Database(err)
}

#[async_trait]
impl TaskBackend for MongoBackend {
    async fn insert(&self, task: &TaskDocument) -> Result<()> {
        self.tasks.insert_one(task).await?;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<TaskDocument>> {
        let cursor = self
            .tasks
            .find(doc! {})
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await
            .map_err(read_error)?;
        cursor.try_collect().await.map_err(read_error)
    }

    async fn find_one(&self, id: ObjectId) -> Result<Option<TaskDocument>> {
        self.tasks
            .find_one(doc! { "_id": id })
            .await
            .map_err(read_error)
    }

    async fn toggle_completed(
        &self,
        id: ObjectId,
        at: DateTime<Utc>,
        instance: &str,
    ) -> Result<Option<TaskDocument>> {
        // Update pipeline so read-negate-write is one atomic document update.
        let pipeline = vec![doc! {
            "$set": {
                "completed": { "$not": ["$completed"] },
                "updated_at": bson::DateTime::from_chrono(at),
                "updated_by_pod": { "$literal": instance },
            }
        }];

        self.tasks
            .find_one_and_update(doc! { "_id": id }, pipeline)
            .return_document(ReturnDocument::After)
            .await
            .map_err(read_error)
    }

    async fn delete_one(&self, id: ObjectId) -> Result<bool> {
        let result = self.tasks.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, completed_only: bool) -> Result<u64> {
        let filter = completed_filter(completed_only.then_some(true));
        let result = self.tasks.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    async fn count(&self, completed: Option<bool>) -> Result<u64> {
        Ok(self.tasks.count_documents(completed_filter(completed)).await?)
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

// ==================== In-memory ====================

/// Process-local backend with the same semantics. Used by the store's tests
/// and by embedders that want a store without a server.
#[derive(Default)]
pub struct MemoryBackend {
    tasks: RwLock<Vec<TaskDocument>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskBackend for MemoryBackend {
    async fn insert(&self, task: &TaskDocument) -> Result<()> {
        self.tasks.write().await.push(task.clone());
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<TaskDocument>> {
        let mut tasks = self.tasks.read().await.clone();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn find_one(&self, id: ObjectId) -> Result<Option<TaskDocument>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn toggle_completed(
        &self,
        id: ObjectId,
        at: DateTime<Utc>,
        instance: &str,
    ) -> Result<Option<TaskDocument>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.iter_mut().find(|task| task.id == id).map(|task| {
            task.completed = !task.completed;
            task.updated_at = Some(bson::DateTime::from_chrono(at));
            task.updated_by_pod = Some(instance.to_string());
            task.clone()
        }))
    }

    async fn delete_one(&self, id: ObjectId) -> Result<bool> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        Ok(tasks.len() < before)
    }

    async fn delete_many(&self, completed_only: bool) -> Result<u64> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| completed_only && !task.completed);
        Ok((before - tasks.len()) as u64)
    }

    async fn count(&self, completed: Option<bool>) -> Result<u64> {
        let tasks = self.tasks.read().await;
        let count = tasks
            .iter()
            .filter(|task| completed.is_none_or(|state| task.completed == state))
            .count();
        Ok(count as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Environment key naming a MongoDB server the storage tests may write to
#[cfg(test)]
pub(crate) const TEST_URI_KEY: &str = "TASKBOARD_TEST_MONGODB_URI";

#[cfg(test)]
impl MongoBackend {
    /// Backend on a fresh, uniquely named database of the server in
    /// `TASKBOARD_TEST_MONGODB_URI`, or `None` when that is unset.
    pub(crate) async fn for_tests() -> Option<Self> {
        let Some(uri) = std::env::var(TEST_URI_KEY)
            .ok()
            .filter(|uri| !uri.trim().is_empty())
        else {
            eprintln!("{TEST_URI_KEY} not set, skipping MongoDB test");
            return None;
        };

        let config = crate::config::ConnectionConfig {
            uri: Some(uri),
            database_name: Some(format!("taskboard_test_{}", ObjectId::new().to_hex())),
            ..Default::default()
        };
        let target = crate::resolver::resolve(&config).expect("test URI resolves");
        let backend = MongoBackend::connect(&target, Duration::from_secs(5))
            .await
            .expect("test client");
        Some(backend)
    }

    pub(crate) async fn drop_database(&self) {
        self.database.drop().await.expect("drop test database");
    }
}
