//! Guest-mode persistence: the whole task collection serialized into one row
//! of the local key/value store.
//!
//! Every mutation writes the entire collection over the previous snapshot.
//! Correct but not minimal; the collection is small enough that this is the
//! same trade the original storage medium made.

use sqlx::SqlitePool;

use crate::backend::TaskPersistence;
use crate::db::models::{Task, TaskId, TaskPatch};
use crate::db::{kv_get, kv_set};
use crate::error::Result;

/// Key holding the serialized task collection.
pub const TASKS_KEY: &str = "todos";

pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn load_tasks(&self) -> Result<Vec<Task>> {
        let Some(raw) = kv_get(&self.pool, TASKS_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(tasks) => Ok(tasks),
            Err(e) => {
                // An unreadable snapshot must not take the session down with
                // it. Start empty; the next write replaces the bad snapshot.
                tracing::warn!(error = %e, "stored task list is unreadable, starting empty");
                Ok(Vec::new())
            }
        }
    }

    pub async fn save_snapshot(&self, all: &[Task]) -> Result<()> {
        let json = serde_json::to_string(all)?;
        kv_set(&self.pool, TASKS_KEY, &json).await
    }
}

impl TaskPersistence for LocalStore {
    fn load(&self) -> impl std::future::Future<Output = Result<Vec<Task>>> + Send {
        self.load_tasks()
    }

    fn insert(
        &self,
        _task: &Task,
        all: &[Task],
    ) -> impl std::future::Future<Output = Result<Option<TaskId>>> + Send {
        async move {
            self.save_snapshot(all).await?;
            // Local ids are already final; there is nothing to reconcile.
            Ok(None)
        }
    }

    fn set_completed(
        &self,
        _id: TaskId,
        _completed: bool,
        all: &[Task],
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        self.save_snapshot(all)
    }

    fn update(
        &self,
        _id: TaskId,
        _patch: &TaskPatch,
        all: &[Task],
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        self.save_snapshot(all)
    }

    fn delete(
        &self,
        _id: TaskId,
        all: &[Task],
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        self.save_snapshot(all)
    }

    fn order_changed(&self, all: &[Task]) -> impl std::future::Future<Output = Result<()>> + Send {
        self.save_snapshot(all)
    }
}
