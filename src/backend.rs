//! Persistence trait abstraction for the task store.
//!
//! The store mutates its in-memory collection first and then hands the change
//! to one of two backends: the local key/value snapshot (guest sessions) or
//! the remote record store (authenticated sessions). Which one is in play is
//! decided once, when the session loads; the store itself never branches on
//! session state.

use std::future::Future;

use crate::db::models::{Task, TaskId, TaskPatch};
use crate::error::Result;

/// Durable mirror of the in-memory task collection.
///
/// Every mutation hook receives the full post-mutation collection so that a
/// snapshot-style backend can overwrite its copy wholesale; targeted backends
/// ignore it and persist just the one change. All calls are best-effort from
/// the store's point of view: a returned error is logged and swallowed, never
/// rolled back.
pub trait TaskPersistence: Send + Sync {
    /// Fetch the collection at session start, newest first.
    fn load(&self) -> impl Future<Output = Result<Vec<Task>>> + Send;

    /// Persist a newly created task. Returns the backing store's assigned id
    /// when it differs from the locally generated one, `None` otherwise.
    fn insert(
        &self,
        task: &Task,
        all: &[Task],
    ) -> impl Future<Output = Result<Option<TaskId>>> + Send;

    /// Persist a completion flag change.
    fn set_completed(
        &self,
        id: TaskId,
        completed: bool,
        all: &[Task],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Persist a shallow field patch.
    fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        all: &[Task],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Persist a deletion.
    fn delete(&self, id: TaskId, all: &[Task]) -> impl Future<Output = Result<()>> + Send;

    /// Called after a drag-reorder. Snapshot backends persist the new order;
    /// the remote store does not record display order, so reordering does not
    /// survive an authenticated reload.
    fn order_changed(&self, all: &[Task]) -> impl Future<Output = Result<()>> + Send;
}
