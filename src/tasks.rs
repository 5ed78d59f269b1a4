//! The task store: the authoritative in-memory collection for the session.
//!
//! Mutations are optimistic and two-phase. Phase one is synchronous: the
//! collection changes in memory and the UI can re-render immediately. Phase
//! two mirrors the change to the persistence backend; a failure there is
//! logged and swallowed, the in-memory state stands. The one exception to
//! "nothing flows back" is creation, where the backing store's assigned id
//! replaces the locally generated one.

use chrono::Utc;

use crate::backend::TaskPersistence;
use crate::celebrations::{Celebration, CelebrationSender};
use crate::db::models::{NewTask, Priority, Task, TaskId, TaskPatch};
use crate::filters::{self, CategoryFilter, StatusFilter};

pub struct TaskStore<P: TaskPersistence> {
    tasks: Vec<Task>,
    persistence: P,
    celebrations: CelebrationSender,
    editing: Option<TaskId>,
    default_priority: Priority,
}

impl<P: TaskPersistence> TaskStore<P> {
    pub fn new(persistence: P) -> Self {
        Self {
            tasks: Vec::new(),
            persistence,
            celebrations: CelebrationSender::disabled(),
            editing: None,
            default_priority: Priority::default(),
        }
    }

    /// Create a store wired to a celebration channel the UI listens on.
    pub fn with_celebrations(persistence: P, celebrations: CelebrationSender) -> Self {
        Self {
            celebrations,
            ..Self::new(persistence)
        }
    }

    /// Override the priority applied to drafts that do not pick one.
    pub fn set_default_priority(&mut self, priority: Priority) {
        self.default_priority = priority;
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Open tasks, the number the greeting header reports.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    /// The filtered view the task list renders, in display order.
    pub fn visible(&self, status: StatusFilter, category: CategoryFilter) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| filters::matches(t, status, category))
            .collect()
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    pub fn set_editing(&mut self, id: Option<TaskId>) {
        self.editing = id;
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Replace the collection from the backend at session start. A backend
    /// failure leaves an empty collection; the session starts rather than
    /// crashing.
    pub async fn load(&mut self) {
        self.tasks = match self.persistence.load().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load task collection");
                Vec::new()
            }
        };
    }

    /// Create a task from a draft and prepend it (newest first). Returns the
    /// task's id, or `None` when the trimmed title is empty; the refusal is
    /// silent, nothing else happens.
    pub async fn add(&mut self, draft: NewTask) -> Option<TaskId> {
        let text = draft.text.trim();
        if text.is_empty() {
            return None;
        }

        let description = draft.description.trim();
        let task = Task {
            id: next_local_id(&self.tasks),
            text: text.to_string(),
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
            completed: false,
            category: draft.category,
            priority: draft.priority.unwrap_or(self.default_priority),
            subtasks: draft.subtasks,
            date: draft.date,
            icon: draft.icon,
            created_at: Utc::now(),
        };
        let local_id = task.id;

        self.tasks.insert(0, task);
        self.celebrations.send(Celebration::task_added());

        let assigned = match self.persistence.insert(&self.tasks[0], &self.tasks).await {
            Ok(assigned) => assigned,
            Err(e) => {
                tracing::warn!(task_id = local_id, error = %e, "failed to persist new task");
                None
            }
        };

        // Reconciliation rewrites the id and nothing else; position and the
        // other fields stay as the optimistic insert left them.
        if let Some(store_id) = assigned {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == local_id) {
                task.id = store_id;
            }
            return Some(store_id);
        }
        Some(local_id)
    }

    /// Flip the completion flag of the matching task. Unknown ids are
    /// ignored. Only the false→true transition celebrates.
    pub async fn toggle(&mut self, id: TaskId) {
        let completed = {
            let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
                return;
            };
            task.completed = !task.completed;
            task.completed
        };

        if completed {
            self.celebrations.send(Celebration::task_completed());
        }

        if let Err(e) = self.persistence.set_completed(id, completed, &self.tasks).await {
            tracing::warn!(task_id = id, error = %e, "failed to persist completion state");
        }
    }

    /// Remove the matching task. Unknown ids are ignored.
    pub async fn remove(&mut self, id: TaskId) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return;
        }

        if let Err(e) = self.persistence.delete(id, &self.tasks).await {
            tracing::warn!(task_id = id, error = %e, "failed to persist task deletion");
        }
    }

    /// Shallow-merge a patch into the matching task. Clears the editing
    /// reference whether or not the id matched.
    pub async fn update(&mut self, id: TaskId, patch: TaskPatch) {
        self.editing = None;

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        task.apply(&patch);

        if let Err(e) = self.persistence.update(id, &patch, &self.tasks).await {
            tracing::warn!(task_id = id, error = %e, "failed to persist task update");
        }
    }

    /// Move the source task to the target task's position: remove, then
    /// insert at the index the target held. A no-op when either id is
    /// missing or both are the same.
    pub async fn reorder(&mut self, source_id: TaskId, target_id: TaskId) {
        if source_id == target_id {
            return;
        }
        let Some(from) = self.tasks.iter().position(|t| t.id == source_id) else {
            return;
        };
        let Some(to) = self.tasks.iter().position(|t| t.id == target_id) else {
            return;
        };

        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);

        if let Err(e) = self.persistence.order_changed(&self.tasks).await {
            tracing::warn!(error = %e, "failed to persist display order");
        }
    }
}

/// Millisecond-derived id for records created before the backing store has
/// seen them. Bumped past any id already in the collection, so two tasks
/// created within the same millisecond still come out distinct.
fn next_local_id(tasks: &[Task]) -> TaskId {
    let mut id = Utc::now().timestamp_millis();
    while tasks.iter().any(|t| t.id == id) {
        id += 1;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Category;
    use crate::error::{GorevError, Result};
    use std::sync::Mutex;

    /// Test backend that records every call and can be told to fail writes
    /// or hand out a fixed remote id.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<String>>,
        canned: Vec<Task>,
        assigned_id: Option<TaskId>,
        fail_writes: bool,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) -> Result<()> {
            self.calls.lock().unwrap().push(call.to_string());
            if self.fail_writes {
                return Err(GorevError::InvalidInput("backend down".to_string()));
            }
            Ok(())
        }
    }

    impl TaskPersistence for RecordingBackend {
        fn load(&self) -> impl std::future::Future<Output = Result<Vec<Task>>> + Send {
            async move {
                self.record("load")?;
                Ok(self.canned.clone())
            }
        }

        fn insert(
            &self,
            task: &Task,
            _all: &[Task],
        ) -> impl std::future::Future<Output = Result<Option<TaskId>>> + Send {
            let call = format!("insert:{}", task.text);
            async move {
                self.record(&call)?;
                Ok(self.assigned_id)
            }
        }

        fn set_completed(
            &self,
            id: TaskId,
            completed: bool,
            _all: &[Task],
        ) -> impl std::future::Future<Output = Result<()>> + Send {
            let call = format!("set_completed:{}:{}", id, completed);
            async move { self.record(&call) }
        }

        fn update(
            &self,
            id: TaskId,
            _patch: &TaskPatch,
            _all: &[Task],
        ) -> impl std::future::Future<Output = Result<()>> + Send {
            let call = format!("update:{}", id);
            async move { self.record(&call) }
        }

        fn delete(
            &self,
            id: TaskId,
            _all: &[Task],
        ) -> impl std::future::Future<Output = Result<()>> + Send {
            let call = format!("delete:{}", id);
            async move { self.record(&call) }
        }

        fn order_changed(
            &self,
            _all: &[Task],
        ) -> impl std::future::Future<Output = Result<()>> + Send {
            async move { self.record("order_changed") }
        }
    }

    fn store() -> TaskStore<RecordingBackend> {
        TaskStore::new(RecordingBackend::default())
    }

    #[tokio::test]
    async fn test_add_prepends_new_task() {
        let mut store = store();

        store.add(NewTask::new("first")).await.unwrap();
        store.add(NewTask::new("second")).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.tasks()[0].text, "second");
        assert_eq!(store.tasks()[1].text, "first");
    }

    #[tokio::test]
    async fn test_add_trims_title_and_description() {
        let mut store = store();

        let mut draft = NewTask::new("  Buy milk  ");
        draft.description = "  whole fat  ".to_string();
        let id = store.add(draft).await.unwrap();

        let task = store.get(id).unwrap();
        assert_eq!(task.text, "Buy milk");
        assert_eq!(task.description.as_deref(), Some("whole fat"));
    }

    #[tokio::test]
    async fn test_add_refuses_blank_title() {
        let mut store = store();

        assert!(store.add(NewTask::new("")).await.is_none());
        assert!(store.add(NewTask::new("   ")).await.is_none());

        assert!(store.is_empty());
        // The refusal never reached the backend
        assert!(store.persistence.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_applies_configured_default_priority() {
        let mut store = store();
        store.set_default_priority(Priority::Low);

        let id = store.add(NewTask::new("no explicit priority")).await.unwrap();
        assert_eq!(store.get(id).unwrap().priority, Priority::Low);

        let mut draft = NewTask::new("explicit");
        draft.priority = Some(Priority::High);
        let id = store.add(draft).await.unwrap();
        assert_eq!(store.get(id).unwrap().priority, Priority::High);
    }

    #[tokio::test]
    async fn test_add_reconciles_store_assigned_id() {
        let mut store = TaskStore::new(RecordingBackend {
            assigned_id: Some(4242),
            ..RecordingBackend::default()
        });

        let id = store.add(NewTask::new("remote")).await.unwrap();

        assert_eq!(id, 4242);
        assert_eq!(store.tasks()[0].id, 4242);
        assert_eq!(store.tasks()[0].text, "remote");
    }

    #[tokio::test]
    async fn test_add_survives_backend_failure() {
        let mut store = TaskStore::new(RecordingBackend {
            fail_writes: true,
            ..RecordingBackend::default()
        });

        let id = store.add(NewTask::new("kept anyway")).await.unwrap();

        // Optimistic state stands; the local id is final
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().text, "kept anyway");
    }

    #[tokio::test]
    async fn test_add_emits_celebration() {
        let (celebrations, mut rx) = CelebrationSender::channel();
        let mut store =
            TaskStore::with_celebrations(RecordingBackend::default(), celebrations);

        store.add(NewTask::new("party")).await.unwrap();

        assert_eq!(rx.try_recv().unwrap(), Celebration::task_added());
    }

    #[tokio::test]
    async fn test_toggle_is_its_own_inverse() {
        let mut store = store();
        let id = store.add(NewTask::new("flip me")).await.unwrap();

        store.toggle(id).await;
        assert!(store.get(id).unwrap().completed);

        store.toggle(id).await;
        assert!(!store.get(id).unwrap().completed);
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_is_a_noop() {
        let mut store = store();
        store.add(NewTask::new("only me")).await.unwrap();
        let before = store.tasks().to_vec();

        store.toggle(999).await;

        assert_eq!(store.tasks(), &before[..]);
        assert!(!store.persistence.calls().iter().any(|c| c.starts_with("set_completed")));
    }

    #[tokio::test]
    async fn test_toggle_celebrates_only_completion() {
        let (celebrations, mut rx) = CelebrationSender::channel();
        let mut store =
            TaskStore::with_celebrations(RecordingBackend::default(), celebrations);

        let id = store.add(NewTask::new("cheer once")).await.unwrap();
        rx.try_recv().unwrap(); // drain the add burst

        store.toggle(id).await; // false -> true
        assert_eq!(rx.try_recv().unwrap(), Celebration::task_completed());

        store.toggle(id).await; // true -> false, silent
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_remove_deletes_exactly_one() {
        let mut store = store();
        let keep = store.add(NewTask::new("keep")).await.unwrap();
        let drop = store.add(NewTask::new("drop")).await.unwrap();

        store.remove(drop).await;

        assert_eq!(store.len(), 1);
        assert!(store.get(keep).is_some());
        assert!(store.get(drop).is_none());
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_a_noop() {
        let mut store = store();
        store.add(NewTask::new("survivor")).await.unwrap();

        store.remove(12345).await;

        assert_eq!(store.len(), 1);
        assert!(!store.persistence.calls().iter().any(|c| c.starts_with("delete")));
    }

    #[tokio::test]
    async fn test_update_changes_only_patched_fields() {
        let mut store = store();
        let mut draft = NewTask::new("original title");
        draft.category = Category::Work;
        let id = store.add(draft).await.unwrap();
        let untouched = store.add(NewTask::new("bystander")).await.unwrap();
        let bystander_before = store.get(untouched).unwrap().clone();

        store
            .update(
                id,
                TaskPatch {
                    priority: Some(Priority::High),
                    ..TaskPatch::default()
                },
            )
            .await;

        let task = store.get(id).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.text, "original title");
        assert_eq!(task.category, Category::Work);
        assert_eq!(store.get(untouched).unwrap(), &bystander_before);
    }

    #[tokio::test]
    async fn test_update_clears_editing_reference() {
        let mut store = store();
        let id = store.add(NewTask::new("edited")).await.unwrap();
        store.set_editing(Some(id));

        store.update(id, TaskPatch::default()).await;
        assert_eq!(store.editing(), None);

        // Cleared even when the id does not match anything
        store.set_editing(Some(id));
        store.update(999, TaskPatch::default()).await;
        assert_eq!(store.editing(), None);
    }

    #[tokio::test]
    async fn test_reorder_moves_source_to_target_index() {
        let mut store = store();
        let a = store.add(NewTask::new("A")).await.unwrap();
        let b = store.add(NewTask::new("B")).await.unwrap();
        // Newest first: [B, A]
        assert_eq!(store.tasks()[0].id, b);

        store.reorder(a, b).await;

        let order: Vec<TaskId> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[tokio::test]
    async fn test_reorder_preserves_records() {
        let mut store = store();
        let a = store.add(NewTask::new("A")).await.unwrap();
        let b = store.add(NewTask::new("B")).await.unwrap();
        let c = store.add(NewTask::new("C")).await.unwrap();
        let mut before: Vec<Task> = store.tasks().to_vec();

        store.reorder(c, a).await;

        let mut after: Vec<Task> = store.tasks().to_vec();
        before.sort_by_key(|t| t.id);
        after.sort_by_key(|t| t.id);
        assert_eq!(before, after);
        let _ = b;
    }

    #[tokio::test]
    async fn test_reorder_same_id_is_a_noop() {
        let mut store = store();
        let a = store.add(NewTask::new("A")).await.unwrap();
        store.add(NewTask::new("B")).await.unwrap();
        let before: Vec<TaskId> = store.tasks().iter().map(|t| t.id).collect();

        store.reorder(a, a).await;

        let after: Vec<TaskId> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(before, after);
        assert!(!store.persistence.calls().iter().any(|c| c == "order_changed"));
    }

    #[tokio::test]
    async fn test_reorder_unknown_ids_are_a_noop() {
        let mut store = store();
        let a = store.add(NewTask::new("A")).await.unwrap();

        store.reorder(a, 999).await;
        store.reorder(999, a).await;

        assert_eq!(store.tasks()[0].id, a);
    }

    #[tokio::test]
    async fn test_load_replaces_collection() {
        let canned = vec![
            Task {
                id: 1,
                text: "from backend".to_string(),
                description: None,
                completed: false,
                category: Category::Personal,
                priority: Priority::Medium,
                subtasks: Vec::new(),
                date: None,
                icon: None,
                created_at: Utc::now(),
            },
        ];
        let mut store = TaskStore::new(RecordingBackend {
            canned: canned.clone(),
            ..RecordingBackend::default()
        });
        store.add(NewTask::new("stale")).await;

        store.load().await;

        assert_eq!(store.tasks(), &canned[..]);
    }

    #[tokio::test]
    async fn test_load_failure_leaves_empty_collection() {
        let mut store = TaskStore::new(RecordingBackend {
            fail_writes: true,
            ..RecordingBackend::default()
        });

        store.load().await;

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_visible_respects_filters() {
        let mut store = store();
        let mut shopping = NewTask::new("milk");
        shopping.category = Category::Shopping;
        let milk = store.add(shopping).await.unwrap();
        let chore = store.add(NewTask::new("laundry")).await.unwrap();
        store.toggle(chore).await;

        let active = store.visible(StatusFilter::Active, CategoryFilter::All);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, milk);

        let shopping_tab = store.visible(
            StatusFilter::All,
            CategoryFilter::Only(Category::Shopping),
        );
        assert_eq!(shopping_tab.len(), 1);
        assert_eq!(shopping_tab[0].id, milk);

        assert_eq!(store.active_count(), 1);
    }

    #[tokio::test]
    async fn test_local_ids_unique_within_same_millisecond() {
        let mut store = store();
        let mut ids = Vec::new();
        for i in 0..10 {
            ids.push(store.add(NewTask::new(format!("task {}", i))).await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }
}
