//! Read-side filtering of the task collection.

use crate::db::models::{Category, Task};

/// Completion tab: all, still-open, or finished tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// Sidebar category selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

/// The visibility predicate.
///
/// The `active` and `completed` tabs decide on the completion flag alone;
/// the category selection only narrows the `all` tab. As a consequence the
/// union of the three tabs under any fixed category selection is always the
/// whole collection.
pub fn matches(task: &Task, status: StatusFilter, category: CategoryFilter) -> bool {
    match status {
        StatusFilter::Active => !task.completed,
        StatusFilter::Completed => task.completed,
        StatusFilter::All => match category {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => task.category == wanted,
        },
    }
}
