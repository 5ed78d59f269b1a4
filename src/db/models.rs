use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GorevError;

/// Identifier for a task or subtask.
///
/// Locally generated ids are derived from the creation instant in
/// milliseconds (bumped past collisions); the remote store assigns its own
/// sequence values on insert and the local id is rewritten once the insert
/// returns.
pub type TaskId = i64;

/// The fixed category set tasks are filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Shopping,
    Health,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Personal,
        Category::Work,
        Category::Shopping,
        Category::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Shopping => "shopping",
            Category::Health => "health",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = GorevError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(Category::Personal),
            "work" => Ok(Category::Work),
            "shopping" => Ok(Category::Shopping),
            "health" => Ok(Category::Health),
            _ => Err(GorevError::InvalidInput(format!(
                "Invalid category '{}'. Valid values: personal, work, shopping, health",
                s
            ))),
        }
    }
}

/// Task urgency. Drafts that do not pick one fall back to the configured
/// default (see `config::Config::default_priority`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = GorevError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(GorevError::InvalidInput(format!(
                "Invalid priority '{}'. Valid values: low, medium, high",
                s
            ))),
        }
    }
}

/// A nested checklist item owned by exactly one task. Subtasks have no
/// lifecycle of their own; they travel with the parent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// A single to-do item. The in-memory collection order is the display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    /// Scheduled calendar date, if any. Serialized as an ISO date string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Symbolic glyph name. Not validated against any icon set; an unknown
    /// name simply renders without a glyph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Apply a shallow field patch. Only fields present in the patch are
    /// replaced; an empty patched description clears the field.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(description) = &patch.description {
            self.description = if description.is_empty() {
                None
            } else {
                Some(description.clone())
            };
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(subtasks) = &patch.subtasks {
            self.subtasks = subtasks.clone();
        }
        if let Some(date) = patch.date {
            self.date = Some(date);
        }
        if let Some(icon) = &patch.icon {
            self.icon = Some(icon.clone());
        }
    }
}

/// Draft for a task about to be created. Mirrors the entry form: a title
/// plus whatever optional detail the user filled in before submitting.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub text: String,
    pub description: String,
    pub category: Category,
    /// `None` falls back to the store's configured default.
    pub priority: Option<Priority>,
    pub date: Option<NaiveDate>,
    pub icon: Option<String>,
    pub subtasks: Vec<Subtask>,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Append a subtask to the draft. Empty or whitespace-only titles are
    /// refused the same way an empty task title is.
    pub fn add_subtask(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let mut id = Utc::now().timestamp_millis();
        while self.subtasks.iter().any(|s| s.id == id) {
            id += 1;
        }
        self.subtasks.push(Subtask {
            id,
            text: text.to_string(),
            completed: false,
        });
    }

    /// Remove a draft subtask by id. Unknown ids are ignored.
    pub fn remove_subtask(&mut self, id: TaskId) {
        self.subtasks.retain(|s| s.id != id);
    }
}

/// Shallow field patch for `update`. Absent fields are left untouched on the
/// target record; present fields replace wholesale (subtask lists included).
///
/// Serializes with absent fields skipped, which is exactly the partial-update
/// body the remote store expects.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}
