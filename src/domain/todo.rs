//! The todo entity and its mutable field sets.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::validation::{FieldError, ValidationErrors};

/// Storage-assigned todo identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TodoId(pub i64);

impl TodoId {
    /// Create a TodoId from a raw integer.
    pub fn new(id: i64) -> Self {
        TodoId(id)
    }

    /// Get the underlying integer value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored todo item, as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The complete set of mutable fields of a todo.
///
/// Only constructible through [`TodoFields::new`], so a value of this type
/// always carries a non-blank title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFields {
    title: String,
    description: Option<String>,
    completed: bool,
}

impl TodoFields {
    /// Create fields for a new, not yet completed todo.
    pub fn new(title: impl Into<String>) -> Result<Self, ValidationErrors> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(FieldError::new("title", "must not be empty").into());
        }
        Ok(Self {
            title,
            description: None,
            completed: false,
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn completed(&self) -> bool {
        self.completed
    }
}

/// A partial update. `None` leaves the stored value untouched.
///
/// `description` is doubly optional: `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<Option<String>>,
    pub(crate) completed: Option<bool>,
}

impl TodoChanges {
    /// Merge these changes over a stored todo, producing its new field set.
    pub fn apply(self, current: &Todo) -> TodoFields {
        TodoFields {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            completed: self.completed.unwrap_or(current.completed),
        }
    }
}
