//! Request body validation.
//!
//! Bodies arrive as untyped JSON and are checked field by field, so a single
//! response can report every problem at once.

use serde::Serialize;
use serde_json::{Map, Value};

use super::todo::{TodoChanges, TodoFields};

/// A problem with one field of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every field-level problem found in a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any error concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        ValidationErrors(vec![error])
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a create body: `{"title": string, "description"?: string|null, "completed"?: bool}`.
///
/// Unknown fields are ignored.
pub fn validate_create(body: &Value) -> Result<TodoFields, ValidationErrors> {
    let obj = as_object(body)?;
    let mut errors = ValidationErrors::default();

    let title = match obj.get("title") {
        None => {
            errors.push(FieldError::new("title", "field required"));
            None
        }
        Some(v) => title_field(v, &mut errors),
    };
    let description = match obj.get("description") {
        None => None,
        Some(v) => description_field(v, &mut errors).flatten(),
    };
    let completed = match obj.get("completed") {
        None => false,
        Some(v) => completed_field(v, &mut errors).unwrap_or(false),
    };

    match title {
        Some(title) => {
            let fields = TodoFields::new(title)?
                .with_description(description)
                .with_completed(completed);
            errors.into_result(fields)
        }
        None => Err(errors),
    }
}

/// Validate an update body. Every field is optional; omitted fields keep
/// their stored values and `"description": null` clears the description.
pub fn validate_update(body: &Value) -> Result<TodoChanges, ValidationErrors> {
    let obj = as_object(body)?;
    let mut errors = ValidationErrors::default();

    let changes = TodoChanges {
        title: obj.get("title").and_then(|v| title_field(v, &mut errors)),
        description: obj
            .get("description")
            .and_then(|v| description_field(v, &mut errors)),
        completed: obj
            .get("completed")
            .and_then(|v| completed_field(v, &mut errors)),
    };

    errors.into_result(changes)
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    body.as_object()
        .ok_or_else(|| FieldError::new("body", "expected a JSON object").into())
}

fn title_field(value: &Value, errors: &mut ValidationErrors) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => {
            errors.push(FieldError::new("title", "must not be empty"));
            None
        }
        Value::String(s) => Some(s.clone()),
        Value::Null => {
            errors.push(FieldError::new("title", "must not be null"));
            None
        }
        _ => {
            errors.push(FieldError::new("title", "expected a string"));
            None
        }
    }
}

// Outer `None` means the value was rejected.
fn description_field(value: &Value, errors: &mut ValidationErrors) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        _ => {
            errors.push(FieldError::new("description", "expected a string or null"));
            None
        }
    }
}

fn completed_field(value: &Value, errors: &mut ValidationErrors) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => {
            errors.push(FieldError::new("completed", "expected a boolean"));
            None
        }
    }
}
