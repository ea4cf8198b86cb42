//! Domain types for the todo API.
//!
//! This module provides:
//! - The `Todo` entity and its identifier
//! - Validated field sets for creation (`TodoFields`) and partial updates (`TodoChanges`)
//! - Explicit body validation returning field-level errors

pub mod todo;
pub mod validation;

pub use todo::{Todo, TodoChanges, TodoFields, TodoId};
pub use validation::{validate_create, validate_update, FieldError, ValidationErrors};
