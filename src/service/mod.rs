//! Data-access operations used by the HTTP handlers.

pub mod todos;

pub use todos::{create_todo, delete_todo, get_todo, get_todos, update_todo};
