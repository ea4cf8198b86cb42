//! Todo operations over a request session.
//!
//! Each function runs inside the caller's [`Session`]; committing or rolling
//! back is left to the caller.

use chrono::Utc;
use tracing::info;

use crate::db::Session;
use crate::domain::{Todo, TodoChanges, TodoFields, TodoId};
use crate::error::AppError;

pub async fn get_todos(session: &mut Session) -> Result<Vec<Todo>, AppError> {
    Ok(session.todos().list().await?)
}

pub async fn get_todo(session: &mut Session, id: TodoId) -> Result<Todo, AppError> {
    session
        .todos()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::todo_not_found(id))
}

pub async fn create_todo(session: &mut Session, fields: TodoFields) -> Result<Todo, AppError> {
    let todo = session.todos().insert(&fields, Utc::now()).await?;
    info!(id = %todo.id, "Created todo");
    Ok(todo)
}

/// Apply `changes` to an existing todo. Omitted fields keep their values.
pub async fn update_todo(
    session: &mut Session,
    id: TodoId,
    changes: TodoChanges,
) -> Result<Todo, AppError> {
    let current = get_todo(session, id).await?;
    let fields = changes.apply(&current);
    let todo = session.todos().update(id, &fields, Utc::now()).await?;
    info!(id = %id, "Updated todo");
    Ok(todo)
}

/// Delete a todo and return its last stored values.
pub async fn delete_todo(session: &mut Session, id: TodoId) -> Result<Todo, AppError> {
    let current = get_todo(session, id).await?;
    session.todos().delete(id).await?;
    info!(id = %id, "Deleted todo");
    Ok(current)
}
