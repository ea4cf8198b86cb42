use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::AppState;
use crate::domain::{
    validate_create, validate_update, FieldError, Todo, TodoId, ValidationErrors,
};
use crate::error::AppError;
use crate::service;

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let mut session = state.db.session().await?;
    let result = service::get_todos(&mut session).await;
    let todos = session.finish(result).await?;
    Ok(Json(todos))
}

pub async fn get_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Todo>, AppError> {
    let id = todo_id(id)?;

    let mut session = state.db.session().await?;
    let result = service::get_todo(&mut session, id).await;
    let todo = session.finish(result).await?;
    Ok(Json(todo))
}

pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let fields = validate_create(&json_body(body)?)?;

    let mut session = state.db.write_session().await?;
    let result = service::create_todo(&mut session, fields).await;
    let todo = session.finish(result).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let id = todo_id(id)?;
    let changes = validate_update(&json_body(body)?)?;

    let mut session = state.db.write_session().await?;
    let result = service::update_todo(&mut session, id, changes).await;
    let todo = session.finish(result).await?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Todo>, AppError> {
    let id = todo_id(id)?;

    let mut session = state.db.write_session().await?;
    let result = service::delete_todo(&mut session, id).await;
    let todo = session.finish(result).await?;
    Ok(Json(todo))
}

fn todo_id(path: Result<Path<i64>, PathRejection>) -> Result<TodoId, AppError> {
    path.map(|Path(id)| TodoId::new(id)).map_err(|_| {
        ValidationErrors::from(FieldError::new("id", "expected an integer")).into()
    })
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ValidationErrors::from(FieldError::new("body", rejection.body_text())).into()
    })
}
