//! Row-level operations on the `todos` table.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Todo, TodoFields, TodoId};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("todo {0} not found")]
    NotFound(TodoId),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Todo persistence bound to one session's connection.
pub struct TodoRepo<'s> {
    conn: &'s mut SqliteConnection,
}

impl<'s> TodoRepo<'s> {
    pub fn new(conn: &'s mut SqliteConnection) -> Self {
        TodoRepo { conn }
    }

    /// All todos in insertion (id) order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list(&mut self) -> Result<Vec<Todo>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, completed, created_at, updated_at
            FROM todos
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        rows.iter().map(row_to_todo).collect()
    }

    /// Insert a new todo. The id is assigned by SQLite and never reused.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert(
        &mut self,
        fields: &TodoFields,
        now: DateTime<Utc>,
    ) -> Result<Todo, sqlx::Error> {
        let ts = format_timestamp(now);
        let row = sqlx::query(
            r#"
            INSERT INTO todos (title, description, completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(fields.title())
        .bind(fields.description())
        .bind(fields.completed())
        .bind(ts.as_str())
        .bind(ts.as_str())
        .fetch_one(&mut *self.conn)
        .await?;

        let todo = row_to_todo(&row)?;
        debug!(id = %todo.id, "Inserted todo");
        Ok(todo)
    }

    /// Look up a todo by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_by_id(&mut self, id: TodoId) -> Result<Option<Todo>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, completed, created_at, updated_at
            FROM todos
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *self.conn)
        .await?;

        row.as_ref().map(row_to_todo).transpose()
    }

    /// Replace every mutable field of the todo with `id`.
    ///
    /// `created_at` is left as stored; `updated_at` becomes `now`.
    pub async fn update(
        &mut self,
        id: TodoId,
        fields: &TodoFields,
        now: DateTime<Utc>,
    ) -> Result<Todo, RepoError> {
        let row = sqlx::query(
            r#"
            UPDATE todos
            SET title = ?, description = ?, completed = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(fields.title())
        .bind(fields.description())
        .bind(fields.completed())
        .bind(format_timestamp(now))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.conn)
        .await?;

        match row {
            Some(row) => {
                debug!(id = %id, "Updated todo");
                Ok(row_to_todo(&row)?)
            }
            None => Err(RepoError::NotFound(id)),
        }
    }

    /// Permanently remove the todo with `id`.
    pub async fn delete(&mut self, id: TodoId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id.as_i64())
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(id));
        }
        debug!(id = %id, "Deleted todo");
        Ok(())
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

fn row_to_todo(row: &SqliteRow) -> Result<Todo, sqlx::Error> {
    Ok(Todo {
        id: TodoId::new(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        completed: row.try_get("completed")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}
