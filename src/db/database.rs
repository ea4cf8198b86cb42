//! Process-wide database handle.

use sqlx::sqlite::SqlitePool;
use tracing::info;

use super::session::{Session, SessionMode};

/// Shared handle to the connection pool.
///
/// Created once at startup and passed to the router; every request takes
/// its own [`Session`] from it.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Database { pool }
    }

    /// Open a read session (a pooled connection inside a deferred transaction).
    pub async fn session(&self) -> Result<Session, sqlx::Error> {
        self.begin(SessionMode::Read).await
    }

    /// Open a session that holds the write lock from its first statement.
    ///
    /// Use for anything that may write, so a read followed by a write never
    /// has to upgrade a stale snapshot.
    pub async fn write_session(&self) -> Result<Session, sqlx::Error> {
        self.begin(SessionMode::Write).await
    }

    async fn begin(&self, mode: SessionMode) -> Result<Session, sqlx::Error> {
        let conn = self.pool.acquire().await?;
        Session::begin(conn, mode).await
    }

    /// Check that a connection can be acquired and used.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Wait for checked-out connections to return, then close the pool.
    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
