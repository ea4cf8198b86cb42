//! Request-scoped database sessions.

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnection};
use tracing::{debug, warn};

use super::todos::TodoRepo;

/// How a session opens its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Deferred `BEGIN`: no lock until the first statement.
    Read,
    /// `BEGIN IMMEDIATE`: takes the write lock up front, waiting up to
    /// `busy_timeout`. A deferred transaction that reads before writing can
    /// fail with SQLITE_BUSY_SNAPSHOT once another writer commits.
    Write,
}

impl SessionMode {
    fn begin_sql(self) -> &'static str {
        match self {
            SessionMode::Read => "BEGIN",
            SessionMode::Write => "BEGIN IMMEDIATE",
        }
    }
}

/// One database transaction owned by a single request.
///
/// Finish it with [`Session::finish`], [`Session::commit`] or
/// [`Session::rollback`]. A session dropped without finishing, or whose
/// COMMIT/ROLLBACK fails, detaches its connection from the pool and closes
/// it, which rolls back anything still open.
pub struct Session {
    // Taken only once the transaction has ended.
    conn: Option<PoolConnection<Sqlite>>,
}

impl Session {
    pub(crate) async fn begin(
        conn: PoolConnection<Sqlite>,
        mode: SessionMode,
    ) -> Result<Self, sqlx::Error> {
        // Wrapped before BEGIN runs so a cancelled or failed BEGIN still
        // discards the connection instead of pooling an open transaction.
        let mut session = Session { conn: Some(conn) };
        sqlx::query(mode.begin_sql())
            .execute(session.conn())
            .await?;
        Ok(session)
    }

    /// Todo row operations inside this session.
    pub fn todos(&mut self) -> TodoRepo<'_> {
        TodoRepo::new(self.conn())
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        self.conn
            .as_deref_mut()
            .expect("session connection is held until the transaction ends")
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.end("COMMIT").await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.end("ROLLBACK").await
    }

    async fn end(mut self, sql: &'static str) -> Result<(), sqlx::Error> {
        sqlx::query(sql).execute(self.conn()).await?;
        // Transaction closed cleanly; the connection can go back to the pool.
        self.conn.take();
        Ok(())
    }

    /// Commit if `result` is `Ok`, roll back otherwise, and hand `result` back.
    ///
    /// A failed commit replaces the success value with the commit error. A
    /// failed rollback is logged and the original error is kept.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<sqlx::Error>,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rb) = self.rollback().await {
                    warn!(error = %rb, "Rollback failed, connection discarded");
                }
                Err(err)
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("Session ended without commit or rollback, discarding connection");
            drop(conn.detach());
        }
    }
}
