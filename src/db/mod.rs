//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization, pragma configuration and schema setup
//! - The process-wide `Database` handle and request-scoped `Session`s
//! - Todo row operations (`TodoRepo`)

pub mod database;
pub mod migrations;
pub mod session;
pub mod todos;

pub use database::Database;
pub use migrations::init_db;
pub use session::{Session, SessionMode};
pub use todos::{RepoError, TodoRepo};
