pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod service;

pub use config::Config;
pub use db::{init_db, Database, Session};
pub use domain::{Todo, TodoChanges, TodoFields, TodoId};
pub use error::AppError;
