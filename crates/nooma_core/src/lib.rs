//! Core domain logic for Nooma: personal finance, tasks and notes over one
//! SQLite database.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::RecordId;
pub use repo::finance_repo::{FinanceRepository, SqliteFinanceRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use search::plain_text::strip_markup;
pub use service::dashboard_service::{DashboardService, DashboardSnapshot};
pub use service::finance_service::FinanceService;
pub use service::note_service::NoteService;
pub use service::task_service::TaskService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
