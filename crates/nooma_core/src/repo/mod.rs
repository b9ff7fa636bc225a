//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data access contract per domain (finance, tasks, notes).
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Update paths always refresh `updated_at`.
//! - Unknown ids on update/delete are reported as absent results
//!   (`Ok(None)` / `Ok(false)`), never as errors.
//! - Multi-statement deletes run in one `IMMEDIATE` transaction.

mod common;
pub mod finance_repo;
pub mod note_repo;
pub mod task_repo;

pub use common::{RepoError, RepoResult};
