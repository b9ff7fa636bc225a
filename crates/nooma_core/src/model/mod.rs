//! Domain model for the finance, tasks and notes families.
//!
//! # Responsibility
//! - Define row structs returned by repositories.
//! - Define write requests (`New*`) and partial updates (`*Patch`).
//! - Own the closed enum sets persisted as text columns.
//!
//! # Invariants
//! - Every enum maps to exactly one lowercase snake_case text value.
//! - Ids are opaque strings generated at insert time.
//! - Timestamps are ISO-8601 UTC strings assigned by the store.

pub mod finance;
pub mod notes;
pub mod tasks;

/// Opaque row identifier (UUID v4 text for rows created by this crate).
pub type RecordId = String;
