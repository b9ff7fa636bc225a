//! Text projection and substring search helpers for notes.
//!
//! # Responsibility
//! - Derive the plain-text projection stored in `notes.content_plain`.
//! - Turn user queries into literal `LIKE` patterns.

pub mod plain_text;
pub mod query;
