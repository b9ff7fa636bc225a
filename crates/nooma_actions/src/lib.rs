//! Form-driven write actions for Nooma front ends.
//!
//! # Responsibility
//! - Turn raw form submissions into validated core requests.
//! - Report outcomes through a stable [`ActionResponse`] envelope.
//! - Announce affected routes through a [`Revalidator`] after each write.
//!
//! # Invariants
//! - Actions never panic and never return `Err`; failures become envelopes.
//! - Routes are invalidated only after a successful write.

mod actions;
mod form;
mod response;
mod revalidate;

pub use actions::Actions;
pub use form::{FieldError, FormData};
pub use response::ActionResponse;
pub use revalidate::{LogRevalidator, RecordingRevalidator, Revalidator};
