//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own derived computations (finance insights, dashboard snapshot).
//! - Reject blank required text before any write.
//!
//! # Invariants
//! - Services never bypass repository persistence contracts.
//! - Services remain storage-agnostic (generic over repository traits).

use crate::model::RecordId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dashboard_service;
pub mod finance_service;
pub mod note_service;
pub mod task_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for use-case operations.
#[derive(Debug)]
pub enum ServiceError {
    /// A required text field was blank after trimming.
    MissingField(&'static str),
    /// A numeric field is not finite.
    InvalidNumber(&'static str),
    /// A referenced record does not exist.
    UnknownReference { field: &'static str, id: RecordId },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidNumber(field) => write!(f, "`{field}` must be a finite number"),
            Self::UnknownReference { field, id } => {
                write!(f, "`{field}` references missing record `{id}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Trims `value`, rejecting blank input for the named field.
pub(crate) fn require_text(value: &str, field: &'static str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_finite(value: f64, field: &'static str) -> ServiceResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ServiceError::InvalidNumber(field))
    }
}
