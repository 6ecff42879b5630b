use thiserror::Error;

use crate::models::EntityKind;

/// Errors produced by the project model.
///
/// Every variant describes a condition the caller can correct. Operations
/// that return one of these leave the model untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid date: day {day}, month {month}, year {year}")]
    InvalidDate { day: u32, month: u32, year: i32 },

    #[error("{kind} already exists: {key}")]
    DuplicateEntity { kind: EntityKind, key: String },

    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },

    #[error("index {index} is out of range for {len} {kind}(s)")]
    IndexOutOfRange {
        kind: EntityKind,
        index: usize,
        len: usize,
    },

    #[error("cannot remove {kind} {id}: {reason}")]
    DependencyViolation {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    #[error("{left} and {right} belong to different projects")]
    CrossProjectViolation { left: String, right: String },
}

impl ModelError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub(crate) fn duplicate(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::DuplicateEntity {
            kind,
            key: key.into(),
        }
    }

    pub(crate) fn dependency(kind: EntityKind, id: &str, reason: impl Into<String>) -> Self {
        Self::DependencyViolation {
            kind,
            id: id.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
