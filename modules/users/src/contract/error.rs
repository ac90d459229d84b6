use thiserror::Error;
use uuid::Uuid;

/// Which constraint a field broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    TooShort,
    InvalidFormat,
    OutOfRange,
}

/// One rejected field with its human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: ViolationKind,
    pub message: &'static str,
}

impl FieldViolation {
    pub(crate) const fn new(
        field: &'static str,
        kind: ViolationKind,
        message: &'static str,
    ) -> Self {
        Self {
            field,
            kind,
            message,
        }
    }
}

/// `field: message` pairs joined with `, `.
pub fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsersError {
    #[error("User not found: {id}")]
    NotFound { id: Uuid },

    #[error("User with email '{email}' already exists")]
    Conflict { email: String },

    #[error("Validation error: {}", summarize(.violations))]
    Validation { violations: Vec<FieldViolation> },

    #[error("Internal error")]
    Internal,
}

impl UsersError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn conflict(email: String) -> Self {
        Self::Conflict { email }
    }

    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for UsersError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            UserNotFound { id } => Self::not_found(id),
            EmailAlreadyExists { email } => Self::conflict(email),
            Validation { violations } => Self::validation(violations),
            Database { .. } => Self::internal(),
        }
    }
}
