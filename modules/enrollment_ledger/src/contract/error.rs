//! Contract error types for the enrollment ledger
//!
//! These errors are transport-agnostic and used for inter-module communication.

/// Ledger domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Referenced entity is absent
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource kind (class, student, enrollment, ...)
        resource: String,
        /// Resource identifier
        id: String,
    },
    /// Uniqueness violation (duplicate enrollment, duplicate attendance day)
    #[error("Conflict: {reason}")]
    Conflict { reason: String },
    /// No seats left in the class
    #[error("Class {class_id} has no seats available")]
    CapacityExceeded { class_id: i32 },
    /// Operation not valid for the entity's current state
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },
    /// Well-formed but semantically invalid input
    #[error("Validation error: {message}")]
    Validation { message: String },
    /// Unexpected store failure
    #[error("Internal error")]
    Internal,
}

impl LedgerError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
