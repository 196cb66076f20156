//! # DomainError
//!
//! Centralized error handling for the forum. Every failed method call ends up
//! as exactly one of these variants; transports map them to their own codes.

use crate::models::{ReplyId, ThreadId};
use crate::validation::ValidationErrors;
use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or out-of-range input, rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Caller is logged out or banned.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is known but lacks the role or ownership required.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The target entity does not exist.
    #[error("{kind} not found with ID {id}")]
    NotFound { kind: &'static str, id: String },

    /// The parent thread referenced by a reply does not exist.
    #[error("thread not found with ID {0}")]
    ThreadNotFound(ThreadId),

    /// The thread (or the parent thread of a reply) is locked.
    #[error("thread {0} is locked and cannot be updated")]
    Locked(ThreadId),

    /// An admin-supplied username did not resolve to a user.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Infrastructure failure (e.g., DB down, pool exhausted)
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn thread_not_found(id: ThreadId) -> Self {
        DomainError::NotFound {
            kind: "thread",
            id: id.to_string(),
        }
    }

    pub fn reply_not_found(id: ReplyId) -> Self {
        DomainError::NotFound {
            kind: "reply",
            id: id.to_string(),
        }
    }

    /// Stable name of the failure kind, used for logs, metrics and RPC error data.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "ValidationError",
            DomainError::Unauthorized(_) => "Unauthorized",
            DomainError::Forbidden(_) => "Forbidden",
            DomainError::NotFound { .. } => "NotFound",
            DomainError::ThreadNotFound(_) => "ThreadNotFound",
            DomainError::Locked(_) => "Locked",
            DomainError::UserNotFound(_) => "UserNotFound",
            DomainError::Storage(_) => "Internal",
        }
    }
}

/// A specialized Result type for forum logic.
pub type Result<T> = std::result::Result<T, DomainError>;
