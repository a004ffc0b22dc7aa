//! Centralized error types for Taskdeck.

use taskdeck_db::DbError;
use thiserror::Error;

use crate::role::Requirement;

/// Main error type for domain operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("User {user_id} is not a member of board {board_id}")]
    NotAMember { board_id: String, user_id: String },

    #[error("User {user_id} is already a member of board {board_id}")]
    AlreadyMember { board_id: String, user_id: String },

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Board {0} must keep at least one owner")]
    LastOwner(String),

    #[error("Role '{role}' does not grant {requirement}")]
    Forbidden { role: String, requirement: Requirement },

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for domain operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification callers branch on (e.g. to pick an HTTP status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    Invalid,
    Internal,
}

impl CoreError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn forbidden(role: &str, requirement: Requirement) -> Self {
        Self::Forbidden {
            role: role.to_string(),
            requirement,
        }
    }

    pub fn not_a_member(board_id: &str, user_id: &str) -> Self {
        Self::NotAMember {
            board_id: board_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) | Self::BoardNotFound(_) | Self::TaskNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyMember { .. } | Self::EmailTaken(_) | Self::LastOwner(_) => {
                ErrorKind::Conflict
            }
            Self::NotAMember { .. } => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::UnknownRole(_) | Self::ValidationError(_) => ErrorKind::Invalid,
            Self::Database(DbError::Duplicate(_)) => ErrorKind::Conflict,
            Self::Database(DbError::NotFound(_)) => ErrorKind::NotFound,
            Self::Database(_) | Self::Json(_) => ErrorKind::Internal,
        }
    }
}
