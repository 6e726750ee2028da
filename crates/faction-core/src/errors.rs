//! Unified error taxonomy for faction governance
//!
//! Every core operation returns a result value; nothing escapes as a
//! panic under normal misuse. The excluded presentation layer turns a
//! failure into a localized, user-visible message — the kinds here are
//! the contract it renders from.

use serde::{Deserialize, Serialize};

/// Result alias used across all faction crates.
pub type Result<T> = std::result::Result<T, FactionError>;

/// Unified error type for all faction governance operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FactionError {
    /// Bad input: over-length name, duplicate name, malformed identifier
    #[error("validation failed: {message}")]
    Validation {
        /// What was invalid about the input
        message: String,
    },

    /// The authorization engine said no, or a permission is missing
    #[error("not authorized: {message}")]
    Authorization {
        /// What the actor was not allowed to do
        message: String,
    },

    /// Unknown faction, grade, actor, or cell
    #[error("not found: {message}")]
    NotFound {
        /// What could not be resolved
        message: String,
    },

    /// Operation conflicts with current state (cell taken, already in a
    /// faction, sole-owner leaving, recruitment closed)
    #[error("state conflict: {message}")]
    StateConflict {
        /// The conflicting state
        message: String,
    },

    /// Persistence codec or store failure
    #[error("storage error: {message}")]
    Storage {
        /// What went wrong while encoding, decoding, or writing
        message: String,
    },
}

impl FactionError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a state conflict error
    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::StateConflict {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
