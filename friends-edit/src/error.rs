//! Error types for friends-edit.
//!
//! Synthesis failures are local: the caller withholds the fix and keeps going. Write-back
//! failures distinguish between:
//! - Policy blocks (exit code 2): a document changed on disk since the snapshot was taken
//! - Runtime errors (exit code 1): I/O errors and the like

use thiserror::Error;

/// Why a friend grant could not be synthesized.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The callee has no resolvable declaring type.
    #[error("cannot resolve method `{method}`")]
    Unresolvable { method: String },

    /// The method only exists in metadata (or the host lost its declaration).
    #[error("no source declaration found for `{method}`")]
    NoDeclaration { method: String },

    /// The compilation does not reference the friend attribute type, so it cannot be named.
    #[error("friend attribute type is not available in this compilation")]
    FriendAttributeUnavailable,

    /// The host rejected the edit.
    #[error("host edit failed: {0:#}")]
    Host(#[from] anyhow::Error),
}

/// The top-level error type for write-back.
#[derive(Debug, Error)]
pub enum EditError {
    /// A policy block occurred (exit code 2).
    #[error("policy block: {0}")]
    PolicyBlock(#[from] PolicyBlockError),

    /// A runtime/tool error occurred (exit code 1).
    #[error("runtime error: {0}")]
    Runtime(#[from] anyhow::Error),
}

/// Policy block errors that should result in exit code 2.
#[derive(Debug, Error)]
pub enum PolicyBlockError {
    /// One or more documents no longer match the snapshot they were edited from.
    #[error("precondition mismatch: {message}")]
    PreconditionMismatch {
        /// Which documents failed, and how.
        message: String,
    },
}

impl EditError {
    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            EditError::PolicyBlock(_) => 2,
            EditError::Runtime(_) => 1,
        }
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;
