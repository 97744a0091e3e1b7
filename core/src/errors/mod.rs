//! Domain-specific error types and error handling.

mod types;

#[cfg(test)]
mod tests;

pub use types::{
    DirectoryError, IssueError, RefreshError, SessionError, StoreError, TokenError,
};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type DomainResult<T> = Result<T, DomainError>;
