//! Error types for the session core
//!
//! Each layer has its own taxonomy. Low-level kinds (`TokenError`,
//! `RefreshError`, `StoreError`, `DirectoryError`) never cross the
//! `SessionService` boundary; they are re-expressed as `SessionError`.

use thiserror::Error;
use wl_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};

/// Access credential signing and verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed access credential")]
    Malformed,

    #[error("Access credential signature verification failed")]
    SignatureInvalid,

    #[error("Access credential expired")]
    Expired,

    #[error("Failed to load signing key: {message}")]
    KeyLoad { message: String },

    #[error("Failed to sign access credential")]
    SigningFailed,
}

/// Refresh store backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transient: timeouts, pool exhaustion, lost connections
    #[error("Refresh store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Refresh store backend error: {message}")]
    Backend { message: String },

    /// A persisted row could not be mapped back to a record
    #[error("Corrupt refresh record: {message}")]
    Corrupt { message: String },
}

/// Refresh secret rotation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token expired")]
    Expired,

    /// The secret was already rotated once; its whole family is now revoked.
    #[error("Refresh token already consumed")]
    AlreadyConsumed,

    #[error("Refresh token revoked")]
    Revoked,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// User directory lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("User not found")]
    NotFound,

    #[error("User directory unavailable: {message}")]
    Unavailable { message: String },
}

/// Token pair issuance errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

impl From<StoreError> for IssueError {
    fn from(err: StoreError) -> Self {
        IssueError::Refresh(RefreshError::Store(err))
    }
}

/// Errors surfaced to callers of the session service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Session is no longer valid, please sign in again")]
    SessionInvalid,

    /// A consumed refresh secret was presented again. The session family has
    /// been revoked; callers must force a full sign-in and should notify the
    /// user of suspicious activity.
    #[error("Session compromised, please sign in again")]
    SessionCompromised,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Unknown user")]
    UnknownUser,

    /// Storage or directory failure; safe for the caller to retry with backoff
    #[error("Session service temporarily unavailable")]
    Unavailable,
}

impl SessionError {
    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Unavailable)
    }

    /// Whether the user has to go through the full sign-in flow again
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            SessionError::SessionExpired
                | SessionError::SessionInvalid
                | SessionError::SessionCompromised
                | SessionError::Unauthenticated
        )
    }

    /// Stable error code for the transport layer
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::SessionExpired => error_codes::SESSION_EXPIRED,
            SessionError::SessionInvalid => error_codes::SESSION_INVALID,
            SessionError::SessionCompromised => error_codes::SESSION_COMPROMISED,
            SessionError::Unauthenticated => error_codes::UNAUTHENTICATED,
            SessionError::UnknownUser => error_codes::UNKNOWN_USER,
            SessionError::Unavailable => error_codes::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<RefreshError> for SessionError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Expired => SessionError::SessionExpired,
            RefreshError::NotFound | RefreshError::Revoked => SessionError::SessionInvalid,
            RefreshError::AlreadyConsumed => SessionError::SessionCompromised,
            RefreshError::Store(_) => SessionError::Unavailable,
        }
    }
}

impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed | TokenError::SignatureInvalid | TokenError::Expired => {
                SessionError::Unauthenticated
            }
            TokenError::KeyLoad { .. } | TokenError::SigningFailed => SessionError::Unavailable,
        }
    }
}

impl From<IssueError> for SessionError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Token(e) => e.into(),
            IssueError::Refresh(e) => e.into(),
        }
    }
}

impl From<DirectoryError> for SessionError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound => SessionError::UnknownUser,
            DirectoryError::Unavailable { .. } => SessionError::Unavailable,
        }
    }
}

impl IntoErrorResponse for SessionError {
    fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.code(), self.to_string());
        match self {
            SessionError::SessionCompromised => response.add_detail("security_notice", true),
            SessionError::Unavailable => response.add_detail("retryable", true),
            _ => response,
        }
    }
}
