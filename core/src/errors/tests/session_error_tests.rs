//! Unit tests for the session error taxonomy

use wl_shared::errors::IntoErrorResponse;

use crate::errors::{
    DirectoryError, DomainError, IssueError, RefreshError, SessionError, StoreError, TokenError,
};

fn unavailable() -> StoreError {
    StoreError::Unavailable {
        message: "pool timed out".to_string(),
    }
}

#[test]
fn test_refresh_errors_map_to_session_kinds() {
    assert_eq!(SessionError::from(RefreshError::Expired), SessionError::SessionExpired);
    assert_eq!(SessionError::from(RefreshError::NotFound), SessionError::SessionInvalid);
    assert_eq!(SessionError::from(RefreshError::Revoked), SessionError::SessionInvalid);
    assert_eq!(
        SessionError::from(RefreshError::AlreadyConsumed),
        SessionError::SessionCompromised
    );
    assert_eq!(
        SessionError::from(RefreshError::Store(unavailable())),
        SessionError::Unavailable
    );
}

#[test]
fn test_verification_failures_collapse_to_unauthenticated() {
    for err in [TokenError::Malformed, TokenError::SignatureInvalid, TokenError::Expired] {
        assert_eq!(SessionError::from(err), SessionError::Unauthenticated);
    }
    assert_eq!(
        SessionError::from(TokenError::SigningFailed),
        SessionError::Unavailable
    );
}

#[test]
fn test_issue_error_unwraps_inner_kind() {
    let err: IssueError = unavailable().into();
    assert_eq!(err, IssueError::Refresh(RefreshError::Store(unavailable())));
    assert_eq!(SessionError::from(err), SessionError::Unavailable);

    let err = IssueError::from(RefreshError::AlreadyConsumed);
    assert_eq!(SessionError::from(err), SessionError::SessionCompromised);
}

#[test]
fn test_directory_errors() {
    assert_eq!(SessionError::from(DirectoryError::NotFound), SessionError::UnknownUser);
    let err = DirectoryError::Unavailable {
        message: "timeout".to_string(),
    };
    assert_eq!(SessionError::from(err), SessionError::Unavailable);
}

#[test]
fn test_retry_and_reauthentication_flags() {
    assert!(SessionError::Unavailable.is_retryable());
    assert!(!SessionError::SessionCompromised.is_retryable());
    assert!(SessionError::SessionCompromised.requires_reauthentication());
    assert!(!SessionError::Unavailable.requires_reauthentication());
    assert!(!SessionError::UnknownUser.requires_reauthentication());
}

#[test]
fn test_compromised_response_carries_security_notice() {
    let response = SessionError::SessionCompromised.to_error_response();
    assert_eq!(response.error, "SESSION_COMPROMISED");
    let details = response.details.expect("details present");
    assert_eq!(details["security_notice"], serde_json::json!(true));

    let response = SessionError::SessionExpired.to_error_response();
    assert_eq!(response.error, "SESSION_EXPIRED");
    assert!(response.details.is_none());
}

#[test]
fn test_domain_error_is_transparent() {
    let err: DomainError = RefreshError::Revoked.into();
    assert_eq!(err.to_string(), "Refresh token revoked");
}
