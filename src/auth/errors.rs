//! Failures the auth endpoints can answer with.
//!
//! Every variant maps to one status and one fixed message. Diagnostic detail
//! for system failures is logged when the response is built and never sent.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use super::dto::ErrorBody;
use super::repo_types::StoreError;

/// Endpoint an internal failure happened in; picks the 500 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Register,
    Login,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request body is not valid JSON credentials")]
    InvalidBody,
    #[error("email or password missing")]
    MissingFields,
    #[error("email does not look like an address")]
    InvalidEmail,
    #[error("password too short")]
    WeakPassword,
    #[error("DATABASE_URL is not configured")]
    Config,
    #[error("email already registered")]
    DuplicateUser,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("stored password digest is unusable: {0}")]
    AuthSystem(anyhow::Error),
    #[error("store did not confirm an inserted id")]
    InsertFailed,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("{op:?} failed: {cause}")]
    Internal { op: Op, cause: anyhow::Error },
}

impl AuthError {
    pub fn internal(op: Op, cause: impl Into<anyhow::Error>) -> Self {
        AuthError::Internal {
            op,
            cause: cause.into(),
        }
    }

    /// Maps a store failure for `op`: duplicates become conflicts, timeouts
    /// become retryable 503s, the rest are system errors.
    pub fn from_store(op: Op, e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AuthError::DuplicateUser,
            StoreError::Timeout(d) => {
                AuthError::Unavailable(format!("store did not answer within {d:?}"))
            }
            other => AuthError::internal(op, other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidBody
            | AuthError::MissingFields
            | AuthError::InvalidEmail
            | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
            AuthError::DuplicateUser => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Config
            | AuthError::AuthSystem(_)
            | AuthError::InsertFailed
            | AuthError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (message, error) = match self {
            AuthError::InvalidBody => ("Invalid request body", None),
            AuthError::MissingFields => ("Email and password are required", None),
            AuthError::InvalidEmail => ("Invalid email format", None),
            AuthError::WeakPassword => ("Password must be at least 6 characters long", None),
            AuthError::Config => ("Server configuration error", Some("configuration")),
            AuthError::DuplicateUser => ("User with this email already exists", None),
            AuthError::InvalidCredentials => ("Invalid credentials", None),
            AuthError::AuthSystem(_) => ("Authentication error", None),
            AuthError::InsertFailed => (
                "Internal server error during registration",
                Some("Failed to insert new user into database"),
            ),
            AuthError::Unavailable(_) => ("Service temporarily unavailable", None),
            AuthError::Internal { op: Op::Register, .. } => {
                ("Internal server error during registration", Some("internal"))
            }
            AuthError::Internal { op: Op::Login, .. } => {
                ("Internal server error during login", Some("internal"))
            }
        };
        ErrorBody { message, error }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "auth request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_variants_are_bad_request() {
        for e in [
            AuthError::InvalidBody,
            AuthError::MissingFields,
            AuthError::InvalidEmail,
            AuthError::WeakPassword,
        ] {
            assert_eq!(e.status(), StatusCode::BAD_REQUEST);
            assert!(e.body().error.is_none());
        }
    }

    #[test]
    fn store_errors_map_by_kind() {
        assert!(matches!(
            AuthError::from_store(Op::Register, StoreError::Duplicate),
            AuthError::DuplicateUser
        ));
        let timeout = AuthError::from_store(
            Op::Login,
            StoreError::Timeout(std::time::Duration::from_secs(5)),
        );
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);
        let other = AuthError::from_store(Op::Login, StoreError::Query(sqlx::Error::RowNotFound));
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.body().message, "Internal server error during login");
    }

    #[test]
    fn internal_body_hides_source_detail() {
        let e = AuthError::internal(Op::Register, anyhow::anyhow!("password=hunter2 leaked"));
        let json = serde_json::to_string(&e.body()).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("Internal server error during registration"));
    }

    #[test]
    fn auth_system_error_is_distinct_from_invalid_credentials() {
        let sys = AuthError::AuthSystem(anyhow::anyhow!("bad digest"));
        assert_eq!(sys.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_ne!(sys.body().message, AuthError::InvalidCredentials.body().message);
    }
}
