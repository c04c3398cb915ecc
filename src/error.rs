//! Error taxonomy shared by the auth core and the post services

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Main error type for the UniStay core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Bad credentials. The wire message is deliberately identical for
    /// "no such account" and "wrong password"; the real cause is only logged.
    #[error("invalid email or password")]
    AuthFailure,

    /// The account exists but its email was never confirmed. Unlike
    /// `AuthFailure` this is labeled explicitly at the wire, which leaks
    /// account existence for unverified accounts.
    #[error("please verify your email")]
    Unverified,

    /// Missing, malformed, expired, or revoked token.
    #[error("could not refresh access token")]
    Unauthenticated,

    /// Valid identity, insufficient rights (e.g. touching another user's post).
    #[error("forbidden")]
    Forbidden,

    /// Referenced user, post, or session does not exist. Carries the
    /// operation-specific wire message so code mismatches stay generic.
    #[error("{0}")]
    NotFound(&'static str),

    /// Duplicate unique key, in practice an already-registered email.
    #[error("account already exists")]
    Conflict,

    /// Infrastructure failure in the persistent store.
    #[error("storage error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Token signing failure, server-side.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failure, server-side. The underlying cause is
    /// logged where it happens.
    #[error("password hashing error")]
    Hash,
}

/// Result type alias for convenience
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl CoreError {
    fn status(&self) -> StatusCode {
        match self {
            CoreError::AuthFailure => StatusCode::UNAUTHORIZED,
            CoreError::Unverified => StatusCode::UNAUTHORIZED,
            CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CoreError::Forbidden => StatusCode::FORBIDDEN,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict => StatusCode::CONFLICT,
            CoreError::Store(_) | CoreError::Token(_) | CoreError::Hash => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Infrastructure details stay in the logs, not in the response body.
        let message = match &self {
            CoreError::Store(e) => {
                log::error!("store failure: {}", e);
                "internal server error".to_string()
            }
            CoreError::Token(e) => {
                log::error!("token signing failure: {}", e);
                "internal server error".to_string()
            }
            CoreError::Hash => "internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
