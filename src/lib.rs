//! Parish Ledger is a small accounting server for a church congregation:
//! invoices (fund receipts), expenditures, members, and tags, with a
//! balance-sheet view derived from the ledger.
//!
//! This library provides a JSON REST API over a SQLite database. The
//! form-driven UI is a static bundle that consumes the API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod access_key;
mod app_state;
mod attribution;
mod auth;
mod db;
mod endpoints;
mod expenditure;
mod invoice;
mod logging;
mod member;
mod pagination;
mod password;
mod routing;
mod session;
mod signup;
mod stats;
mod tag;
#[cfg(test)]
mod test_utils;
mod user;

pub use access_key::add_access_key;
pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserId, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body or query string failed validation at the API boundary.
    ///
    /// The message is safe to show to the client.
    #[error("{0}")]
    Validation(String),

    /// The request requires a valid session and either no session cookie was
    /// present or the token did not verify.
    ///
    /// The caller cannot tell a missing cookie, a bad signature, and an
    /// expired token apart. All three mean "treat as unauthenticated".
    #[error("Unauthorized")]
    Unauthenticated,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The email used at signup already belongs to a registered user.
    #[error("a user with this email already exists")]
    DuplicateEmail,

    /// The tag name used at tag creation already belongs to a tag.
    #[error("a tag with this name already exists")]
    DuplicateTag,

    /// The tag ID used to create a ledger entry did not match a valid tag.
    #[error("the tag ID does not refer to a valid tag")]
    InvalidTag,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session token could not be signed.
    #[error("could not sign the session token")]
    TokenCreation,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            // The client referenced a tag that does not exist.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::InvalidTag
            }
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("tag_name") =>
            {
                Error::DuplicateTag
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Error::Validation(ref message) => (StatusCode::BAD_REQUEST, message.to_owned()),
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "The requested resource could not be found.".to_owned(),
            ),
            Error::DuplicateEmail => (StatusCode::CONFLICT, "User already exists".to_owned()),
            Error::DuplicateTag => (StatusCode::CONFLICT, "Tag already exists".to_owned()),
            Error::InvalidTag => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::TooWeak(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
