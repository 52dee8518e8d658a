//! Helpers shared by the endpoint tests.

use axum_extra::extract::cookie::Cookie;
use rusqlite::Connection;

use crate::{
    AppState,
    auth::{COOKIE_TOKEN, TOKEN_DURATION, encode_token},
    pagination::PaginationConfig,
    user::UserId,
};

pub(crate) const TEST_SECRET: &str = "try-and-guess-me";

/// An [AppState] backed by a fresh in-memory database.
pub(crate) fn test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(connection, TEST_SECRET, PaginationConfig::default())
        .expect("Could not create app state")
}

/// A session cookie accepted by `state`, for exercising protected endpoints.
pub(crate) fn session_cookie(state: &AppState) -> Cookie<'static> {
    let token = encode_token(
        UserId::new(1),
        "treasurer@stjudes.example",
        TOKEN_DURATION,
        &state.encoding_key,
    )
    .expect("Could not sign test session token");

    Cookie::build((COOKIE_TOKEN, token)).build()
}
