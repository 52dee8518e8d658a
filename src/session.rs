//! The session routes: who am I, and log out.
//!
//! `GET /api/auth/session` deliberately answers with `{"user": null}` rather
//! than the usual error envelope so the UI can poll it without treating a
//! logged-out state as a failure.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::DecodingKey;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{invalidate_auth_cookie, session_from_cookies},
    db::lock_connection,
    user::get_user_by_id,
};

/// The state needed for the session endpoints.
#[derive(Clone)]
pub struct SessionEndpointState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key for validating session tokens.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for SessionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            decoding_key: state.decoding_key.clone(),
        }
    }
}

fn no_session() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "user": null }))).into_response()
}

/// A route handler reporting the logged-in user, or `{"user": null}` with
/// 401 when the cookie is missing, invalid or refers to a deleted user.
pub async fn get_session_endpoint(
    State(state): State<SessionEndpointState>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let Ok(session) = session_from_cookies(&jar, &state.decoding_key) else {
        return Ok(no_session());
    };

    let connection = lock_connection(&state.db_connection)?;
    let user = match get_user_by_id(session.user_id, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Ok(no_session()),
        Err(error) => return Err(error),
    };

    Ok(Json(json!({
        "user": {
            "id": user.id.as_i64(),
            "email": user.email,
            "created_at": user.created_at,
        }
    }))
    .into_response())
}

/// A route handler that logs the caller out by clearing the session cookie.
pub async fn log_out_endpoint(jar: CookieJar) -> Response {
    (
        invalidate_auth_cookie(jar),
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}
