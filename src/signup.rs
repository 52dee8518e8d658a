//! The sign-up route: access-phrase gated account creation that logs the new
//! user straight in.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error,
    access_key::verify_access_phrase,
    auth::{encode_token, set_auth_cookie},
    db::lock_connection,
    password::{PasswordHash, ValidatedPassword},
    user::create_user,
};

/// The request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct SignUpData {
    /// The email address to register.
    pub email: String,
    /// The plaintext password to register with.
    pub password: String,
    /// The shared access phrase handed out by the parish office.
    #[serde(rename = "accessKey", default)]
    pub access_key: String,
}

/// The state needed for the sign-up endpoint.
#[derive(Clone)]
pub struct SignUpState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key for signing session tokens.
    pub encoding_key: EncodingKey,
    /// How long an issued session lasts.
    pub token_duration: Duration,
}

impl FromRef<AppState> for SignUpState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            encoding_key: state.encoding_key.clone(),
            token_duration: state.token_duration,
        }
    }
}

/// A route handler for creating a new account.
///
/// Checks the access phrase, validates password strength, creates the user
/// and sets the session cookie so the new user is logged in immediately.
pub async fn sign_up_endpoint(
    State(state): State<SignUpState>,
    jar: CookieJar,
    Json(data): Json<SignUpData>,
) -> Result<Response, Error> {
    if data.email.trim().is_empty() || data.password.is_empty() {
        return Err(Error::Validation(
            "Email and password are required".to_owned(),
        ));
    }

    let validated_password = ValidatedPassword::new(&data.password)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;

        if !verify_access_phrase(&data.access_key, &connection)? {
            return Err(Error::Unauthenticated);
        }

        let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;
        create_user(data.email.trim(), password_hash, &connection)?
    };

    let token = encode_token(user.id, &user.email, state.token_duration, &state.encoding_key)?;
    let jar = set_auth_cookie(jar, token, state.token_duration);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({ "user": { "id": user.id.as_i64(), "email": user.email } })),
    )
        .into_response())
}
