//! The access key store and the access phrase check.
//!
//! Sign-up is gated by a shared access phrase handed out by the parish
//! office. Only bcrypt hashes of accepted phrases are stored; verifying a
//! candidate phrase means scanning the stored hashes for a match.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, Error, db::lock_connection, password::PasswordHash};

/// Create the access key table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_access_key_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS access_key (hash TEXT PRIMARY KEY)",
        (),
    )?;

    Ok(())
}

/// Store the hash of an accepted access phrase.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn add_access_key(hash: &PasswordHash, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT OR IGNORE INTO access_key (hash) VALUES (?1)",
        [hash.as_ref()],
    )?;

    Ok(())
}

/// Check whether `phrase` matches any stored access key.
///
/// A hash that cannot be verified (e.g. a corrupted row) counts as a
/// non-match rather than an error.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn verify_access_phrase(phrase: &str, connection: &Connection) -> Result<bool, Error> {
    let hashes = connection
        .prepare("SELECT hash FROM access_key")?
        .query_map((), |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for hash in hashes {
        if PasswordHash::new_unchecked(&hash)
            .verify(phrase)
            .unwrap_or(false)
        {
            return Ok(true);
        }
    }

    Ok(false)
}

/// The request body for checking an access phrase.
#[derive(Debug, Deserialize)]
pub struct VerifyData {
    /// The candidate access phrase.
    pub password: String,
}

/// The state needed for the verify endpoint.
#[derive(Debug, Clone)]
pub struct VerifyEndpointState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for VerifyEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler telling the sign-up page whether an access phrase is
/// accepted, without creating anything.
pub async fn verify_endpoint(
    State(state): State<VerifyEndpointState>,
    Json(data): Json<VerifyData>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let matches = verify_access_phrase(&data.password, &connection)?;

    Ok(Json(json!({ "error": null, "message": matches })).into_response())
}
