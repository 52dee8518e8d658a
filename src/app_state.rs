//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;
use time::Duration;

use crate::{Error, auth::TOKEN_DURATION, db::initialize, pagination::PaginationConfig};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The key used to sign session tokens.
    pub encoding_key: EncodingKey,

    /// The key used to verify session token signatures.
    pub decoding_key: DecodingKey,

    /// The duration for which session tokens are valid.
    pub token_duration: Duration,

    /// The config that controls how to page through ledger data.
    pub pagination_config: PaginationConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the ledger tables. `secret` is the key material for signing session
    /// tokens and must stay stable across restarts, otherwise every session
    /// is invalidated.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        secret: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_duration: TOKEN_DURATION,
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
