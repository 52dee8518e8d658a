//! Month-by-month attribution of a member's contributions.
//!
//! Subscription-style contributions carry an effective range: a single
//! invoice paid in March may cover January through March. This module
//! expands each invoice into one row per month it covers, so a member's
//! giving history reads month by month rather than payment by payment.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    db::{DatabaseId, lock_connection},
};

/// One invoice attributed to one month it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// The ID of the underlying invoice.
    pub invoice_id: DatabaseId,
    /// The contributing member's phone number.
    pub phone: String,
    /// What the contribution was for.
    pub title: String,
    /// The full invoice amount, repeated for each covered month.
    pub amount: f64,
    /// The covered month in "YYYY-MM" form.
    pub month: String,
}

/// Expand a member's invoices into one row per covered month.
///
/// Invoices without an effective range are attributed to the month they
/// were recorded in.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_attributions(phone: &str, connection: &Connection) -> Result<Vec<Attribution>, Error> {
    connection
        .prepare(
            "WITH RECURSIVE months(invoice_id, phone, title, amount, month, last_month) AS (
                SELECT id, phone, title, amount,
                    strftime('%Y-%m', COALESCE(effective_from, created_at)),
                    strftime('%Y-%m', COALESCE(effective_to, effective_from, created_at))
                FROM invoice
                WHERE phone = :phone
                UNION ALL
                SELECT invoice_id, phone, title, amount,
                    strftime('%Y-%m', date(month || '-01', '+1 month')),
                    last_month
                FROM months
                WHERE month < last_month
            )
            SELECT invoice_id, phone, title, amount, month
            FROM months
            ORDER BY invoice_id ASC, month ASC",
        )?
        .query_map(&[(":phone", &phone)], |row| {
            Ok(Attribution {
                invoice_id: row.get(0)?,
                phone: row.get(1)?,
                title: row.get(2)?,
                amount: row.get(3)?,
                month: row.get(4)?,
            })
        })?
        .map(|maybe_attribution| maybe_attribution.map_err(|error| error.into()))
        .collect()
}

/// The query string parameters for listing attributions.
#[derive(Debug, Deserialize)]
pub struct AttributionParams {
    /// The member's phone number.
    pub phone: Option<String>,
}

/// The state needed for the attribution endpoint.
#[derive(Debug, Clone)]
pub struct AttributionEndpointState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AttributionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler listing a member's month-by-month attributions.
pub async fn get_attributions_endpoint(
    State(state): State<AttributionEndpointState>,
    Query(params): Query<AttributionParams>,
) -> Result<Response, Error> {
    let Some(phone) = params.phone.as_deref().filter(|phone| !phone.is_empty()) else {
        return Err(Error::Validation("Phone parameter is required".to_owned()));
    };

    let connection = lock_connection(&state.db_connection)?;
    let attributions = get_attributions(phone, &connection)?;

    Ok(Json(json!({ "attributions": attributions })).into_response())
}
