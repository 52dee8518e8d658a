//! This file defines the `Expenditure` type, its filterable queries and the
//! API routes for expenditures.
//!
//! An expenditure records money the parish has spent. Unlike invoices,
//! expenditures can be edited after the fact, e.g. to attach a receipt image
//! or record when a cheque cleared.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::Session,
    db::{DATE_FORMAT, DatabaseId, lock_connection, parse_date_parameter},
    invoice::{PAYMENT_TYPE_CASH, parse_tag_filter},
    pagination::PaginationConfig,
    tag::TagOption,
};

/// A record of money spent by the parish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expenditure {
    /// The ID of the expenditure.
    pub id: DatabaseId,
    /// What the money was spent on.
    pub title: String,
    /// The amount spent.
    pub amount: f64,
    /// How the amount was paid, e.g. 'cash', 'upi', 'cheque', 'bank'.
    pub payment_type: String,
    /// The payment reference. Absent for cash payments.
    pub payment_reference: Option<String>,
    /// The ID of the expense tag this entry is filed under.
    pub tag: Option<DatabaseId>,
    /// The day of the expenditure ("YYYY-MM-DD").
    pub date: String,
    /// The day the amount actually left the bank. Empty until the debit
    /// clears.
    pub actual_amt_credit_dt: Option<String>,
    /// Path to an attached receipt image, when one was uploaded.
    pub image: Option<String>,
    /// The joined expense tag, when the entry is tagged.
    pub tags: Option<TagOption>,
}

/// The request body for recording an expenditure.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpenditure {
    /// What the money was spent on.
    pub title: String,
    /// The amount spent.
    pub amount: f64,
    /// How the amount was paid.
    pub payment_type: String,
    /// The payment reference. Required unless `payment_type` is `cash`.
    #[serde(default)]
    pub payment_reference: Option<String>,
    /// The ID of the expense tag to file this entry under.
    #[serde(default)]
    pub tag: Option<DatabaseId>,
    /// The day of the expenditure ("YYYY-MM-DD"). Defaults to today.
    #[serde(default)]
    pub date: Option<String>,
    /// The day the amount left the bank, when already known.
    #[serde(default)]
    pub actual_amt_credit_dt: Option<String>,
    /// Path to an attached receipt image.
    #[serde(default)]
    pub image: Option<String>,
}

/// The request body for replacing an existing expenditure.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExpenditure {
    /// The ID of the expenditure to replace.
    pub id: DatabaseId,
    /// The replacement fields.
    #[serde(flatten)]
    pub fields: NewExpenditure,
}

/// Create the expenditure table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_expenditure_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expenditure (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            amount REAL NOT NULL,
            payment_type TEXT NOT NULL,
            payment_reference TEXT,
            tag INTEGER REFERENCES expense_tag(tag_id),
            date TEXT NOT NULL,
            actual_amt_credit_dt TEXT,
            image TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_expenditure_date ON expenditure(date);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Expenditure, rusqlite::Error> {
    let joined_tag_id: Option<DatabaseId> = row.get(9)?;
    let tags = match joined_tag_id {
        Some(tag_id) => Some(TagOption {
            tag_id,
            tag_name: row.get(10)?,
        }),
        None => None,
    };

    Ok(Expenditure {
        id: row.get(0)?,
        title: row.get(1)?,
        amount: row.get(2)?,
        payment_type: row.get(3)?,
        payment_reference: row.get(4)?,
        tag: row.get(5)?,
        date: row.get(6)?,
        actual_amt_credit_dt: row.get(7)?,
        image: row.get(8)?,
        tags,
    })
}

const SELECT_EXPENDITURE: &str = "SELECT e.id, e.title, e.amount, e.payment_type, \
     e.payment_reference, e.tag, e.date, e.actual_amt_credit_dt, e.image, \
     t.tag_id, t.tag_name \
     FROM expenditure e LEFT JOIN expense_tag t ON e.tag = t.tag_id";

/// The typed, validated filter set for listing expenditures.
///
/// All predicates compose conjunctively, so date bounds and the pending
/// filter narrow each other instead of replacing each other.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpenditureQuery {
    /// Tag IDs to match any of.
    pub tags: Vec<DatabaseId>,
    /// Case-insensitive substring match on the payment reference.
    pub payment_reference: Option<String>,
    /// Exact payment type match.
    pub payment_type: Option<String>,
    /// Inclusive lower bound on `actual_amt_credit_dt`.
    pub credited_from: Option<String>,
    /// Inclusive upper bound on `actual_amt_credit_dt`.
    pub credited_to: Option<String>,
    /// Only return rows whose amount has not yet left the bank.
    pub only_pending_credit: bool,
    /// Maximum number of rows to return.
    pub limit: u64,
    /// Number of rows to skip.
    pub offset: u64,
}

/// The raw query string parameters accepted by `GET /api/expenditures`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenditureListParams {
    /// Comma-separated tag IDs, or the `__all__` sentinel for no filter.
    pub tags: Option<String>,
    /// Substring to search payment references for.
    pub payment_ref: Option<String>,
    /// Payment type to filter by, or the `__all__` sentinel for no filter.
    pub payment_type: Option<String>,
    /// Lower bound day for `actual_amt_credit_dt` (inclusive).
    pub start_date: Option<String>,
    /// Upper bound day for `actual_amt_credit_dt` (inclusive).
    pub end_date: Option<String>,
    /// When the string `true`, only rows pending bank debit.
    pub only_pending_credit: Option<String>,
    /// One-based page number.
    pub page: Option<u64>,
    /// Number of rows per page.
    pub page_size: Option<u64>,
}

fn parse_tags_filter(value: Option<&str>) -> Result<Vec<DatabaseId>, Error> {
    match value {
        None | Some("") | Some("__all__") => Ok(Vec::new()),
        Some(raw) => raw
            .split(',')
            .map(|part| parse_tag_filter(Some(part.trim())))
            .filter_map(Result::transpose)
            .collect(),
    }
}

impl ExpenditureQuery {
    /// Validate raw query parameters into an executable query.
    ///
    /// # Errors
    /// Returns an [Error::Validation] for malformed dates or tag IDs.
    pub fn from_params(
        params: &ExpenditureListParams,
        pagination: &PaginationConfig,
    ) -> Result<Self, Error> {
        let credited_from = params
            .start_date
            .as_deref()
            .map(|raw| parse_date_parameter(raw, "startDate").map(|_| raw.to_owned()))
            .transpose()?;
        let credited_to = params
            .end_date
            .as_deref()
            .map(|raw| parse_date_parameter(raw, "endDate").map(|_| raw.to_owned()))
            .transpose()?;

        let (limit, offset) = pagination.to_limit_offset(params.page, params.page_size);

        Ok(Self {
            tags: parse_tags_filter(params.tags.as_deref())?,
            payment_reference: params
                .payment_ref
                .clone()
                .filter(|reference| !reference.is_empty()),
            payment_type: params
                .payment_type
                .clone()
                .filter(|payment_type| !payment_type.is_empty() && payment_type != "__all__"),
            credited_from,
            credited_to,
            only_pending_credit: params.only_pending_credit.as_deref() == Some("true"),
            limit,
            offset,
        })
    }
}

/// Retrieve the expenditures matching `query`, newest first by expenditure
/// day.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn query_expenditures(
    query: &ExpenditureQuery,
    connection: &Connection,
) -> Result<Vec<Expenditure>, Error> {
    let mut sql = SELECT_EXPENDITURE.to_owned();
    let mut where_clause_parts = Vec::new();
    let mut query_parameters: Vec<Value> = Vec::new();

    if !query.tags.is_empty() {
        let placeholders: Vec<String> = query
            .tags
            .iter()
            .map(|&tag| {
                query_parameters.push(Value::Integer(tag));
                format!("?{}", query_parameters.len())
            })
            .collect();
        where_clause_parts.push(format!("e.tag IN ({})", placeholders.join(", ")));
    }

    if let Some(ref payment_reference) = query.payment_reference {
        query_parameters.push(Value::Text(format!("%{payment_reference}%")));
        where_clause_parts.push(format!(
            "e.payment_reference LIKE ?{}",
            query_parameters.len()
        ));
    }

    if let Some(ref payment_type) = query.payment_type {
        query_parameters.push(Value::Text(payment_type.clone()));
        where_clause_parts.push(format!("e.payment_type = ?{}", query_parameters.len()));
    }

    if let Some(ref credited_from) = query.credited_from {
        query_parameters.push(Value::Text(credited_from.clone()));
        where_clause_parts.push(format!(
            "e.actual_amt_credit_dt >= ?{}",
            query_parameters.len()
        ));
    }

    if let Some(ref credited_to) = query.credited_to {
        query_parameters.push(Value::Text(credited_to.clone()));
        where_clause_parts.push(format!(
            "e.actual_amt_credit_dt <= ?{}",
            query_parameters.len()
        ));
    }

    if query.only_pending_credit {
        where_clause_parts.push("e.actual_amt_credit_dt IS NULL".to_owned());
    }

    if !where_clause_parts.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause_parts.join(" AND "));
    }

    sql.push_str(" ORDER BY e.date DESC, e.id DESC");

    query_parameters.push(Value::Integer(query.limit as i64));
    sql.push_str(&format!(" LIMIT ?{}", query_parameters.len()));
    query_parameters.push(Value::Integer(query.offset as i64));
    sql.push_str(&format!(" OFFSET ?{}", query_parameters.len()));

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(query_parameters.iter()), map_row)?
        .map(|maybe_expenditure| maybe_expenditure.map_err(|error| error.into()))
        .collect()
}

/// Insert a new expenditure and return it with its joined tag.
///
/// # Errors
/// Returns [Error::InvalidTag] if the tag ID does not refer to an expense
/// tag, or a [Error::SqlError] if there is some other SQL error.
pub fn create_expenditure(
    new_expenditure: &NewExpenditure,
    date: &str,
    connection: &Connection,
) -> Result<Expenditure, Error> {
    connection.execute(
        "INSERT INTO expenditure (title, amount, payment_type, payment_reference, tag,
            date, actual_amt_credit_dt, image)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            &new_expenditure.title,
            new_expenditure.amount,
            &new_expenditure.payment_type,
            &new_expenditure.payment_reference,
            new_expenditure.tag,
            date,
            &new_expenditure.actual_amt_credit_dt,
            &new_expenditure.image,
        ),
    )?;

    get_expenditure(connection.last_insert_rowid(), connection)
}

/// Retrieve the expenditure with `id`, including its joined tag.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an expenditure, or a
/// [Error::SqlError] if there is some other SQL error.
pub fn get_expenditure(id: DatabaseId, connection: &Connection) -> Result<Expenditure, Error> {
    connection
        .prepare(&format!("{SELECT_EXPENDITURE} WHERE e.id = :id"))?
        .query_row(&[(":id", &id)], map_row)
        .map_err(|error| error.into())
}

/// Replace all editable fields of the expenditure with `update.id`.
///
/// # Errors
/// Returns [Error::NotFound] if the ID does not refer to an expenditure,
/// [Error::InvalidTag] for an unknown tag ID, or a [Error::SqlError] if
/// there is some other SQL error.
pub fn update_expenditure(
    update: &UpdateExpenditure,
    date: &str,
    connection: &Connection,
) -> Result<Expenditure, Error> {
    let rows_affected = connection.execute(
        "UPDATE expenditure SET title = ?1, amount = ?2, payment_type = ?3,
            payment_reference = ?4, tag = ?5, date = ?6, actual_amt_credit_dt = ?7, image = ?8
         WHERE id = ?9",
        (
            &update.fields.title,
            update.fields.amount,
            &update.fields.payment_type,
            &update.fields.payment_reference,
            update.fields.tag,
            date,
            &update.fields.actual_amt_credit_dt,
            &update.fields.image,
            update.id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_expenditure(update.id, connection)
}

/// Delete the expenditure with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an expenditure, or a
/// [Error::SqlError] if there is some other SQL error.
pub fn delete_expenditure(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expenditure WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Validate an expenditure body and resolve its day, defaulting to today.
fn validate_expenditure(new_expenditure: &NewExpenditure) -> Result<String, Error> {
    if new_expenditure.title.trim().is_empty() {
        return Err(Error::Validation("Title is required".to_owned()));
    }

    if new_expenditure.payment_type.trim().is_empty() {
        return Err(Error::Validation("Payment type is required".to_owned()));
    }

    if new_expenditure.payment_type != PAYMENT_TYPE_CASH
        && new_expenditure
            .payment_reference
            .as_deref()
            .unwrap_or_default()
            .trim()
            .is_empty()
    {
        return Err(Error::Validation(
            "Payment reference is required for non-cash payments".to_owned(),
        ));
    }

    if let Some(raw) = &new_expenditure.actual_amt_credit_dt {
        parse_date_parameter(raw, "actual_amt_credit_dt")?;
    }

    match &new_expenditure.date {
        Some(raw) => parse_date_parameter(raw, "date").map(|_| raw.clone()),
        None => Ok(time::OffsetDateTime::now_utc()
            .date()
            .format(DATE_FORMAT)
            .unwrap_or_else(|_| String::from("1970-01-01"))),
    }
}

/// The state needed for the expenditure endpoints.
#[derive(Debug, Clone)]
pub struct ExpenditureEndpointState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls paging.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ExpenditureEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query string parameters for deleting an expenditure.
#[derive(Debug, Deserialize)]
pub struct DeleteExpenditureParams {
    /// The ID of the expenditure to delete.
    pub id: Option<DatabaseId>,
}

/// A route handler for listing expenditures with filters.
pub async fn get_expenditures_endpoint(
    State(state): State<ExpenditureEndpointState>,
    Query(params): Query<ExpenditureListParams>,
) -> Result<Response, Error> {
    let query = ExpenditureQuery::from_params(&params, &state.pagination_config)?;
    let connection = lock_connection(&state.db_connection)?;
    let expenditures = query_expenditures(&query, &connection)?;

    Ok(Json(json!({ "expenditures": expenditures })).into_response())
}

/// A route handler for recording a new expenditure.
pub async fn create_expenditure_endpoint(
    State(state): State<ExpenditureEndpointState>,
    _session: Session,
    Json(new_expenditure): Json<NewExpenditure>,
) -> Result<Response, Error> {
    let date = validate_expenditure(&new_expenditure)?;

    let connection = lock_connection(&state.db_connection)?;
    let expenditure = create_expenditure(&new_expenditure, &date, &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "expenditure": expenditure })),
    )
        .into_response())
}

/// A route handler for replacing an expenditure.
pub async fn update_expenditure_endpoint(
    State(state): State<ExpenditureEndpointState>,
    _session: Session,
    Json(update): Json<UpdateExpenditure>,
) -> Result<Response, Error> {
    let date = validate_expenditure(&update.fields)?;

    let connection = lock_connection(&state.db_connection)?;
    let expenditure = update_expenditure(&update, &date, &connection)?;

    Ok(Json(json!({ "expenditure": expenditure })).into_response())
}

/// A route handler for deleting an expenditure by the `id` query parameter.
pub async fn delete_expenditure_endpoint(
    State(state): State<ExpenditureEndpointState>,
    _session: Session,
    Query(params): Query<DeleteExpenditureParams>,
) -> Result<Response, Error> {
    let Some(id) = params.id else {
        return Err(Error::Validation("ID is required".to_owned()));
    };

    let connection = lock_connection(&state.db_connection)?;
    delete_expenditure(id, &connection)?;

    Ok(Json(json!({ "message": "Expenditure deleted successfully" })).into_response())
}


#[cfg(test)]
mod expenditure_endpoint_tests {
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        build_router, endpoints,
        test_utils::{session_cookie, test_app_state},
    };

    fn get_test_server() -> (TestServer, crate::AppState) {
        let state = test_app_state();
        let server = TestServer::try_new(build_router(state.clone()))
            .expect("Could not create test server.");

        (server, state)
    }

    #[tokio::test]
    async fn create_expenditure_returns_created_row() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::EXPENDITURES_API)
            .add_cookie(session_cookie(&state))
            .json(&json!({
                "title": "Altar candles",
                "amount": 120.0,
                "payment_type": "cash",
                "date": "2024-03-14",
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["expenditure"]["title"], "Altar candles");
        assert_eq!(body["expenditure"]["date"], "2024-03-14");
    }

    #[tokio::test]
    async fn create_expenditure_requires_session() {
        let (server, _state) = get_test_server();

        let response = server
            .post(endpoints::EXPENDITURES_API)
            .json(&json!({
                "title": "Altar candles",
                "amount": 120.0,
                "payment_type": "cash",
            }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn update_expenditure_returns_updated_row() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::EXPENDITURES_API)
            .add_cookie(session_cookie(&state))
            .json(&json!({
                "title": "Altar candles",
                "amount": 120.0,
                "payment_type": "cash",
                "date": "2024-03-14",
            }))
            .await;
        let body: Value = response.json();
        let id = body["expenditure"]["id"].as_i64().unwrap();

        let response = server
            .put(endpoints::EXPENDITURES_API)
            .add_cookie(session_cookie(&state))
            .json(&json!({
                "id": id,
                "title": "Altar candles",
                "amount": 150.0,
                "payment_type": "cash",
                "date": "2024-03-14",
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["expenditure"]["amount"], 150.0);
    }

    #[tokio::test]
    async fn delete_expenditure_requires_id() {
        let (server, state) = get_test_server();

        let response = server
            .delete(endpoints::EXPENDITURES_API)
            .add_cookie(session_cookie(&state))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "ID is required");
    }

    #[tokio::test]
    async fn delete_expenditure_removes_row() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::EXPENDITURES_API)
            .add_cookie(session_cookie(&state))
            .json(&json!({
                "title": "Altar candles",
                "amount": 120.0,
                "payment_type": "cash",
                "date": "2024-03-14",
            }))
            .await;
        let body: Value = response.json();
        let id = body["expenditure"]["id"].as_i64().unwrap();

        server
            .delete(&format!("{}?id={id}", endpoints::EXPENDITURES_API))
            .add_cookie(session_cookie(&state))
            .await
            .assert_status_ok();

        let response = server.get(endpoints::EXPENDITURES_API).await;
        let body: Value = response.json();
        assert!(body["expenditures"].as_array().unwrap().is_empty());
    }
}
