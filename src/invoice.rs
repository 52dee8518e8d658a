//! This file defines the `Invoice` type, the filterable invoice queries and
//! the API routes for invoices.
//!
//! An invoice records money received by the parish: who gave it, what for,
//! how it was paid, and when the amount actually reached the bank.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::Session,
    db::{DatabaseId, end_of_day, lock_connection, now_timestamp, parse_date_parameter,
        start_of_day},
    pagination::PaginationConfig,
    tag::TagOption,
};

/// Payment types that settle straight into the cash box rather than a bank
/// account.
pub const PAYMENT_TYPE_CASH: &str = "cash";

/// A record of money received by the parish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// The ID of the invoice.
    pub id: DatabaseId,
    /// The contributing member's phone number, when known.
    pub phone: Option<String>,
    /// The contributor's name.
    pub name: String,
    /// What the contribution was for.
    pub title: String,
    /// The amount received.
    pub amount: f64,
    /// The ID of the invoice tag this entry is filed under.
    pub tag: Option<DatabaseId>,
    /// How the amount was paid, e.g. 'cash', 'upi', 'cheque', 'bank'.
    pub payment_type: String,
    /// The payment reference, e.g. a cheque or UPI transaction number.
    /// Absent for cash payments.
    pub payment_reference: Option<String>,
    /// When the invoice was recorded, as a stored timestamp.
    pub created_at: String,
    /// The day the amount was actually credited to the bank. Empty until the
    /// credit clears, e.g. for pending cheques.
    pub actual_amt_credit_dt: Option<String>,
    /// First month this contribution should be attributed to ("YYYY-MM-DD").
    pub effective_from: Option<String>,
    /// Last month this contribution should be attributed to ("YYYY-MM-DD").
    pub effective_to: Option<String>,
    /// The joined invoice tag, when the entry is tagged.
    pub tags: Option<TagOption>,
}

/// The request body for recording an invoice.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    /// The contributing member's phone number, when known.
    #[serde(default)]
    pub phone: Option<String>,
    /// The contributor's name.
    pub name: String,
    /// What the contribution was for.
    pub title: String,
    /// The amount received.
    pub amount: f64,
    /// The ID of the invoice tag to file this entry under.
    #[serde(default)]
    pub tag: Option<DatabaseId>,
    /// How the amount was paid.
    pub payment_type: String,
    /// The payment reference. Required unless `payment_type` is `cash`.
    #[serde(default)]
    pub payment_reference: Option<String>,
    /// The day the amount was credited to the bank, when already known.
    #[serde(default)]
    pub actual_amt_credit_dt: Option<String>,
    /// First month this contribution should be attributed to.
    #[serde(default)]
    pub effective_from: Option<String>,
    /// Last month this contribution should be attributed to.
    #[serde(default)]
    pub effective_to: Option<String>,
}

/// Create the invoice table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_invoice_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS invoice (
            id INTEGER PRIMARY KEY,
            phone TEXT,
            name TEXT NOT NULL,
            title TEXT NOT NULL,
            amount REAL NOT NULL,
            tag INTEGER REFERENCES invoice_tag(tag_id),
            payment_type TEXT NOT NULL,
            payment_reference TEXT,
            created_at TEXT NOT NULL,
            actual_amt_credit_dt TEXT,
            effective_from TEXT,
            effective_to TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_invoice_created_at ON invoice(created_at);
        CREATE INDEX IF NOT EXISTS idx_invoice_phone ON invoice(phone);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Invoice, rusqlite::Error> {
    let joined_tag_id: Option<DatabaseId> = row.get(12)?;
    let tags = match joined_tag_id {
        Some(tag_id) => Some(TagOption {
            tag_id,
            tag_name: row.get(13)?,
        }),
        None => None,
    };

    Ok(Invoice {
        id: row.get(0)?,
        phone: row.get(1)?,
        name: row.get(2)?,
        title: row.get(3)?,
        amount: row.get(4)?,
        tag: row.get(5)?,
        payment_type: row.get(6)?,
        payment_reference: row.get(7)?,
        created_at: row.get(8)?,
        actual_amt_credit_dt: row.get(9)?,
        effective_from: row.get(10)?,
        effective_to: row.get(11)?,
        tags,
    })
}

const SELECT_INVOICE: &str = "SELECT i.id, i.phone, i.name, i.title, i.amount, i.tag, \
     i.payment_type, i.payment_reference, i.created_at, i.actual_amt_credit_dt, \
     i.effective_from, i.effective_to, t.tag_id, t.tag_name \
     FROM invoice i LEFT JOIN invoice_tag t ON i.tag = t.tag_id";

/// The typed, validated filter set for listing invoices.
///
/// Build one from raw query parameters with [InvoiceQuery::from_params]. All
/// predicates compose conjunctively.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InvoiceQuery {
    /// Exact phone number match.
    pub phone: Option<String>,
    /// Exact tag ID match.
    pub tag: Option<DatabaseId>,
    /// Case-insensitive substring match on the payment reference.
    pub payment_reference: Option<String>,
    /// Exact payment type match.
    pub payment_type: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<String>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<String>,
    /// Inclusive lower bound on `actual_amt_credit_dt`.
    pub credited_from: Option<String>,
    /// Inclusive upper bound on `actual_amt_credit_dt`.
    pub credited_to: Option<String>,
    /// Only return rows whose amount has not yet been credited.
    pub only_pending_credit: bool,
    /// Maximum number of rows to return.
    pub limit: u64,
    /// Number of rows to skip.
    pub offset: u64,
}

/// The raw query string parameters accepted by `GET /api/invoices`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListParams {
    /// Exact phone number match.
    pub phone: Option<String>,
    /// Tag ID to filter by, or the `__all__` sentinel for no filter.
    pub tag_id: Option<String>,
    /// Substring to search payment references for.
    pub payment_ref: Option<String>,
    /// Payment type to filter by, or the `__all__` sentinel for no filter.
    pub payment_type: Option<String>,
    /// Lower bound day for `created_at` (inclusive, start of day).
    pub from_date: Option<String>,
    /// Upper bound day for `created_at` (inclusive, end of day).
    pub max_date: Option<String>,
    /// Lower bound day for `actual_amt_credit_dt` (inclusive).
    pub start_date: Option<String>,
    /// Upper bound day for `actual_amt_credit_dt` (inclusive).
    pub end_date: Option<String>,
    /// When the string `true`, only rows pending bank credit.
    pub only_pending_credit: Option<String>,
    /// One-based page number.
    pub page: Option<u64>,
    /// Number of rows per page.
    pub page_size: Option<u64>,
}

/// Turn a `tagId` parameter into an optional tag filter.
///
/// Blank values and the `__all__` sentinel mean "no filter".
///
/// # Errors
/// Returns an [Error::Validation] if the value is not an integer ID.
pub(crate) fn parse_tag_filter(value: Option<&str>) -> Result<Option<DatabaseId>, Error> {
    match value {
        None | Some("") | Some("__all__") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Validation(format!("Invalid tag ID: '{raw}'"))),
    }
}

impl InvoiceQuery {
    /// Validate raw query parameters into an executable query.
    ///
    /// # Errors
    /// Returns an [Error::Validation] for malformed dates or tag IDs.
    pub fn from_params(
        params: &InvoiceListParams,
        pagination: &PaginationConfig,
    ) -> Result<Self, Error> {
        let created_from = params
            .from_date
            .as_deref()
            .map(|raw| parse_date_parameter(raw, "fromDate").map(start_of_day))
            .transpose()?;
        let created_to = params
            .max_date
            .as_deref()
            .map(|raw| parse_date_parameter(raw, "maxDate").map(end_of_day))
            .transpose()?;
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
            phone: params.phone.clone().filter(|phone| !phone.trim().is_empty()),
            tag: parse_tag_filter(params.tag_id.as_deref())?,
            payment_reference: params
                .payment_ref
                .clone()
                .filter(|reference| !reference.is_empty()),
            payment_type: params
                .payment_type
                .clone()
                .filter(|payment_type| !payment_type.is_empty() && payment_type != "__all__"),
            created_from,
            created_to,
            credited_from,
            credited_to,
            only_pending_credit: params.only_pending_credit.as_deref() == Some("true"),
            limit,
            offset,
        })
    }
}

/// Retrieve the invoices matching `query`, newest first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn query_invoices(query: &InvoiceQuery, connection: &Connection) -> Result<Vec<Invoice>, Error> {
    let mut sql = SELECT_INVOICE.to_owned();
    let mut where_clause_parts = Vec::new();
    let mut query_parameters: Vec<Value> = Vec::new();

    if let Some(ref phone) = query.phone {
        query_parameters.push(Value::Text(phone.clone()));
        where_clause_parts.push(format!("i.phone = ?{}", query_parameters.len()));
    }

    if let Some(tag) = query.tag {
        query_parameters.push(Value::Integer(tag));
        where_clause_parts.push(format!("i.tag = ?{}", query_parameters.len()));
    }

    if let Some(ref payment_reference) = query.payment_reference {
        query_parameters.push(Value::Text(format!("%{payment_reference}%")));
        where_clause_parts.push(format!(
            "i.payment_reference LIKE ?{}",
            query_parameters.len()
        ));
    }

    if let Some(ref payment_type) = query.payment_type {
        query_parameters.push(Value::Text(payment_type.clone()));
        where_clause_parts.push(format!("i.payment_type = ?{}", query_parameters.len()));
    }

    if let Some(ref created_from) = query.created_from {
        query_parameters.push(Value::Text(created_from.clone()));
        where_clause_parts.push(format!("i.created_at >= ?{}", query_parameters.len()));
    }

    if let Some(ref created_to) = query.created_to {
        query_parameters.push(Value::Text(created_to.clone()));
        where_clause_parts.push(format!("i.created_at <= ?{}", query_parameters.len()));
    }

    if let Some(ref credited_from) = query.credited_from {
        query_parameters.push(Value::Text(credited_from.clone()));
        where_clause_parts.push(format!(
            "i.actual_amt_credit_dt >= ?{}",
            query_parameters.len()
        ));
    }

    if let Some(ref credited_to) = query.credited_to {
        query_parameters.push(Value::Text(credited_to.clone()));
        where_clause_parts.push(format!(
            "i.actual_amt_credit_dt <= ?{}",
            query_parameters.len()
        ));
    }

    if query.only_pending_credit {
        where_clause_parts.push("i.actual_amt_credit_dt IS NULL".to_owned());
    }

    if !where_clause_parts.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause_parts.join(" AND "));
    }

    sql.push_str(" ORDER BY i.created_at DESC, i.id DESC");

    query_parameters.push(Value::Integer(query.limit as i64));
    sql.push_str(&format!(" LIMIT ?{}", query_parameters.len()));
    query_parameters.push(Value::Integer(query.offset as i64));
    sql.push_str(&format!(" OFFSET ?{}", query_parameters.len()));

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(query_parameters.iter()), map_row)?
        .map(|maybe_invoice| maybe_invoice.map_err(|error| error.into()))
        .collect()
}

/// Insert a new invoice and return it with its joined tag.
///
/// # Errors
/// Returns [Error::InvalidTag] if the tag ID does not refer to an invoice
/// tag, or a [Error::SqlError] if there is some other SQL error.
pub fn create_invoice(new_invoice: &NewInvoice, connection: &Connection) -> Result<Invoice, Error> {
    connection.execute(
        "INSERT INTO invoice (phone, name, title, amount, tag, payment_type,
            payment_reference, created_at, actual_amt_credit_dt, effective_from, effective_to)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        (
            &new_invoice.phone,
            &new_invoice.name,
            &new_invoice.title,
            new_invoice.amount,
            new_invoice.tag,
            &new_invoice.payment_type,
            &new_invoice.payment_reference,
            now_timestamp(),
            &new_invoice.actual_amt_credit_dt,
            &new_invoice.effective_from,
            &new_invoice.effective_to,
        ),
    )?;

    get_invoice(connection.last_insert_rowid(), connection)
}

/// Retrieve the invoice with `id`, including its joined tag.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an invoice, or a
/// [Error::SqlError] if there is some other SQL error.
pub fn get_invoice(id: DatabaseId, connection: &Connection) -> Result<Invoice, Error> {
    connection
        .prepare(&format!("{SELECT_INVOICE} WHERE i.id = :id"))?
        .query_row(&[(":id", &id)], map_row)
        .map_err(|error| error.into())
}

/// Delete the invoice with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an invoice, or a
/// [Error::SqlError] if there is some other SQL error.
pub fn delete_invoice(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM invoice WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Validate the parts of a [NewInvoice] the schema cannot check.
fn validate_new_invoice(new_invoice: &NewInvoice) -> Result<(), Error> {
    if new_invoice.name.trim().is_empty() || new_invoice.title.trim().is_empty() {
        return Err(Error::Validation("Name and title are required".to_owned()));
    }

    if new_invoice.payment_type.trim().is_empty() {
        return Err(Error::Validation("Payment type is required".to_owned()));
    }

    if new_invoice.payment_type != PAYMENT_TYPE_CASH
        && new_invoice
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

    for (value, parameter) in [
        (&new_invoice.actual_amt_credit_dt, "actual_amt_credit_dt"),
        (&new_invoice.effective_from, "effective_from"),
        (&new_invoice.effective_to, "effective_to"),
    ] {
        if let Some(raw) = value {
            parse_date_parameter(raw, parameter)?;
        }
    }

    Ok(())
}

/// The state needed for the invoice endpoints.
#[derive(Debug, Clone)]
pub struct InvoiceEndpointState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls paging.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for InvoiceEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler for listing invoices with filters.
pub async fn get_invoices_endpoint(
    State(state): State<InvoiceEndpointState>,
    Query(params): Query<InvoiceListParams>,
) -> Result<Response, Error> {
    let query = InvoiceQuery::from_params(&params, &state.pagination_config)?;
    let connection = lock_connection(&state.db_connection)?;
    let invoices = query_invoices(&query, &connection)?;

    Ok(Json(json!({ "invoices": invoices })).into_response())
}

/// A route handler for recording a new invoice.
pub async fn create_invoice_endpoint(
    State(state): State<InvoiceEndpointState>,
    _session: Session,
    Json(new_invoice): Json<NewInvoice>,
) -> Result<Response, Error> {
    validate_new_invoice(&new_invoice)?;

    let connection = lock_connection(&state.db_connection)?;
    let invoice = create_invoice(&new_invoice, &connection)?;

    Ok((StatusCode::CREATED, Json(json!({ "invoice": invoice }))).into_response())
}

/// A route handler for deleting an invoice by ID.
pub async fn delete_invoice_endpoint(
    State(state): State<InvoiceEndpointState>,
    _session: Session,
    Path(invoice_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_invoice(invoice_id, &connection)?;

    Ok(Json(json!({ "message": "Invoice deleted successfully" })).into_response())
}

#[cfg(test)]
mod invoice_store_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        tag::{TagKind, create_tag},
    };

    use super::{InvoiceQuery, NewInvoice, create_invoice, delete_invoice, query_invoices};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not create tables");

        conn
    }

    fn new_invoice(name: &str, amount: f64) -> NewInvoice {
        NewInvoice {
            phone: Some("9999999999".to_owned()),
            name: name.to_owned(),
            title: "Tithe".to_owned(),
            amount,
            tag: None,
            payment_type: "cash".to_owned(),
            payment_reference: None,
            actual_amt_credit_dt: None,
            effective_from: None,
            effective_to: None,
        }
    }

    fn all_invoices() -> InvoiceQuery {
        InvoiceQuery {
            limit: 50,
            ..Default::default()
        }
    }

    #[test]
    fn create_invoice_joins_tag() {
        let conn = get_db_connection();
        let tag = create_tag(TagKind::Invoice, "Tithe", None, &conn).unwrap();

        let invoice = create_invoice(
            &NewInvoice {
                tag: Some(tag.tag_id),
                ..new_invoice("Anna", 100.0)
            },
            &conn,
        )
        .unwrap();

        assert!(invoice.id > 0);
        let joined = invoice.tags.unwrap();
        assert_eq!(joined.tag_id, tag.tag_id);
        assert_eq!(joined.tag_name, "Tithe");
    }

    #[test]
    fn create_invoice_with_unknown_tag_fails() {
        let conn = get_db_connection();

        let result = create_invoice(
            &NewInvoice {
                tag: Some(1337),
                ..new_invoice("Anna", 100.0)
            },
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidTag));
    }

    #[test]
    fn phone_filter_matches_exactly() {
        let conn = get_db_connection();
        create_invoice(&new_invoice("Anna", 100.0), &conn).unwrap();
        create_invoice(
            &NewInvoice {
                phone: Some("8888888888".to_owned()),
                ..new_invoice("Binu", 50.0)
            },
            &conn,
        )
        .unwrap();

        let invoices = query_invoices(
            &InvoiceQuery {
                phone: Some("8888888888".to_owned()),
                ..all_invoices()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].name, "Binu");
    }

    #[test]
    fn payment_reference_filter_is_case_insensitive_substring() {
        let conn = get_db_connection();
        create_invoice(
            &NewInvoice {
                payment_type: "upi".to_owned(),
                payment_reference: Some("UPI-2024-0042".to_owned()),
                ..new_invoice("Anna", 100.0)
            },
            &conn,
        )
        .unwrap();
        create_invoice(&new_invoice("Binu", 50.0), &conn).unwrap();

        let invoices = query_invoices(
            &InvoiceQuery {
                payment_reference: Some("upi-2024".to_owned()),
                ..all_invoices()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].name, "Anna");
    }

    #[test]
    fn pending_credit_filter_keeps_uncredited_rows() {
        let conn = get_db_connection();
        create_invoice(
            &NewInvoice {
                actual_amt_credit_dt: Some("2024-03-14".to_owned()),
                ..new_invoice("Anna", 100.0)
            },
            &conn,
        )
        .unwrap();
        create_invoice(&new_invoice("Binu", 50.0), &conn).unwrap();

        let invoices = query_invoices(
            &InvoiceQuery {
                only_pending_credit: true,
                ..all_invoices()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].name, "Binu");
    }

    #[test]
    fn credited_date_bounds_filter_rows() {
        let conn = get_db_connection();
        create_invoice(
            &NewInvoice {
                actual_amt_credit_dt: Some("2024-03-14".to_owned()),
                ..new_invoice("Anna", 100.0)
            },
            &conn,
        )
        .unwrap();
        create_invoice(
            &NewInvoice {
                actual_amt_credit_dt: Some("2024-06-01".to_owned()),
                ..new_invoice("Binu", 50.0)
            },
            &conn,
        )
        .unwrap();

        let invoices = query_invoices(
            &InvoiceQuery {
                credited_from: Some("2024-03-01".to_owned()),
                credited_to: Some("2024-03-31".to_owned()),
                ..all_invoices()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].name, "Anna");
    }

    #[test]
    fn results_are_newest_first_and_paged() {
        let conn = get_db_connection();
        for i in 0..5 {
            create_invoice(&new_invoice(&format!("Giver {i}"), 10.0), &conn).unwrap();
        }

        let first_page = query_invoices(
            &InvoiceQuery {
                limit: 2,
                offset: 0,
                ..Default::default()
            },
            &conn,
        )
        .unwrap();
        let second_page = query_invoices(
            &InvoiceQuery {
                limit: 2,
                offset: 2,
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].name, "Giver 4");
        assert_eq!(second_page[0].name, "Giver 2");
    }

    #[test]
    fn delete_invoice_removes_row() {
        let conn = get_db_connection();
        let invoice = create_invoice(&new_invoice("Anna", 100.0), &conn).unwrap();

        delete_invoice(invoice.id, &conn).unwrap();

        assert_eq!(delete_invoice(invoice.id, &conn), Err(Error::NotFound));
        assert!(query_invoices(&all_invoices(), &conn).unwrap().is_empty());
    }
}

#[cfg(test)]
mod invoice_query_params_tests {
    use crate::{Error, pagination::PaginationConfig};

    use super::{InvoiceListParams, InvoiceQuery};

    #[test]
    fn sentinels_mean_no_filter() {
        let params = InvoiceListParams {
            tag_id: Some("__all__".to_owned()),
            payment_type: Some("__all__".to_owned()),
            ..Default::default()
        };

        let query = InvoiceQuery::from_params(&params, &PaginationConfig::default()).unwrap();

        assert_eq!(query.tag, None);
        assert_eq!(query.payment_type, None);
    }

    #[test]
    fn date_bounds_cover_whole_days() {
        let params = InvoiceListParams {
            from_date: Some("2024-03-01".to_owned()),
            max_date: Some("2024-03-31".to_owned()),
            ..Default::default()
        };

        let query = InvoiceQuery::from_params(&params, &PaginationConfig::default()).unwrap();

        assert_eq!(query.created_from.as_deref(), Some("2024-03-01 00:00:00"));
        assert_eq!(query.created_to.as_deref(), Some("2024-03-31 23:59:59"));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let params = InvoiceListParams {
            from_date: Some("not-a-date".to_owned()),
            ..Default::default()
        };

        let result = InvoiceQuery::from_params(&params, &PaginationConfig::default());

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn malformed_tag_id_is_rejected() {
        let params = InvoiceListParams {
            tag_id: Some("banana".to_owned()),
            ..Default::default()
        };

        let result = InvoiceQuery::from_params(&params, &PaginationConfig::default());

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
