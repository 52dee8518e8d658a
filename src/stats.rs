//! Aggregate reports over the ledger: monthly giving totals, filtered grand
//! totals and the cash/bank balance as of a date.
//!
//! One endpoint serves all three shapes, selected by the `type` query
//! parameter.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, named_params};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    db::{DatabaseId, end_of_day, lock_connection, parse_date_parameter, start_of_day},
    invoice::{PAYMENT_TYPE_CASH, parse_tag_filter},
};

/// The lower bound applied to monthly reports when no `fromDate` is given.
/// Predates every ledger entry.
const MONTHLY_EPOCH: &str = "2020-01-01 00:00:00";

/// One month's invoice total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// The month in "YYYY-MM" form.
    pub month: String,
    /// The sum of invoice amounts recorded in that month.
    pub total: f64,
}

/// The net position of one payment class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentGroupBalance {
    /// Either `cash` or `bank`.
    pub payment_group: String,
    /// Invoice credits minus expenditure debits for the group.
    pub total_amount: f64,
}

/// Sum invoice amounts per calendar month within `[from, to]`, optionally
/// narrowed to a phone number or tag.
///
/// Months with no invoices are omitted.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn monthly_totals(
    phone: Option<&str>,
    tag: Option<DatabaseId>,
    from: &str,
    to: &str,
    connection: &Connection,
) -> Result<Vec<MonthlyTotal>, Error> {
    connection
        .prepare(
            "SELECT strftime('%Y-%m', created_at) AS month, SUM(amount) AS total
             FROM invoice
             WHERE created_at >= :from AND created_at <= :to
                AND (:phone IS NULL OR phone = :phone)
                AND (:tag IS NULL OR tag = :tag)
             GROUP BY month
             ORDER BY month ASC",
        )?
        .query_map(
            named_params! { ":from": from, ":to": to, ":phone": phone, ":tag": tag },
            |row| {
                Ok(MonthlyTotal {
                    month: row.get(0)?,
                    total: row.get(1)?,
                })
            },
        )?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect()
}

/// Sum all invoice amounts, optionally narrowed to a phone number, a tag and
/// an inclusive upper bound on `created_at`.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn invoice_total(
    phone: Option<&str>,
    tag: Option<DatabaseId>,
    to: Option<&str>,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0)
             FROM invoice
             WHERE (:phone IS NULL OR phone = :phone)
                AND (:tag IS NULL OR tag = :tag)
                AND (:to IS NULL OR created_at <= :to)",
            named_params! { ":phone": phone, ":tag": tag, ":to": to },
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Net balance per payment class as of the end of a day: invoice credits
/// minus expenditure debits, with `cash` payments in one group and
/// everything else in `bank`.
///
/// Both groups are always present, zero when nothing matched.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn net_balance_by_payment_group(
    invoice_cutoff: &str,
    expenditure_cutoff: &str,
    connection: &Connection,
) -> Result<Vec<PaymentGroupBalance>, Error> {
    let mut cash = 0.0;
    let mut bank = 0.0;

    let credits = connection
        .prepare(
            "SELECT CASE WHEN payment_type = :cash THEN :cash ELSE 'bank' END AS payment_group,
                SUM(amount)
             FROM invoice
             WHERE created_at <= :cutoff
             GROUP BY payment_group",
        )?
        .query_map(
            named_params! { ":cash": PAYMENT_TYPE_CASH, ":cutoff": invoice_cutoff },
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )?
        .collect::<Result<Vec<_>, _>>()?;
    for (group, total) in credits {
        if group == PAYMENT_TYPE_CASH {
            cash += total;
        } else {
            bank += total;
        }
    }

    let debits = connection
        .prepare(
            "SELECT CASE WHEN payment_type = :cash THEN :cash ELSE 'bank' END AS payment_group,
                SUM(amount)
             FROM expenditure
             WHERE date <= :cutoff
             GROUP BY payment_group",
        )?
        .query_map(
            named_params! { ":cash": PAYMENT_TYPE_CASH, ":cutoff": expenditure_cutoff },
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )?
        .collect::<Result<Vec<_>, _>>()?;
    for (group, total) in debits {
        if group == PAYMENT_TYPE_CASH {
            cash -= total;
        } else {
            bank -= total;
        }
    }

    Ok(vec![
        PaymentGroupBalance {
            payment_group: PAYMENT_TYPE_CASH.to_owned(),
            total_amount: cash,
        },
        PaymentGroupBalance {
            payment_group: "bank".to_owned(),
            total_amount: bank,
        },
    ])
}

/// The query string parameters accepted by `GET /api/invoices/stats`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    /// The report shape: `monthly`, `total` or `balance`.
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    /// Phone number to narrow `monthly` and `total` reports to.
    pub phone: Option<String>,
    /// Tag ID to narrow `monthly` and `total` reports to, or `__all__`.
    pub tag_id: Option<String>,
    /// Lower bound day for the `monthly` report.
    pub from_date: Option<String>,
    /// Upper bound day for the `monthly` and `total` reports.
    pub to_date: Option<String>,
    /// The day the `balance` report is taken as of. Required for `balance`.
    pub end_date: Option<String>,
}

/// The state needed for the stats endpoint.
#[derive(Debug, Clone)]
pub struct StatsEndpointState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatsEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler serving the monthly, total and balance reports.
pub async fn get_invoice_stats_endpoint(
    State(state): State<StatsEndpointState>,
    Query(params): Query<StatsParams>,
) -> Result<Response, Error> {
    let phone = params
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty());
    let tag = parse_tag_filter(params.tag_id.as_deref())?;

    match params.report_type.as_deref() {
        Some("monthly") => {
            let from = match params.from_date.as_deref() {
                Some(raw) => start_of_day(parse_date_parameter(raw, "fromDate")?),
                None => MONTHLY_EPOCH.to_owned(),
            };
            let to = match params.to_date.as_deref() {
                Some(raw) => end_of_day(parse_date_parameter(raw, "toDate")?),
                None => end_of_day(time::OffsetDateTime::now_utc().date()),
            };

            let connection = lock_connection(&state.db_connection)?;
            let data = monthly_totals(phone, tag, &from, &to, &connection)?;

            Ok(Json(json!({ "data": data })).into_response())
        }
        Some("total") => {
            let to = params
                .to_date
                .as_deref()
                .map(|raw| parse_date_parameter(raw, "toDate").map(end_of_day))
                .transpose()?;

            let connection = lock_connection(&state.db_connection)?;
            let total = invoice_total(phone, tag, to.as_deref(), &connection)?;

            Ok(Json(json!({ "data": [{ "total": total }] })).into_response())
        }
        Some("balance") => {
            let Some(raw) = params.end_date.as_deref() else {
                return Err(Error::Validation(
                    "endDate parameter is required for balance type".to_owned(),
                ));
            };
            let end = parse_date_parameter(raw, "endDate")?;

            let connection = lock_connection(&state.db_connection)?;
            let data =
                net_balance_by_payment_group(&end_of_day(end), raw, &connection)?;

            Ok(Json(json!({ "data": data })).into_response())
        }
        _ => Err(Error::Validation(
            "Type parameter must be \"monthly\", \"total\", or \"balance\"".to_owned(),
        )),
    }
}
