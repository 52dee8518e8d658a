//! Database initialization and small helpers shared by the store functions.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    Error, access_key::create_access_key_table, expenditure::create_expenditure_table,
    invoice::create_invoice_table, member::create_member_table, tag::create_tag_tables,
    user::create_user_table,
};

/// Alias for the integer row ID type used across the ledger tables.
pub type DatabaseId = i64;

/// The format for dates stored as `TEXT`, e.g. "2025-03-14".
pub const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// The format for timestamps stored as `TEXT`, e.g. "2025-03-14 09:26:53".
///
/// Lexicographic order on this format matches chronological order, so stored
/// timestamps can be compared directly in SQL.
pub const DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Create the full ledger schema on `connection`.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign key enforcement is off by default in SQLite and is
    // per-connection state.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    create_user_table(connection)?;
    create_access_key_table(connection)?;
    create_tag_tables(connection)?;
    create_invoice_table(connection)?;
    create_expenditure_table(connection)?;
    create_member_table(connection)?;

    Ok(())
}

/// Acquire the shared database connection, mapping a poisoned mutex to
/// [Error::DatabaseLock].
pub fn lock_connection(
    connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire the database lock: {error}");
        Error::DatabaseLock
    })
}

/// The current UTC time formatted for storage.
pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(DATE_TIME_FORMAT)
        .unwrap_or_else(|_| String::from("1970-01-01 00:00:00"))
}

/// Parse a calendar date from a query or body parameter.
///
/// Rejects anything that is not a real date in "YYYY-MM-DD" form with a
/// [Error::Validation] naming `parameter`.
pub fn parse_date_parameter(value: &str, parameter: &str) -> Result<Date, Error> {
    Date::parse(value, DATE_FORMAT)
        .map_err(|_| Error::Validation(format!("Invalid date for {parameter}: '{value}'")))
}

/// The stored-timestamp lower bound for `date`, i.e. midnight.
pub fn start_of_day(date: Date) -> String {
    format_day(date, "00:00:00")
}

/// The stored-timestamp upper bound for `date`, i.e. one second to midnight.
pub fn end_of_day(date: Date) -> String {
    format_day(date, "23:59:59")
}

fn format_day(date: Date, time: &str) -> String {
    match date.format(DATE_FORMAT) {
        Ok(day) => format!("{day} {time}"),
        // Date::format with DATE_FORMAT cannot fail for valid dates.
        Err(_) => format!("1970-01-01 {time}"),
    }
}
