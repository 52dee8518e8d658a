//! This file defines the `Tag` type, the types needed to create a tag and the
//! API routes for the two tag namespaces.
//!
//! Invoice tags and expense tags live in separate tables so that receipt
//! categories (e.g. 'Tithe', 'Building Fund') never mix with spending
//! categories (e.g. 'Electricity', 'Repairs').

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::Session,
    db::{DatabaseId, lock_connection, now_timestamp},
};

/// Which tag namespace a request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Tags for invoices (fund receipts).
    Invoice,
    /// Tags for expenditures.
    Expense,
}

impl TagKind {
    /// Parse the `type` discriminator used by the tag endpoints.
    ///
    /// # Errors
    /// Returns an [Error::Validation] for anything other than `invoice` or
    /// `expense`.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "invoice" => Ok(Self::Invoice),
            "expense" => Ok(Self::Expense),
            _ => Err(Error::Validation(
                "Type must be \"invoice\" or \"expense\"".to_owned(),
            )),
        }
    }

    fn table(self) -> &'static str {
        match self {
            Self::Invoice => "invoice_tag",
            Self::Expense => "expense_tag",
        }
    }
}

/// A tag for grouping ledger entries, e.g. 'Tithe' or 'Electricity'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// The ID of the tag.
    pub tag_id: DatabaseId,
    /// The name of the tag. Unique within its namespace.
    pub tag_name: String,
    /// Optional comma-separated sub-tag names.
    pub sub_tags: Option<String>,
    /// When the tag was created, as a stored timestamp.
    pub created_at: String,
}

/// A tag reduced to what form drop-downs need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagOption {
    /// The ID of the tag.
    pub tag_id: DatabaseId,
    /// The name of the tag.
    pub tag_name: String,
}

/// Create the tables for both tag namespaces.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_tag_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS invoice_tag (
            tag_id INTEGER PRIMARY KEY,
            tag_name TEXT NOT NULL UNIQUE,
            sub_tags TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS expense_tag (
            tag_id INTEGER PRIMARY KEY,
            tag_name TEXT NOT NULL UNIQUE,
            sub_tags TEXT,
            created_at TEXT NOT NULL
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Tag, rusqlite::Error> {
    Ok(Tag {
        tag_id: row.get(0)?,
        tag_name: row.get(1)?,
        sub_tags: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Create a tag in the `kind` namespace.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_tag(
    kind: TagKind,
    tag_name: &str,
    sub_tags: Option<&str>,
    connection: &Connection,
) -> Result<Tag, Error> {
    let created_at = now_timestamp();

    connection.execute(
        &format!(
            "INSERT INTO {} (tag_name, sub_tags, created_at) VALUES (?1, ?2, ?3)",
            kind.table()
        ),
        (tag_name, sub_tags, &created_at),
    )?;

    Ok(Tag {
        tag_id: connection.last_insert_rowid(),
        tag_name: tag_name.to_owned(),
        sub_tags: sub_tags.map(str::to_owned),
        created_at,
    })
}

/// Retrieve the tag with `tag_id` from the `kind` namespace.
///
/// # Errors
/// Returns [Error::NotFound] if `tag_id` does not refer to a tag, or a
/// [Error::SqlError] if there is some other SQL error.
pub fn get_tag(kind: TagKind, tag_id: DatabaseId, connection: &Connection) -> Result<Tag, Error> {
    connection
        .prepare(&format!(
            "SELECT tag_id, tag_name, sub_tags, created_at FROM {} WHERE tag_id = :id",
            kind.table()
        ))?
        .query_row(&[(":id", &tag_id)], map_row)
        .map_err(|error| error.into())
}

/// Rename the tag with `tag_id` and return the updated row.
///
/// # Errors
/// Returns [Error::NotFound] if `tag_id` does not refer to a tag, or a
/// [Error::SqlError] if there is some other SQL error.
pub fn rename_tag(
    kind: TagKind,
    tag_id: DatabaseId,
    tag_name: &str,
    connection: &Connection,
) -> Result<Tag, Error> {
    let rows_affected = connection.execute(
        &format!(
            "UPDATE {} SET tag_name = ?1 WHERE tag_id = ?2",
            kind.table()
        ),
        (tag_name, tag_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_tag(kind, tag_id, connection)
}

/// Retrieve all tags in the `kind` namespace, newest first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_tags(kind: TagKind, connection: &Connection) -> Result<Vec<Tag>, Error> {
    connection
        .prepare(&format!(
            "SELECT tag_id, tag_name, sub_tags, created_at FROM {}
             ORDER BY created_at DESC, tag_id DESC",
            kind.table()
        ))?
        .query_map([], map_row)?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the invoice tags reduced to drop-down options.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_invoice_tag_options(connection: &Connection) -> Result<Vec<TagOption>, Error> {
    connection
        .prepare("SELECT tag_id, tag_name FROM invoice_tag ORDER BY tag_id ASC")?
        .query_map([], |row| {
            Ok(TagOption {
                tag_id: row.get(0)?,
                tag_name: row.get(1)?,
            })
        })?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

/// The state needed for the tag endpoints.
#[derive(Debug, Clone)]
pub struct TagEndpointState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TagEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a tag.
#[derive(Debug, Deserialize)]
pub struct NewTagData {
    /// The namespace discriminator, `invoice` or `expense`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The name of the new tag.
    pub tag_name: String,
    /// Optional comma-separated sub-tag names.
    #[serde(default)]
    pub sub_tags: Option<String>,
}

/// The request body for renaming a tag.
#[derive(Debug, Deserialize)]
pub struct RenameTagData {
    /// The namespace discriminator, `invoice` or `expense`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The ID of the tag to rename.
    pub tag_id: DatabaseId,
    /// The new name for the tag.
    pub tag_name: String,
}

/// A route handler for listing the tags of both namespaces.
pub async fn get_tags_endpoint(State(state): State<TagEndpointState>) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let invoice_tags = get_all_tags(TagKind::Invoice, &connection)?;
    let expense_tags = get_all_tags(TagKind::Expense, &connection)?;

    Ok(Json(json!({
        "invoiceTags": invoice_tags,
        "expenseTags": expense_tags,
    }))
    .into_response())
}

/// A route handler for creating a new tag.
pub async fn create_tag_endpoint(
    State(state): State<TagEndpointState>,
    _session: Session,
    Json(new_tag): Json<NewTagData>,
) -> Result<Response, Error> {
    let kind = TagKind::parse(&new_tag.kind)?;

    if new_tag.tag_name.trim().is_empty() {
        return Err(Error::Validation("Tag name is required".to_owned()));
    }

    let connection = lock_connection(&state.db_connection)?;
    let tag = create_tag(
        kind,
        new_tag.tag_name.trim(),
        new_tag.sub_tags.as_deref(),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(json!({ "tag": tag }))).into_response())
}

/// A route handler for renaming a tag.
pub async fn rename_tag_endpoint(
    State(state): State<TagEndpointState>,
    _session: Session,
    Json(update): Json<RenameTagData>,
) -> Result<Response, Error> {
    let kind = TagKind::parse(&update.kind)?;

    if update.tag_name.trim().is_empty() {
        return Err(Error::Validation("Tag name is required".to_owned()));
    }

    let connection = lock_connection(&state.db_connection)?;
    let tag = rename_tag(kind, update.tag_id, update.tag_name.trim(), &connection)?;

    Ok(Json(json!({ "tag": tag })).into_response())
}

/// A route handler for listing invoice tags for form drop-downs.
pub async fn get_invoice_tag_options_endpoint(
    State(state): State<TagEndpointState>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let tags = get_invoice_tag_options(&connection)?;

    Ok(Json(json!({ "tags": tags })).into_response())
}

#[cfg(test)]
mod tag_store_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{TagKind, create_tag, get_all_tags, get_tag, rename_tag};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not create tables");

        conn
    }

    #[test]
    fn create_and_get_tag() {
        let conn = get_db_connection();

        let tag = create_tag(TagKind::Invoice, "Tithe", None, &conn).unwrap();

        assert!(tag.tag_id > 0);
        assert_eq!(get_tag(TagKind::Invoice, tag.tag_id, &conn).unwrap(), tag);
    }

    #[test]
    fn create_tag_with_taken_name_fails() {
        let conn = get_db_connection();
        create_tag(TagKind::Invoice, "Tithe", None, &conn).unwrap();

        let result = create_tag(TagKind::Invoice, "Tithe", None, &conn);

        assert_eq!(result, Err(Error::DuplicateTag));
    }

    #[test]
    fn same_name_is_allowed_across_namespaces() {
        let conn = get_db_connection();
        create_tag(TagKind::Invoice, "Missions", None, &conn).unwrap();

        let result = create_tag(TagKind::Expense, "Missions", None, &conn);

        assert!(result.is_ok());
    }

    #[test]
    fn namespaces_are_disjoint() {
        let conn = get_db_connection();

        let invoice_tag = create_tag(TagKind::Invoice, "Tithe", None, &conn).unwrap();

        assert_eq!(
            get_tag(TagKind::Expense, invoice_tag.tag_id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn rename_tag_updates_name() {
        let conn = get_db_connection();
        let tag = create_tag(TagKind::Expense, "Electrcity", Some("meter,line"), &conn).unwrap();

        let renamed = rename_tag(TagKind::Expense, tag.tag_id, "Electricity", &conn).unwrap();

        assert_eq!(renamed.tag_name, "Electricity");
        assert_eq!(renamed.sub_tags.as_deref(), Some("meter,line"));
    }

    #[test]
    fn rename_missing_tag_fails() {
        let conn = get_db_connection();

        let result = rename_tag(TagKind::Invoice, 1337, "Tithe", &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_all_tags_returns_newest_first() {
        let conn = get_db_connection();
        let first = create_tag(TagKind::Invoice, "Tithe", None, &conn).unwrap();
        let second = create_tag(TagKind::Invoice, "Building Fund", None, &conn).unwrap();

        let tags = get_all_tags(TagKind::Invoice, &conn).unwrap();

        assert_eq!(tags, vec![second, first]);
    }
}
