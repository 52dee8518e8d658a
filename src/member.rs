//! This file defines the `Member` type and the API routes for the
//! congregation member register.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
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

/// A member of the congregation.
///
/// Phone numbers are not unique: families commonly share one number, so
/// several members may carry the same phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// The ID of the member.
    pub id: DatabaseId,
    /// The member's first name.
    pub first_name: String,
    /// The member's last name.
    pub last_name: String,
    /// The member's contact phone number.
    pub phone: String,
    /// The member's postal address.
    pub address: String,
    /// When the member was registered, as a stored timestamp.
    pub created_at: String,
}

/// The request body for registering a member.
#[derive(Debug, Deserialize)]
pub struct NewMember {
    /// The member's first name.
    pub first_name: String,
    /// The member's last name.
    pub last_name: String,
    /// The member's contact phone number.
    pub phone: String,
    /// The member's postal address.
    pub address: String,
}

/// Create the member table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_member_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS member (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                address TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Member, rusqlite::Error> {
    Ok(Member {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a new member into the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_member(new_member: &NewMember, connection: &Connection) -> Result<Member, Error> {
    let created_at = now_timestamp();

    connection.execute(
        "INSERT INTO member (first_name, last_name, phone, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &new_member.first_name,
            &new_member.last_name,
            &new_member.phone,
            &new_member.address,
            &created_at,
        ),
    )?;

    Ok(Member {
        id: connection.last_insert_rowid(),
        first_name: new_member.first_name.clone(),
        last_name: new_member.last_name.clone(),
        phone: new_member.phone.clone(),
        address: new_member.address.clone(),
        created_at,
    })
}

/// Retrieve members, optionally filtered to an exact phone number, newest
/// first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_members(phone: Option<&str>, connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT id, first_name, last_name, phone, address, created_at FROM member
             WHERE (:phone IS NULL OR phone = :phone)
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":phone", &phone)], map_row)?
        .map(|maybe_member| maybe_member.map_err(|error| error.into()))
        .collect()
}

/// Delete the earliest-registered member with `phone`.
///
/// Phone is not unique, so only the first match is removed.
///
/// # Errors
/// Returns [Error::NotFound] if no member has `phone`, or a
/// [Error::SqlError] if there is some other SQL error.
pub fn delete_member_by_phone(phone: &str, connection: &Connection) -> Result<(), Error> {
    let member_id: DatabaseId = connection
        .prepare("SELECT id FROM member WHERE phone = :phone ORDER BY id ASC LIMIT 1")?
        .query_row(&[(":phone", &phone)], |row| row.get(0))?;

    connection.execute("DELETE FROM member WHERE id = ?1", [member_id])?;

    Ok(())
}

/// The state needed for the member endpoints.
#[derive(Debug, Clone)]
pub struct MemberEndpointState {
    /// Handle to the application database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MemberEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted by the member endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct MemberParams {
    /// Exact phone number to filter by (GET) or delete by (DELETE).
    pub phone: Option<String>,
}

/// A route handler for listing members.
pub async fn get_members_endpoint(
    State(state): State<MemberEndpointState>,
    Query(params): Query<MemberParams>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let members = get_members(params.phone.as_deref(), &connection)?;

    Ok(Json(json!({ "members": members })).into_response())
}

/// A route handler for registering a new member.
pub async fn create_member_endpoint(
    State(state): State<MemberEndpointState>,
    _session: Session,
    Json(new_member): Json<NewMember>,
) -> Result<Response, Error> {
    if new_member.first_name.trim().is_empty() || new_member.phone.trim().is_empty() {
        return Err(Error::Validation(
            "First name and phone are required".to_owned(),
        ));
    }

    let connection = lock_connection(&state.db_connection)?;
    let member = create_member(&new_member, &connection)?;

    Ok((StatusCode::CREATED, Json(json!({ "member": member }))).into_response())
}

/// A route handler for deleting a member by phone number.
pub async fn delete_member_endpoint(
    State(state): State<MemberEndpointState>,
    _session: Session,
    Query(params): Query<MemberParams>,
) -> Result<Response, Error> {
    let phone = params
        .phone
        .ok_or_else(|| Error::Validation("Phone parameter is required".to_owned()))?;

    let connection = lock_connection(&state.db_connection)?;
    delete_member_by_phone(&phone, &connection)?;

    Ok(Json(json!({ "message": "Member deleted successfully" })).into_response())
}


#[cfg(test)]
mod member_endpoint_tests {
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
    async fn create_then_get_member_by_phone() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::MEMBERS_API)
            .add_cookie(session_cookie(&state))
            .json(&json!({
                "first_name": "A",
                "last_name": "B",
                "phone": "9999999999",
                "address": "X",
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert!(body["member"]["id"].as_i64().unwrap() > 0);

        let response = server
            .get(&format!("{}?phone=9999999999", endpoints::MEMBERS_API))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let members = body["members"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["phone"], "9999999999");
    }

    #[tokio::test]
    async fn create_member_without_session_is_rejected() {
        let (server, _state) = get_test_server();

        let response = server
            .post(endpoints::MEMBERS_API)
            .json(&json!({
                "first_name": "A",
                "last_name": "B",
                "phone": "9999999999",
                "address": "X",
            }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn delete_member_requires_phone_parameter() {
        let (server, state) = get_test_server();

        let response = server
            .delete(endpoints::MEMBERS_API)
            .add_cookie(session_cookie(&state))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Phone parameter is required");
    }

    #[tokio::test]
    async fn delete_missing_member_returns_not_found() {
        let (server, state) = get_test_server();

        let response = server
            .delete(&format!("{}?phone=0000000000", endpoints::MEMBERS_API))
            .add_cookie(session_cookie(&state))
            .await;

        response.assert_status_not_found();
    }
}
