//! User profiles and the endpoints the authentication gateway uses to
//! materialize and refresh them.
//!
//! Credential handling lives in an external collaborator; this module only
//! stores the profile data the ledger needs, most importantly the postal-area
//! code (pincode) that scopes cross-user price comparison.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, auth::AuthenticatedUser, database_id::DatabaseId};

/// Database identifier for a user.
pub type UserId = DatabaseId;

/// The role a user signed up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// A regular user logging their own purchases.
    Customer,
    /// A seller. Vendors log purchases too; the distinction only matters to
    /// the presentation layer.
    Vendor,
}

impl UserRole {
    fn as_str(self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Vendor => "vendor",
        }
    }
}

impl ToSql for UserRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for UserRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "customer" => Ok(UserRole::Customer),
            "vendor" => Ok(UserRole::Vendor),
            other => Err(FromSqlError::Other(
                format!("unknown user role {other:?}").into(),
            )),
        }
    }
}

/// A user of the expense ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The ID of the user.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
    /// The contact handle (email or phone) the user signed up with.
    pub contact: String,
    /// The role the user signed up with.
    pub role: UserRole,
    /// The postal-area code the user was last seen in, if known.
    pub pincode: Option<String>,
    /// Latitude of the last captured location snapshot.
    pub latitude: Option<f64>,
    /// Longitude of the last captured location snapshot.
    pub longitude: Option<f64>,
}

/// Create the user table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                contact TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                pincode TEXT,
                latitude REAL,
                longitude REAL
                )",
        (),
    )?;

    // The price engine scans for neighbours by pincode.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_user_pincode ON user(pincode);",
        (),
    )?;

    Ok(())
}

/// Create a user profile and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateContact] if the contact handle is already registered,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_user(
    name: &str,
    contact: &str,
    role: UserRole,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(
            "INSERT INTO user (name, contact, role)
             VALUES (?1, ?2, ?3)
             RETURNING id, name, contact, role, pincode, latitude, longitude",
        )?
        .query_row((name, contact, role), map_user_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateContact(contact.to_owned()),
            error => error.into(),
        })
}

/// Retrieve a user from the database by their `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_user(id: UserId, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(
            "SELECT id, name, contact, role, pincode, latitude, longitude FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_user_row)?;

    Ok(user)
}

/// Refresh a user's pincode and location snapshot.
///
/// Called after the external reverse-geocoding collaborator has turned GPS
/// coordinates into a postal code at login time.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_user_location(
    id: UserId,
    pincode: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET pincode = ?1, latitude = ?2, longitude = ?3 WHERE id = ?4",
        (pincode, latitude, longitude, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get a user's pincode, or `None` if no location has been captured yet.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_user_pincode(id: UserId, connection: &Connection) -> Result<Option<String>, Error> {
    let pincode = connection
        .prepare("SELECT pincode FROM user WHERE id = :id")?
        .query_row(&[(":id", &id)], |row| row.get(0))?;

    Ok(pincode)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        contact: row.get(2)?,
        role: row.get(3)?,
        pincode: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
    })
}

// ============================================================================
// ENDPOINTS
// ============================================================================

/// The form data for creating a user profile.
#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    /// The user's display name.
    pub name: String,
    /// The contact handle the user signed up with. Must be unique.
    pub contact: String,
    /// The role the user signed up with.
    pub role: UserRole,
}

/// A route handler for materializing a user profile at signup.
///
/// The credential half of signup lives in the external auth service; that
/// service calls this endpoint once the credentials are stored.
pub async fn create_user_endpoint(
    State(state): State<AppState>,
    Json(form): Json<CreateUserForm>,
) -> Response {
    let name = form.name.trim();
    if name.is_empty() {
        return Error::EmptyUserName.into_response();
    }

    let contact = form.contact.trim();
    if contact.is_empty() {
        return Error::EmptyContact.into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_user(name, contact, form.role, &connection) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(error) => {
            tracing::error!("could not create user: {error}");
            error.into_response()
        }
    }
}

/// The form data for refreshing a user's location snapshot.
#[derive(Debug, Deserialize)]
pub struct LocationForm {
    /// The postal code derived from the user's GPS coordinates.
    pub pincode: String,
    /// Latitude of the location snapshot.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude of the location snapshot.
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// A route handler for refreshing the authenticated user's pincode and
/// location, called at login time after reverse geocoding.
pub async fn update_location_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(form): Json<LocationForm>,
) -> Response {
    let pincode = form.pincode.trim();
    if pincode.is_empty() {
        return Error::EmptyPincode.into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let updated = update_user_location(user_id, pincode, form.latitude, form.longitude, &connection)
        .and_then(|()| get_user(user_id, &connection));

    match updated {
        Ok(user) => Json(user).into_response(),
        Err(error) => {
            tracing::error!("could not update location for user {user_id}: {error}");
            error.into_response()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
