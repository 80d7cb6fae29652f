//! Vendor storage and resolution.

use rusqlite::{Connection, OptionalExtension};

use crate::{
    Error,
    catalog::{RESOLVE_RETRY_LIMIT, VendorName},
    database_id::VendorId,
};

/// Create the vendor table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_vendor_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS vendor (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL COLLATE NOCASE UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Resolve a vendor name to its stable identifier, creating the vendor on
/// first reference.
///
/// Matching is case-insensitive, and concurrent first references converge on
/// a single row via the same lookup-insert-reread cycle as
/// [resolve_category](super::resolve_category).
///
/// # Errors
/// This function will return a:
/// - [Error::CatalogConflict] if the retry budget is exhausted,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn resolve_vendor(name: &VendorName, connection: &Connection) -> Result<VendorId, Error> {
    for _ in 0..RESOLVE_RETRY_LIMIT {
        if let Some(id) = find_vendor_id(name, connection)? {
            return Ok(id);
        }

        match insert_vendor(name, connection) {
            Ok(id) => return Ok(id),
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            )) => continue,
            Err(error) => return Err(error.into()),
        }
    }

    Err(Error::CatalogConflict("vendor"))
}

fn find_vendor_id(name: &VendorName, connection: &Connection) -> Result<Option<VendorId>, Error> {
    connection
        .prepare("SELECT id FROM vendor WHERE name = :name")?
        .query_row(&[(":name", name.as_ref())], |row| row.get(0))
        .optional()
        .map_err(|error| error.into())
}

fn insert_vendor(name: &VendorName, connection: &Connection) -> Result<VendorId, rusqlite::Error> {
    connection.execute("INSERT INTO vendor (name) VALUES (?1)", (name.as_ref(),))?;

    Ok(connection.last_insert_rowid())
}
