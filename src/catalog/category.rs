//! Category storage and resolution.

use rusqlite::{Connection, OptionalExtension};

use crate::{
    Error,
    catalog::{CategoryName, RESOLVE_RETRY_LIMIT},
    database_id::CategoryId,
};

/// Create the category table.
///
/// The name column collates case-insensitively, so the UNIQUE constraint
/// guarantees at most one row per semantic key regardless of letter casing.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL COLLATE NOCASE UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Resolve a category name to its stable identifier, creating the category on
/// first reference.
///
/// Matching is case-insensitive. If a concurrent caller creates the same
/// category between our lookup and insert, the resulting uniqueness conflict
/// is swallowed and the lookup re-run, so all callers converge on the row
/// that won the race.
///
/// # Errors
/// This function will return a:
/// - [Error::CatalogConflict] if the lookup-insert cycle loses the race
///   [RESOLVE_RETRY_LIMIT](super::RESOLVE_RETRY_LIMIT) times in a row,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn resolve_category(name: &CategoryName, connection: &Connection) -> Result<CategoryId, Error> {
    for _ in 0..RESOLVE_RETRY_LIMIT {
        if let Some(id) = find_category_id(name, connection)? {
            return Ok(id);
        }

        match insert_category(name, connection) {
            Ok(id) => return Ok(id),
            // Lost the insert race, re-read the winner's row.
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

    Err(Error::CatalogConflict("category"))
}

fn find_category_id(
    name: &CategoryName,
    connection: &Connection,
) -> Result<Option<CategoryId>, Error> {
    connection
        .prepare("SELECT id FROM category WHERE name = :name")?
        .query_row(&[(":name", name.as_ref())], |row| row.get(0))
        .optional()
        .map_err(|error| error.into())
}

fn insert_category(
    name: &CategoryName,
    connection: &Connection,
) -> Result<CategoryId, rusqlite::Error> {
    connection.execute(
        "INSERT INTO category (name) VALUES (?1)",
        (name.as_ref(),),
    )?;

    Ok(connection.last_insert_rowid())
}
