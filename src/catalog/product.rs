//! Product storage and resolution.
//!
//! Products are the one catalog entity with a composite semantic key: the
//! case-insensitive (name, brand) pair, with absent brands comparing equal.
//! The row identifier is a generated surrogate and is never used for
//! matching.

use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::{
    Error,
    catalog::{ProductName, RESOLVE_RETRY_LIMIT},
    database_id::{CategoryId, ProductId},
};

/// Create the product table.
///
/// Identity is enforced by a unique expression index over
/// `(name, IFNULL(brand, ''))` so that two rows can never share a semantic
/// key, including the brand-absent case which plain column uniqueness would
/// treat as distinct NULLs.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_product_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS product (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL COLLATE NOCASE,
            brand TEXT COLLATE NOCASE,
            category_id INTEGER NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_product_identity
            ON product(name, IFNULL(brand, '') COLLATE NOCASE);",
    )?;

    Ok(())
}

/// Resolve a (name, brand) pair to the product's stable identifier, creating
/// the product on first reference.
///
/// `category_id` is only used when the product does not exist yet; an
/// existing product keeps the category it was first filed under.
///
/// # Errors
/// This function will return a:
/// - [Error::CatalogConflict] if the retry budget is exhausted,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn resolve_product(
    name: &ProductName,
    brand: Option<&str>,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<ProductId, Error> {
    for _ in 0..RESOLVE_RETRY_LIMIT {
        if let Some(id) = find_product_id(name, brand, connection)? {
            return Ok(id);
        }

        match insert_product(name, brand, category_id, connection) {
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

    Err(Error::CatalogConflict("product"))
}

fn find_product_id(
    name: &ProductName,
    brand: Option<&str>,
    connection: &Connection,
) -> Result<Option<ProductId>, Error> {
    connection
        .prepare(
            "SELECT id FROM product
             WHERE name = :name AND IFNULL(brand, '') = IFNULL(:brand, '') COLLATE NOCASE",
        )?
        .query_row(
            rusqlite::named_params! { ":name": name.as_ref(), ":brand": brand },
            |row| row.get(0),
        )
        .optional()
        .map_err(|error| error.into())
}

fn insert_product(
    name: &ProductName,
    brand: Option<&str>,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<ProductId, rusqlite::Error> {
    let id = generate_product_id(name.as_ref());

    connection.execute(
        "INSERT INTO product (id, name, brand, category_id) VALUES (?1, ?2, ?3, ?4)",
        (&id, name.as_ref(), brand, category_id),
    )?;

    Ok(id)
}

/// Generate a product surrogate ID of the form `PREFIX-<millis>-<hash>`.
///
/// The prefix is the first three alphanumeric characters of the name,
/// uppercased. The collision probability is accepted as negligible; the ID
/// carries no semantics and identity lookups never use it.
fn generate_product_id(name: &str) -> ProductId {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let prefix = if prefix.is_empty() { "PRD".to_string() } else { prefix };

    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let digest = format!("{:x}", md5::compute(format!("{name}-{millis}")));

    format!("{prefix}-{millis}-{}", &digest[..8])
}
