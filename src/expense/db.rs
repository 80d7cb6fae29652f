//! Database operations for expense rows.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    database_id::{CategoryId, VendorId},
    user::UserId,
};

use super::models::Expense;

/// Create the expense table and its indexes.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            product_id TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            vendor_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            quantity REAL NOT NULL,
            unit_price REAL NOT NULL,
            total REAL NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(product_id) REFERENCES product(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(vendor_id) REFERENCES vendor(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
    )?;

    Ok(())
}

/// Insert one expense row with a freshly computed total.
///
/// The total is always `quantity * unit_price`; callers never supply it.
///
/// # Errors
/// This function will return an [Error::SqlError] if the insert fails, e.g.
/// because a referenced row does not exist.
#[allow(clippy::too_many_arguments)]
pub(super) fn insert_expense(
    user_id: UserId,
    product_id: &str,
    category_id: CategoryId,
    vendor_id: VendorId,
    date: Date,
    quantity: f64,
    unit_price: f64,
    connection: &Connection,
) -> Result<Expense, Error> {
    let total = quantity * unit_price;

    let expense = connection
        .prepare(
            "INSERT INTO expense (user_id, product_id, category_id, vendor_id, date, quantity, unit_price, total)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id, user_id, product_id, category_id, vendor_id, date, quantity, unit_price, total",
        )?
        .query_row(
            (
                user_id, product_id, category_id, vendor_id, date, quantity, unit_price, total,
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Get the total number of expense rows in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
#[cfg(test)]
pub(crate) fn count_expenses(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Map a database row to an [Expense].
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        product_id: row.get(2)?,
        category_id: row.get(3)?,
        vendor_id: row.get(4)?,
        date: row.get(5)?,
        quantity: row.get(6)?,
        unit_price: row.get(7)?,
        total: row.get(8)?,
    })
}
