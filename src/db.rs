//! Database initialization for the application's domain models.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    catalog::{create_category_table, create_product_table, create_vendor_table},
    expense::create_expense_table,
    user::create_user_table,
};

/// Create the tables for all domain models.
///
/// Tables are created inside a single exclusive transaction so that a
/// half-initialized schema is never visible to other connections.
///
/// # Errors
/// Returns an [Error::SqlError] if any table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_vendor_table(&transaction)?;
    create_product_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
