//! The atomic batch ingestion transaction.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use time::Date;

use crate::{
    Error,
    catalog::{VendorName, resolve_category, resolve_product, resolve_vendor},
    user::UserId,
};

use super::{db::insert_expense, models::{Expense, ExpenseItem}};

/// Atomically ingest a batch of expense line items for a single vendor and
/// date.
///
/// The vendor is resolved once and reused across all items. Per item the
/// category is resolved first (product creation needs a category reference),
/// then the product, then the expense row is inserted with a recomputed
/// total. The whole batch commits once; any failure rolls back every row,
/// including any catalog entities created earlier in the same batch. The
/// transaction guard rolls back on drop, so every exit path releases the
/// transaction.
///
/// Creating new category, vendor and product rows is an expected side effect
/// of ingestion, not an error.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyBatch] if `items` is empty (checked before the transaction
///   opens),
/// - [Error::CatalogConflict] if catalog resolution exhausts its retries
///   (the whole batch is safe to retry),
/// - or [Error::SqlError] for any other storage failure.
pub fn ingest_batch(
    user_id: UserId,
    vendor_name: &VendorName,
    date: Date,
    items: &[ExpenseItem],
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    if items.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let vendor_id = resolve_vendor(vendor_name, &transaction)?;

    let mut created = Vec::with_capacity(items.len());

    for item in items {
        let category_id = resolve_category(&item.category_name, &transaction)?;
        let product_id = resolve_product(
            &item.product_name,
            item.brand.as_deref(),
            category_id,
            &transaction,
        )?;

        created.push(insert_expense(
            user_id,
            &product_id,
            category_id,
            vendor_id,
            date,
            item.quantity,
            item.unit_price,
            &transaction,
        )?);
    }

    transaction.commit()?;

    tracing::debug!(
        "ingested {} expense rows for user {user_id} at vendor {vendor_id}",
        created.len()
    );

    Ok(created)
}
