//! Defines the endpoints for ingesting expenses.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    catalog::VendorName,
    user::get_user,
};

use super::{
    ingest::ingest_batch,
    models::{Expense, ExpenseItem},
};

/// One line item of an ingestion request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItemForm {
    /// The product's name.
    pub product_name: String,
    /// The product's brand, if any.
    #[serde(default)]
    pub brand: Option<String>,
    /// The name of the category to file the product under.
    pub category_name: String,
    /// How many units were bought.
    pub quantity: f64,
    /// The price paid per unit.
    pub unit_price: f64,
    /// Caller-computed total. Advisory only; the server recomputes the total
    /// from quantity and unit price and ignores a mismatching value.
    #[serde(default)]
    pub total_price: Option<f64>,
}

/// The form data for a multi-item ingestion batch.
#[derive(Debug, Deserialize)]
pub struct BatchForm {
    /// The vendor all items were bought at.
    pub vendor: String,
    /// The purchase date shared by all items.
    pub date: Date,
    /// The line items to ingest.
    pub items: Vec<ExpenseItemForm>,
}

/// The form data for ingesting a single expense.
#[derive(Debug, Deserialize)]
pub struct SingleExpenseForm {
    /// The vendor the item was bought at.
    pub vendor: String,
    /// The purchase date.
    pub date: Date,
    /// The single line item.
    #[serde(flatten)]
    pub item: ExpenseItemForm,
}

/// The response body for a successful batch ingestion.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// A human-readable summary of what was ingested.
    pub message: String,
    /// The created expense rows, with resolved identifiers.
    pub expenses: Vec<Expense>,
}

/// A route handler for atomically ingesting a batch of expenses.
///
/// All validation happens before the transaction opens; on any failure the
/// whole batch is rolled back and no expense rows become visible.
pub async fn ingest_batch_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(form): Json<BatchForm>,
) -> Response {
    let vendor_name = match VendorName::new(&form.vendor) {
        Ok(name) => name,
        Err(error) => return error.into_response(),
    };

    if form.items.is_empty() {
        return Error::EmptyBatch.into_response();
    }

    let items: Result<Vec<ExpenseItem>, Error> = form.items.iter().map(validate_item).collect();
    let items = match items {
        Ok(items) => items,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    if let Err(error) = get_user(user_id, &connection) {
        return error.into_response();
    }

    match ingest_batch(user_id, &vendor_name, form.date, &items, &connection) {
        Ok(expenses) => {
            log_ignored_totals(&form.items, &expenses);

            let message = format!(
                "Successfully added {} items for {}",
                expenses.len(),
                vendor_name
            );

            (StatusCode::CREATED, Json(BatchResponse { message, expenses })).into_response()
        }
        Err(error) => {
            tracing::error!("could not ingest batch for user {user_id}: {error}");
            error.into_response()
        }
    }
}

/// A route handler for ingesting a single expense, the degenerate one-item
/// batch.
pub async fn ingest_single_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(form): Json<SingleExpenseForm>,
) -> Response {
    let vendor_name = match VendorName::new(&form.vendor) {
        Ok(name) => name,
        Err(error) => return error.into_response(),
    };

    let item = match validate_item(&form.item) {
        Ok(item) => item,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    if let Err(error) = get_user(user_id, &connection) {
        return error.into_response();
    }

    match ingest_batch(user_id, &vendor_name, form.date, &[item], &connection) {
        Ok(mut expenses) => {
            log_ignored_totals(std::slice::from_ref(&form.item), &expenses);

            // A one-item batch yields exactly one row.
            match expenses.pop() {
                Some(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
                None => Error::NotFound.into_response(),
            }
        }
        Err(error) => {
            tracing::error!("could not ingest expense for user {user_id}: {error}");
            error.into_response()
        }
    }
}

fn validate_item(form: &ExpenseItemForm) -> Result<ExpenseItem, Error> {
    ExpenseItem::new(
        &form.product_name,
        form.brand.as_deref(),
        &form.category_name,
        form.quantity,
        form.unit_price,
    )
}

/// Note in the server log whenever a caller-supplied total disagreed with the
/// stored, recomputed one. Client-derived numbers are never trusted.
fn log_ignored_totals(forms: &[ExpenseItemForm], created: &[Expense]) {
    for (form, expense) in forms.iter().zip(created) {
        if let Some(supplied) = form.total_price
            && (supplied - expense.total).abs() > f64::EPSILON
        {
            tracing::debug!(
                "ignored caller-supplied total {supplied} for expense {}, stored {}",
                expense.id,
                expense.total
            );
        }
    }
}
