//! Defines the core data models for expenses.

use serde::Serialize;
use time::Date;

use crate::{
    Error,
    catalog::{CategoryName, ProductName, normalize_brand},
    database_id::{CategoryId, ExpenseId, ProductId, VendorId},
    user::UserId,
};

/// A persisted expense row: one purchase of one product.
///
/// Expenses are immutable and append-only; there is no update or delete
/// operation. The category is a denormalized copy of the product's category
/// at write time, kept on the row so report queries avoid a join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The ID of the user the expense belongs to.
    pub user_id: UserId,
    /// The surrogate ID of the purchased product.
    pub product_id: ProductId,
    /// The ID of the product's category at write time.
    pub category_id: CategoryId,
    /// The ID of the vendor the purchase was made at.
    pub vendor_id: VendorId,
    /// When the purchase happened.
    pub date: Date,
    /// How many units were bought.
    pub quantity: f64,
    /// The price paid per unit.
    pub unit_price: f64,
    /// The total paid. Always `quantity * unit_price`; the engine recomputes
    /// this at write time and ignores caller-supplied totals.
    pub total: f64,
}

/// One validated line item of an ingestion batch.
///
/// To construct one from free-text caller input, use [ExpenseItem::new],
/// which performs all field validation up front so a batch can be rejected
/// before any transaction opens.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseItem {
    /// The product's name.
    pub product_name: ProductName,
    /// The product's brand, absent if blank.
    pub brand: Option<String>,
    /// The name of the category to file the product under.
    pub category_name: CategoryName,
    /// How many units were bought. Always greater than zero.
    pub quantity: f64,
    /// The price paid per unit. Never negative.
    pub unit_price: f64,
}

impl ExpenseItem {
    /// Validate free-text item fields into an [ExpenseItem].
    ///
    /// Any total supplied by the caller is advisory and deliberately not a
    /// parameter here; totals are recomputed at write time.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyProductName] or [Error::EmptyCategoryName] if a name is
    ///   empty or whitespace-only,
    /// - [Error::InvalidQuantity] if `quantity` is zero, negative or not finite,
    /// - or [Error::InvalidUnitPrice] if `unit_price` is negative or not finite.
    pub fn new(
        product_name: &str,
        brand: Option<&str>,
        category_name: &str,
        quantity: f64,
        unit_price: f64,
    ) -> Result<Self, Error> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(Error::InvalidQuantity(quantity));
        }

        if !unit_price.is_finite() || unit_price < 0.0 {
            return Err(Error::InvalidUnitPrice(unit_price));
        }

        Ok(Self {
            product_name: ProductName::new(product_name)?,
            brand: normalize_brand(brand),
            category_name: CategoryName::new(category_name)?,
            quantity,
            unit_price,
        })
    }
}
