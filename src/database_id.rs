//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Database identifier for a category.
pub type CategoryId = DatabaseId;

/// Database identifier for a vendor.
pub type VendorId = DatabaseId;

/// Database identifier for an expense.
pub type ExpenseId = DatabaseId;

/// Surrogate identifier for a product.
///
/// Generated from a name prefix, a timestamp and a hash suffix. It is not
/// semantically meaningful and must never be used as a matching key; product
/// identity is the case-insensitive (name, brand) pair.
pub type ProductId = String;
