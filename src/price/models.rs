//! The wire types of the price intelligence report.

use serde::Serialize;
use time::Date;

/// The full price comparison report for one requester.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceReport {
    /// The postal area the comparison was scoped to.
    pub pincode: String,
    /// How many trailing days of purchases were analyzed.
    pub analysis_period_days: u32,
    /// How many distinct products of the requester's were analyzed.
    pub total_products_analyzed: usize,
    /// Aggregate savings statistics across all analyzed products.
    pub summary: SavingsSummary,
    /// One comparison per product, ordered by product name.
    pub comparisons: Vec<ProductComparison>,
}

/// Aggregate statistics across all analyzed products.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsSummary {
    /// How many products the requester already buys at the best local price.
    pub items_at_best_price: u32,
    /// How many products have a strictly cheaper local alternative.
    pub items_with_cheaper_options: u32,
    /// The sum of positive savings across all analyzed products.
    pub total_potential_savings: f64,
}

/// The local price landscape for one product the requester bought.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductComparison {
    /// The product's name.
    pub product_name: String,
    /// The product's brand, if any.
    pub brand: Option<String>,
    /// The requester's own most recent purchase of this product.
    pub my_purchase: MyPurchase,
    /// The vendor with the lowest unit price in the area.
    pub cheapest_option: CheapestOption,
    /// What switching to the cheapest vendor would save.
    pub savings: Savings,
    /// Every other local vendor, ordered by minimum unit price ascending.
    pub alternative_vendors: Vec<AlternativeVendor>,
}

/// The requester's own most recent purchase of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MyPurchase {
    /// The vendor the requester bought from.
    pub vendor: String,
    /// The unit price the requester paid.
    pub unit_price: f64,
    /// When the requester bought it.
    pub purchase_date: Date,
}

/// The cheapest local vendor for a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheapestOption {
    /// The vendor's name.
    pub vendor: String,
    /// The lowest unit price seen at this vendor in the window.
    pub min_unit_price: f64,
    /// The average unit price across all purchases at this vendor.
    pub avg_unit_price: f64,
    /// How many purchases the aggregates are based on.
    pub purchase_count: u32,
    /// The most recent purchase date at this vendor.
    pub last_seen: Date,
}

/// A local vendor other than the cheapest one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeVendor {
    /// The vendor's name.
    pub vendor: String,
    /// The lowest unit price seen at this vendor in the window.
    pub min_unit_price: f64,
    /// The average unit price across all purchases at this vendor.
    pub avg_unit_price: f64,
    /// How many purchases the aggregates are based on.
    pub purchase_count: u32,
}

/// What switching to the cheapest vendor would save the requester.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Savings {
    /// `max(0, my price - cheapest min price)`. Never negative.
    pub amount: f64,
    /// The amount as a percentage of the requester's own price.
    pub percentage: f64,
    /// Whether the requester already pays the best local price.
    /// True exactly when `amount` is zero.
    pub is_best_deal: bool,
}
