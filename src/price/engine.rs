//! The price comparison engine.

use std::collections::HashMap;

use rusqlite::Connection;
use time::{Date, Duration};

use crate::{
    Error,
    user::{UserId, get_user_pincode},
};

use super::models::{
    AlternativeVendor, CheapestOption, MyPurchase, PriceReport, ProductComparison, Savings,
    SavingsSummary,
};

/// The analysis window used when the caller does not pick one.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// The widest analysis window the engine accepts. Callers are expected to
/// bound the window to keep the cross-user scan cost-bounded.
pub const MAX_WINDOW_DAYS: u32 = 365;

/// One purchase row as read from storage: product identity, vendor name,
/// price and date. Deliberately nothing about who made the purchase.
#[derive(Debug, Clone)]
struct PurchaseRow {
    product_name: String,
    brand: Option<String>,
    vendor: String,
    unit_price: f64,
    date: Date,
}

impl PurchaseRow {
    /// The case-insensitive (name, brand) matching key. The product's
    /// surrogate ID is never used for matching.
    fn product_key(&self) -> String {
        format!(
            "{}\u{1}{}",
            self.product_name.to_lowercase(),
            self.brand.as_deref().unwrap_or_default().to_lowercase()
        )
    }
}

/// Per-vendor aggregates for one product in one postal area.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct VendorGroup {
    pub(super) vendor: String,
    pub(super) min_unit_price: f64,
    pub(super) avg_unit_price: f64,
    pub(super) purchase_count: u32,
    pub(super) last_seen: Date,
}

/// Build the price comparison report for `user_id` over the trailing
/// `window_days` ending at `today`.
///
/// The requester's own purchases contribute to the vendor aggregates like
/// anyone else's; there is no self-exclusion. A requester with no purchases
/// in the window gets a valid empty report.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAnalysisWindow] if `window_days` is zero or larger than
///   [MAX_WINDOW_DAYS],
/// - [Error::NotFound] if `user_id` does not refer to a valid user,
/// - [Error::MissingPincode] if the requester has no postal code on file,
/// - or [Error::SqlError] if a query fails.
pub fn compare_prices(
    user_id: UserId,
    window_days: u32,
    today: Date,
    connection: &Connection,
) -> Result<PriceReport, Error> {
    if window_days == 0 || window_days > MAX_WINDOW_DAYS {
        return Err(Error::InvalidAnalysisWindow(window_days));
    }

    let pincode = get_user_pincode(user_id, connection)?.ok_or(Error::MissingPincode)?;

    let window_start = today - Duration::days(i64::from(window_days));

    let my_rows = my_purchases(user_id, window_start, today, connection)?;
    let area_rows = area_purchases(&pincode, window_start, today, connection)?;

    let offers = group_offers_by_product(&area_rows);

    let mut comparisons: Vec<ProductComparison> = Vec::new();

    for (key, row) in most_recent_per_product(&my_rows) {
        // The requester's own purchase is part of the area set, so a vendor
        // group always exists for their products.
        let Some(groups) = offers.get(&key) else {
            continue;
        };

        let ordered = order_vendor_groups(groups.clone());
        let (cheapest, alternatives) = match ordered.split_first() {
            Some(split) => split,
            None => continue,
        };

        let amount = (row.unit_price - cheapest.min_unit_price).max(0.0);
        let percentage = if row.unit_price > 0.0 {
            amount / row.unit_price * 100.0
        } else {
            0.0
        };

        comparisons.push(ProductComparison {
            product_name: row.product_name.clone(),
            brand: row.brand.clone(),
            my_purchase: MyPurchase {
                vendor: row.vendor.clone(),
                unit_price: row.unit_price,
                purchase_date: row.date,
            },
            cheapest_option: CheapestOption {
                vendor: cheapest.vendor.clone(),
                min_unit_price: cheapest.min_unit_price,
                avg_unit_price: cheapest.avg_unit_price,
                purchase_count: cheapest.purchase_count,
                last_seen: cheapest.last_seen,
            },
            savings: Savings {
                amount,
                percentage,
                is_best_deal: amount == 0.0,
            },
            alternative_vendors: alternatives
                .iter()
                .map(|group| AlternativeVendor {
                    vendor: group.vendor.clone(),
                    min_unit_price: group.min_unit_price,
                    avg_unit_price: group.avg_unit_price,
                    purchase_count: group.purchase_count,
                })
                .collect(),
        });
    }

    comparisons.sort_by(|a, b| {
        a.product_name
            .to_lowercase()
            .cmp(&b.product_name.to_lowercase())
            .then_with(|| a.brand.cmp(&b.brand))
    });

    let summary = SavingsSummary {
        items_at_best_price: comparisons
            .iter()
            .filter(|c| c.savings.is_best_deal)
            .count() as u32,
        items_with_cheaper_options: comparisons
            .iter()
            .filter(|c| c.savings.amount > 0.0)
            .count() as u32,
        total_potential_savings: comparisons.iter().map(|c| c.savings.amount).sum(),
    };

    Ok(PriceReport {
        pincode,
        analysis_period_days: window_days,
        total_products_analyzed: comparisons.len(),
        summary,
        comparisons,
    })
}

/// The requester's purchases in the window, most recent first.
fn my_purchases(
    user_id: UserId,
    window_start: Date,
    today: Date,
    connection: &Connection,
) -> Result<Vec<PurchaseRow>, Error> {
    connection
        .prepare(
            "SELECT p.name, p.brand, v.name, e.unit_price, e.date
             FROM expense e
             INNER JOIN product p ON p.id = e.product_id
             INNER JOIN vendor v ON v.id = e.vendor_id
             WHERE e.user_id = :user_id AND e.date >= :start AND e.date <= :end
             ORDER BY e.date DESC, e.id DESC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":start": window_start,
                ":end": today,
            },
            map_purchase_row,
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Every purchase made in the postal area in the window, across all users.
///
/// Only the product identity, vendor name, price and date are selected; the
/// purchaser never leaves the query.
fn area_purchases(
    pincode: &str,
    window_start: Date,
    today: Date,
    connection: &Connection,
) -> Result<Vec<PurchaseRow>, Error> {
    connection
        .prepare(
            "SELECT p.name, p.brand, v.name, e.unit_price, e.date
             FROM expense e
             INNER JOIN user u ON u.id = e.user_id
             INNER JOIN product p ON p.id = e.product_id
             INNER JOIN vendor v ON v.id = e.vendor_id
             WHERE u.pincode = :pincode AND e.date >= :start AND e.date <= :end",
        )?
        .query_map(
            rusqlite::named_params! {
                ":pincode": pincode,
                ":start": window_start,
                ":end": today,
            },
            map_purchase_row,
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

fn map_purchase_row(row: &rusqlite::Row) -> Result<PurchaseRow, rusqlite::Error> {
    Ok(PurchaseRow {
        product_name: row.get(0)?,
        brand: row.get(1)?,
        vendor: row.get(2)?,
        unit_price: row.get(3)?,
        date: row.get(4)?,
    })
}

/// Keep the first (most recent) purchase per product key. `rows` must
/// already be ordered most recent first.
fn most_recent_per_product(rows: &[PurchaseRow]) -> Vec<(String, &PurchaseRow)> {
    let mut seen: Vec<(String, &PurchaseRow)> = Vec::new();

    for row in rows {
        let key = row.product_key();
        if !seen.iter().any(|(existing, _)| *existing == key) {
            seen.push((key, row));
        }
    }

    seen
}

/// Fold raw purchase rows into per-product, per-vendor aggregate groups.
fn group_offers_by_product(rows: &[PurchaseRow]) -> HashMap<String, Vec<VendorGroup>> {
    let mut offers: HashMap<String, Vec<VendorGroup>> = HashMap::new();
    let mut sums: HashMap<(String, String), f64> = HashMap::new();

    for row in rows {
        let key = row.product_key();
        let groups = offers.entry(key.clone()).or_default();

        match groups.iter_mut().find(|group| group.vendor == row.vendor) {
            Some(group) => {
                group.min_unit_price = group.min_unit_price.min(row.unit_price);
                group.purchase_count += 1;
                group.last_seen = group.last_seen.max(row.date);
            }
            None => groups.push(VendorGroup {
                vendor: row.vendor.clone(),
                min_unit_price: row.unit_price,
                avg_unit_price: 0.0,
                purchase_count: 1,
                last_seen: row.date,
            }),
        }

        *sums.entry((key, row.vendor.clone())).or_insert(0.0) += row.unit_price;
    }

    for (key, groups) in offers.iter_mut() {
        for group in groups {
            let sum = sums[&(key.clone(), group.vendor.clone())];
            group.avg_unit_price = sum / f64::from(group.purchase_count);
        }
    }

    offers
}

/// Order vendor groups cheapest first: by minimum unit price, then average
/// unit price, then vendor name, so ties resolve deterministically.
pub(super) fn order_vendor_groups(mut groups: Vec<VendorGroup>) -> Vec<VendorGroup> {
    groups.sort_by(|a, b| {
        a.min_unit_price
            .partial_cmp(&b.min_unit_price)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.avg_unit_price
                    .partial_cmp(&b.avg_unit_price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.vendor.cmp(&b.vendor))
    });

    groups
}


#[cfg(test)]
mod engine_tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        Error,
        catalog::VendorName,
        db::initialize,
        expense::{ExpenseItem, ingest_batch},
        user::{UserId, UserRole, create_user, update_user_location},
    };

    use super::compare_prices;

    const TODAY: Date = date!(2025 - 06 - 30);

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn user_with_pincode(conn: &Connection, contact: &str, pincode: &str) -> UserId {
        let user = create_user("Someone", contact, UserRole::Customer, conn).unwrap();
        update_user_location(user.id, pincode, None, None, conn).unwrap();
        user.id
    }

    fn buy(
        conn: &Connection,
        user_id: UserId,
        vendor: &str,
        product: &str,
        date: Date,
        unit_price: f64,
    ) {
        ingest_batch(
            user_id,
            &VendorName::new_unchecked(vendor),
            date,
            &[ExpenseItem::new(product, None, "Groceries", 1.0, unit_price).unwrap()],
            conn,
        )
        .unwrap();
    }

    #[test]
    fn finds_cheaper_vendor_in_same_pincode() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");
        let user_b = user_with_pincode(&conn, "b@example.com", "560001");

        buy(&conn, user_a, "VendorX", "Milk", date!(2025 - 06 - 20), 50.0);
        buy(&conn, user_b, "VendorY", "Milk", date!(2025 - 06 - 22), 45.0);

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();

        assert_eq!(report.pincode, "560001");
        assert_eq!(report.total_products_analyzed, 1);

        let comparison = &report.comparisons[0];
        assert_eq!(comparison.my_purchase.vendor, "VendorX");
        assert_eq!(comparison.my_purchase.unit_price, 50.0);
        assert_eq!(comparison.cheapest_option.vendor, "VendorY");
        assert_eq!(comparison.cheapest_option.min_unit_price, 45.0);
        assert_eq!(comparison.savings.amount, 5.0);
        assert_eq!(comparison.savings.percentage, 10.0);
        assert!(!comparison.savings.is_best_deal);

        assert_eq!(report.summary.items_at_best_price, 0);
        assert_eq!(report.summary.items_with_cheaper_options, 1);
        assert_eq!(report.summary.total_potential_savings, 5.0);
    }

    #[test]
    fn requester_at_best_price_is_a_best_deal() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");
        let user_b = user_with_pincode(&conn, "b@example.com", "560001");

        buy(&conn, user_a, "VendorX", "Milk", date!(2025 - 06 - 20), 42.0);
        buy(&conn, user_b, "VendorY", "Milk", date!(2025 - 06 - 22), 45.0);

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();

        let comparison = &report.comparisons[0];
        assert_eq!(comparison.savings.amount, 0.0);
        assert!(comparison.savings.is_best_deal);
        assert_eq!(report.summary.items_at_best_price, 1);
        assert_eq!(report.summary.items_with_cheaper_options, 0);
    }

    #[test]
    fn cheapest_minimum_is_never_above_any_alternative() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");
        let user_b = user_with_pincode(&conn, "b@example.com", "560001");
        let user_c = user_with_pincode(&conn, "c@example.com", "560001");

        buy(&conn, user_a, "VendorX", "Milk", date!(2025 - 06 - 20), 50.0);
        buy(&conn, user_b, "VendorY", "Milk", date!(2025 - 06 - 21), 45.0);
        buy(&conn, user_c, "VendorZ", "Milk", date!(2025 - 06 - 22), 48.0);
        buy(&conn, user_c, "VendorZ", "Milk", date!(2025 - 06 - 23), 44.0);

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();
        let comparison = &report.comparisons[0];

        assert_eq!(comparison.cheapest_option.vendor, "VendorZ");
        for alternative in &comparison.alternative_vendors {
            assert!(comparison.cheapest_option.min_unit_price <= alternative.min_unit_price);
        }
    }

    #[test]
    fn alternatives_are_sorted_by_minimum_price() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");
        let user_b = user_with_pincode(&conn, "b@example.com", "560001");

        buy(&conn, user_a, "VendorX", "Milk", date!(2025 - 06 - 20), 50.0);
        buy(&conn, user_b, "VendorY", "Milk", date!(2025 - 06 - 21), 45.0);
        buy(&conn, user_b, "VendorZ", "Milk", date!(2025 - 06 - 22), 47.0);

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();
        let comparison = &report.comparisons[0];

        assert_eq!(comparison.cheapest_option.vendor, "VendorY");
        assert_eq!(comparison.alternative_vendors.len(), 2);
        assert_eq!(comparison.alternative_vendors[0].vendor, "VendorZ");
        assert_eq!(comparison.alternative_vendors[1].vendor, "VendorX");
    }

    #[test]
    fn purchases_in_other_pincodes_are_invisible() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");
        let far_away = user_with_pincode(&conn, "far@example.com", "110001");

        buy(&conn, user_a, "VendorX", "Milk", date!(2025 - 06 - 20), 50.0);
        buy(&conn, far_away, "VendorY", "Milk", date!(2025 - 06 - 22), 10.0);

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();
        let comparison = &report.comparisons[0];

        assert_eq!(comparison.cheapest_option.vendor, "VendorX");
        assert!(comparison.savings.is_best_deal);
    }

    #[test]
    fn purchases_outside_the_window_are_ignored() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");
        let user_b = user_with_pincode(&conn, "b@example.com", "560001");

        buy(&conn, user_a, "VendorX", "Milk", date!(2025 - 06 - 20), 50.0);
        // Cheap, but too long ago.
        buy(&conn, user_b, "VendorY", "Milk", date!(2025 - 01 - 05), 30.0);

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();
        let comparison = &report.comparisons[0];

        assert_eq!(comparison.cheapest_option.vendor, "VendorX");
    }

    #[test]
    fn most_recent_own_purchase_wins_per_product() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");

        buy(&conn, user_a, "VendorX", "Milk", date!(2025 - 06 - 10), 50.0);
        buy(&conn, user_a, "VendorY", "Milk", date!(2025 - 06 - 25), 46.0);

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();

        assert_eq!(report.total_products_analyzed, 1);
        let comparison = &report.comparisons[0];
        assert_eq!(comparison.my_purchase.vendor, "VendorY");
        assert_eq!(comparison.my_purchase.unit_price, 46.0);
    }

    #[test]
    fn vendor_aggregates_cover_min_avg_count_and_last_seen() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");
        let user_b = user_with_pincode(&conn, "b@example.com", "560001");

        buy(&conn, user_a, "VendorX", "Milk", date!(2025 - 06 - 20), 50.0);
        buy(&conn, user_b, "VendorX", "Milk", date!(2025 - 06 - 22), 40.0);

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();
        let cheapest = &report.comparisons[0].cheapest_option;

        assert_eq!(cheapest.vendor, "VendorX");
        assert_eq!(cheapest.min_unit_price, 40.0);
        assert_eq!(cheapest.avg_unit_price, 45.0);
        assert_eq!(cheapest.purchase_count, 2);
        assert_eq!(cheapest.last_seen, date!(2025 - 06 - 22));
    }

    #[test]
    fn missing_pincode_is_an_error() {
        let conn = get_test_connection();
        let user = create_user("Asha", "a@example.com", UserRole::Customer, &conn).unwrap();

        let result = compare_prices(user.id, 30, TODAY, &conn);

        assert_eq!(result, Err(Error::MissingPincode));
    }

    #[test]
    fn unknown_user_is_not_found() {
        let conn = get_test_connection();

        let result = compare_prices(404, 30, TODAY, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn no_purchases_in_window_yields_empty_report() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");

        let report = compare_prices(user_a, 30, TODAY, &conn).unwrap();

        assert_eq!(report.total_products_analyzed, 0);
        assert!(report.comparisons.is_empty());
        assert_eq!(report.summary.total_potential_savings, 0.0);
    }

    #[test]
    fn zero_or_oversized_windows_are_rejected() {
        let conn = get_test_connection();
        let user_a = user_with_pincode(&conn, "a@example.com", "560001");

        assert_eq!(
            compare_prices(user_a, 0, TODAY, &conn),
            Err(Error::InvalidAnalysisWindow(0))
        );
        assert_eq!(
            compare_prices(user_a, 366, TODAY, &conn),
            Err(Error::InvalidAnalysisWindow(366))
        );
    }
}
