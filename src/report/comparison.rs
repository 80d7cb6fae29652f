//! Current-month spending per category compared against the trailing
//! historical average.

use std::collections::{BTreeMap, HashMap};

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, user::UserId};

use super::period::ReportPeriod;

/// How many full calendar months feed the historical baseline.
///
/// The current month is deliberately excluded from its own baseline: it is
/// still accumulating, and including it would drag the average toward the
/// month being judged. Months inside the window with no spending count as
/// zero.
pub const BASELINE_WINDOW_MONTHS: u32 = 12;

/// One category's current spending paired with its historical average.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryComparison {
    /// The category's name.
    pub category: String,
    /// The total spent in the current report month.
    pub current_month: f64,
    /// The mean of per-calendar-month totals over the trailing window.
    pub average: f64,
    /// How many expenses contributed to the current month's total.
    pub transaction_count: u32,
    /// `current_month - average`. Positive means spending above the norm.
    pub difference: f64,
    /// The difference as a percentage of the average.
    pub percentage_change: f64,
}

/// The category-versus-average report for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// The month the comparisons are computed for.
    pub period: ReportPeriod,
    /// Per-category comparisons, ordered by current-month total descending.
    pub data: Vec<CategoryComparison>,
}

/// Compare a user's current-month spending per category against the mean of
/// the trailing [BASELINE_WINDOW_MONTHS] full months.
///
/// Categories that appear in either the current month or the baseline are
/// included; a side with no spending contributes zero.
///
/// # Errors
/// This function will return an [Error::SqlError] if a query fails.
pub fn category_comparison(
    user_id: UserId,
    period: ReportPeriod,
    connection: &Connection,
) -> Result<ComparisonReport, Error> {
    let current = current_month_totals(user_id, period, connection)?;
    let baseline_sums = baseline_totals(user_id, period, connection)?;

    let mut names: Vec<&String> = current.keys().chain(baseline_sums.keys()).collect();
    names.sort();
    names.dedup();

    let mut data: Vec<CategoryComparison> = names
        .into_iter()
        .map(|name| {
            let (current_month, transaction_count) =
                current.get(name).copied().unwrap_or((0.0, 0));
            let average =
                baseline_sums.get(name).copied().unwrap_or(0.0) / f64::from(BASELINE_WINDOW_MONTHS);
            let difference = current_month - average;
            let percentage_change = if average > 0.0 {
                difference / average * 100.0
            } else if current_month > 0.0 {
                100.0
            } else {
                0.0
            };

            CategoryComparison {
                category: name.clone(),
                current_month,
                average,
                transaction_count,
                difference,
                percentage_change,
            }
        })
        .collect();

    data.sort_by(|a, b| {
        b.current_month
            .partial_cmp(&a.current_month)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(ComparisonReport { period, data })
}

/// Per-category totals and counts for the report month itself.
fn current_month_totals(
    user_id: UserId,
    period: ReportPeriod,
    connection: &Connection,
) -> Result<BTreeMap<String, (f64, u32)>, Error> {
    connection
        .prepare(
            "SELECT c.name, SUM(e.total), COUNT(e.id)
             FROM expense e
             INNER JOIN category c ON c.id = e.category_id
             WHERE e.user_id = :user_id AND e.date >= :start AND e.date < :end
             GROUP BY c.id",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":start": period.start(),
                ":end": period.end_exclusive(),
            },
            |row| Ok((row.get::<_, String>(0)?, (row.get(1)?, row.get(2)?))),
        )?
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map_err(|error| error.into())
}

/// Per-category totals summed over the trailing window, which ends right
/// before the report month starts.
fn baseline_totals(
    user_id: UserId,
    period: ReportPeriod,
    connection: &Connection,
) -> Result<HashMap<String, f64>, Error> {
    let window_start = period.months_back(BASELINE_WINDOW_MONTHS).start();

    connection
        .prepare(
            "SELECT c.name, SUM(e.total)
             FROM expense e
             INNER JOIN category c ON c.id = e.category_id
             WHERE e.user_id = :user_id AND e.date >= :start AND e.date < :end
             GROUP BY c.id",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":start": window_start,
                ":end": period.start(),
            },
            |row| Ok((row.get::<_, String>(0)?, row.get(1)?)),
        )?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        catalog::VendorName,
        db::initialize,
        expense::{ExpenseItem, ingest_batch},
        report::ReportPeriod,
        user::{UserRole, create_user},
    };

    use super::category_comparison;

    fn get_test_connection() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_user("Asha", "asha@example.com", UserRole::Customer, &conn)
            .unwrap()
            .id;
        (conn, user_id)
    }

    fn spend(conn: &Connection, user_id: i64, date: time::Date, amount: f64) {
        ingest_batch(
            user_id,
            &VendorName::new_unchecked("FreshMart"),
            date,
            &[ExpenseItem::new("Milk", None, "Dairy", 1.0, amount).unwrap()],
            conn,
        )
        .unwrap();
    }

    #[test]
    fn average_spans_the_trailing_twelve_months() {
        let (conn, user_id) = get_test_connection();

        // 1200 spread over the 12 baseline months: average 100 per month.
        for month in 1..=12 {
            spend(
                &conn,
                user_id,
                date!(2024 - 06 - 15).replace_month(time::Month::try_from(month).unwrap()).unwrap(),
                100.0,
            );
        }
        // Current month.
        spend(&conn, user_id, date!(2025 - 01 - 10), 150.0);

        let report =
            category_comparison(user_id, ReportPeriod::new(2025, 1).unwrap(), &conn).unwrap();

        assert_eq!(report.data.len(), 1);
        let dairy = &report.data[0];
        assert_eq!(dairy.category, "Dairy");
        assert_eq!(dairy.current_month, 150.0);
        assert_eq!(dairy.average, 100.0);
        assert_eq!(dairy.difference, 50.0);
        assert_eq!(dairy.percentage_change, 50.0);
        assert_eq!(dairy.transaction_count, 1);
    }

    #[test]
    fn current_month_does_not_bias_its_own_baseline() {
        let (conn, user_id) = get_test_connection();

        // Only the current month has data; the baseline must stay zero.
        spend(&conn, user_id, date!(2025 - 06 - 10), 500.0);

        let report =
            category_comparison(user_id, ReportPeriod::new(2025, 6).unwrap(), &conn).unwrap();

        let dairy = &report.data[0];
        assert_eq!(dairy.average, 0.0);
        assert_eq!(dairy.difference, 500.0);
        assert_eq!(dairy.percentage_change, 100.0);
    }

    #[test]
    fn quiet_months_count_as_zero_in_the_average() {
        let (conn, user_id) = get_test_connection();

        // A single baseline month with 120 spread over a 12-month window.
        spend(&conn, user_id, date!(2025 - 03 - 15), 120.0);

        let report =
            category_comparison(user_id, ReportPeriod::new(2025, 6).unwrap(), &conn).unwrap();

        let dairy = &report.data[0];
        assert_eq!(dairy.current_month, 0.0);
        assert_eq!(dairy.average, 10.0);
        assert_eq!(dairy.difference, -10.0);
    }

    #[test]
    fn spending_older_than_the_window_is_ignored() {
        let (conn, user_id) = get_test_connection();

        spend(&conn, user_id, date!(2024 - 05 - 15), 9999.0);
        spend(&conn, user_id, date!(2025 - 06 - 10), 100.0);

        let report =
            category_comparison(user_id, ReportPeriod::new(2025, 6).unwrap(), &conn).unwrap();

        let dairy = &report.data[0];
        assert_eq!(dairy.average, 0.0, "May 2024 is outside the June 2025 window");
    }

    #[test]
    fn empty_history_yields_empty_report() {
        let (conn, user_id) = get_test_connection();

        let report =
            category_comparison(user_id, ReportPeriod::new(2025, 6).unwrap(), &conn).unwrap();

        assert!(report.data.is_empty());
    }
}
