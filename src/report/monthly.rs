//! The monthly spending summary, grouped by category.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    database_id::{CategoryId, ExpenseId},
    user::UserId,
};

use super::period::ReportPeriod;

/// A user's spending for one calendar month, grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// The month the summary covers.
    pub period: ReportPeriod,
    /// The grand total spent across all categories.
    pub overall_total: f64,
    /// Per-category breakdowns, ordered by total spent descending.
    pub spending_by_category: Vec<CategorySpending>,
}

/// One category's share of a monthly summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    /// The ID of the category.
    pub category_id: CategoryId,
    /// The category's name.
    pub category_name: String,
    /// The total spent in this category over the month.
    pub total_spent: f64,
    /// How many expenses contributed to the total.
    pub transaction_count: u32,
    /// The contributing expenses, ordered by date descending.
    pub expenses: Vec<ExpenseSummaryLine>,
}

/// The details of one expense inside a category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSummaryLine {
    /// The ID of the expense.
    pub expense_id: ExpenseId,
    /// When the purchase happened.
    pub expense_date: Date,
    /// The name of the purchased product.
    pub product_name: String,
    /// The total paid.
    pub total: f64,
}

/// Compute a user's monthly spending summary.
///
/// Covers the half-open interval from the first of the month to the first of
/// the next month. A month with no expenses yields a zero grand total and an
/// empty category list, not an error.
///
/// # Errors
/// This function will return an [Error::SqlError] if the query fails.
pub fn monthly_summary(
    user_id: UserId,
    period: ReportPeriod,
    connection: &Connection,
) -> Result<MonthlySummary, Error> {
    // Rows arrive ordered by date descending, so each category's expense
    // list is already in presentation order as it is folded together.
    let rows = connection
        .prepare(
            "SELECT e.id, e.date, e.total, p.name, c.id, c.name
             FROM expense e
             INNER JOIN product p ON p.id = e.product_id
             INNER JOIN category c ON c.id = e.category_id
             WHERE e.user_id = :user_id AND e.date >= :start AND e.date < :end
             ORDER BY e.date DESC, e.id DESC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":start": period.start(),
                ":end": period.end_exclusive(),
            },
            |row| {
                let line = ExpenseSummaryLine {
                    expense_id: row.get(0)?,
                    expense_date: row.get(1)?,
                    product_name: row.get(3)?,
                    total: row.get(2)?,
                };
                let category_id: CategoryId = row.get(4)?;
                let category_name: String = row.get(5)?;

                Ok((category_id, category_name, line))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let mut categories: Vec<CategorySpending> = Vec::new();
    let mut index_by_category: HashMap<CategoryId, usize> = HashMap::new();
    let mut overall_total = 0.0;

    for (category_id, category_name, line) in rows {
        overall_total += line.total;

        let index = *index_by_category.entry(category_id).or_insert_with(|| {
            categories.push(CategorySpending {
                category_id,
                category_name,
                total_spent: 0.0,
                transaction_count: 0,
                expenses: Vec::new(),
            });
            categories.len() - 1
        });

        let category = &mut categories[index];
        category.total_spent += line.total;
        category.transaction_count += 1;
        category.expenses.push(line);
    }

    categories.sort_by(|a, b| {
        b.total_spent
            .partial_cmp(&a.total_spent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    Ok(MonthlySummary {
        period,
        overall_total,
        spending_by_category: categories,
    })
}
