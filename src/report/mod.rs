//! Read-only period aggregation reports: monthly category summaries, daily
//! calendar rollups and trailing-window category averages.
//!
//! Every report returns a well-formed empty result when the user has no
//! qualifying expenses; an empty month is not an error.

mod calendar;
mod comparison;
mod endpoints;
mod monthly;
mod period;

pub use calendar::{CalendarRollup, calendar_rollup};
pub use comparison::{
    BASELINE_WINDOW_MONTHS, CategoryComparison, ComparisonReport, category_comparison,
};
pub use endpoints::{
    calendar_rollup_endpoint, category_comparison_endpoint, monthly_summary_endpoint,
};
pub use monthly::{CategorySpending, ExpenseSummaryLine, MonthlySummary, monthly_summary};
pub use period::ReportPeriod;
