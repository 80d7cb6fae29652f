//! The API endpoint URIs.

/// The route for materializing a user profile at signup.
pub const USERS: &str = "/api/users";
/// The route for refreshing the authenticated user's pincode and location.
pub const USER_LOCATION: &str = "/api/users/location";
/// The route for ingesting a single expense.
pub const EXPENSES: &str = "/api/expenses";
/// The route for atomically ingesting a multi-item expense batch.
pub const EXPENSES_BATCH: &str = "/api/expenses/batch";
/// The route for the monthly spending summary.
pub const REPORT_SUMMARY: &str = "/api/reports/summary";
/// The route for the per-day calendar rollup.
pub const REPORT_CALENDAR: &str = "/api/reports/calendar";
/// The route for the category-versus-historical-average report.
pub const REPORT_COMPARISON: &str = "/api/reports/monthly-category-comparison";
/// The route for the pincode-scoped price comparison report.
pub const PRICE_COMPARISON: &str = "/api/price-comparison";
