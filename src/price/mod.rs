//! Cross-user, pincode-scoped price intelligence.
//!
//! For each product the requester recently bought, the engine aggregates
//! what every user in the same postal area paid for the same product,
//! surfaces the cheapest local vendor and quantifies the potential savings.
//!
//! Only vendor names and numeric aggregates ever cross the user boundary;
//! no other user's identity, contact or individual purchase rows are
//! exposed.

mod endpoint;
mod engine;
mod models;

pub use endpoint::compare_prices_endpoint;
pub use engine::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS, compare_prices};
pub use models::{
    AlternativeVendor, CheapestOption, MyPurchase, PriceReport, ProductComparison, Savings,
    SavingsSummary,
};
