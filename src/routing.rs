//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;

use crate::{
    AppState, endpoints,
    expense::{ingest_batch_endpoint, ingest_single_endpoint},
    price::compare_prices_endpoint,
    report::{
        calendar_rollup_endpoint, category_comparison_endpoint, monthly_summary_endpoint,
    },
    user::{create_user_endpoint, update_location_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::USERS, post(create_user_endpoint))
        .route(endpoints::USER_LOCATION, put(update_location_endpoint))
        .route(endpoints::EXPENSES, post(ingest_single_endpoint))
        .route(endpoints::EXPENSES_BATCH, post(ingest_batch_endpoint))
        .route(endpoints::REPORT_SUMMARY, get(monthly_summary_endpoint))
        .route(endpoints::REPORT_CALENDAR, get(calendar_rollup_endpoint))
        .route(
            endpoints::REPORT_COMPARISON,
            get(category_comparison_endpoint),
        )
        .route(endpoints::PRICE_COMPARISON, get(compare_prices_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The JSON body served for routes that do not exist.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "The requested resource could not be found." })),
    )
        .into_response()
}
