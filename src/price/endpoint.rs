//! Defines the endpoint serving the price comparison report.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{AppState, Error, auth::AuthenticatedUser};

use super::engine::{DEFAULT_WINDOW_DAYS, compare_prices};

/// The query parameters for the price comparison endpoint.
#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    /// How many trailing days to analyze. Defaults to
    /// [DEFAULT_WINDOW_DAYS](super::DEFAULT_WINDOW_DAYS).
    #[serde(default)]
    pub days: Option<u32>,
}

/// A route handler for the pincode-scoped price comparison report.
pub async fn compare_prices_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<PriceQuery>,
) -> Response {
    let window_days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let today = OffsetDateTime::now_utc().date();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match compare_prices(user_id, window_days, today, &connection) {
        Ok(report) => Json(report).into_response(),
        Err(error) => {
            tracing::error!("could not compare prices for user {user_id}: {error}");
            error.into_response()
        }
    }
}
