//! Defines the endpoints serving period aggregation reports.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{AppState, Error, auth::AuthenticatedUser};

use super::{
    calendar::calendar_rollup, comparison::category_comparison, monthly::monthly_summary,
    period::ReportPeriod,
};

/// The query parameters shared by all period reports.
///
/// Both parameters must be given to select an explicit month; otherwise the
/// report defaults to the current calendar month.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// The report year, e.g. 2025.
    #[serde(default)]
    pub year: Option<i32>,
    /// The 1-based report month.
    #[serde(default)]
    pub month: Option<u8>,
}

impl PeriodQuery {
    fn resolve(&self) -> Result<ReportPeriod, Error> {
        let today = OffsetDateTime::now_utc().date();
        ReportPeriod::from_query(self.year, self.month, today)
    }
}

/// A route handler for the monthly spending summary.
pub async fn monthly_summary_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let period = match query.resolve() {
        Ok(period) => period,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match monthly_summary(user_id, period, &connection) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => {
            tracing::error!("could not build monthly summary for user {user_id}: {error}");
            error.into_response()
        }
    }
}

/// A route handler for the per-day calendar rollup.
pub async fn calendar_rollup_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let period = match query.resolve() {
        Ok(period) => period,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match calendar_rollup(user_id, period, &connection) {
        Ok(rollup) => Json(rollup).into_response(),
        Err(error) => {
            tracing::error!("could not build calendar rollup for user {user_id}: {error}");
            error.into_response()
        }
    }
}

/// A route handler for the category-versus-historical-average report.
pub async fn category_comparison_endpoint(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let period = match query.resolve() {
        Ok(period) => period,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match category_comparison(user_id, period, &connection) {
        Ok(report) => Json(report).into_response(),
        Err(error) => {
            tracing::error!("could not build category comparison for user {user_id}: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{AppState, auth::AuthenticatedUser};

    use super::{PeriodQuery, monthly_summary_endpoint};

    #[tokio::test]
    async fn invalid_month_is_rejected() {
        let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();

        let response = monthly_summary_endpoint(
            State(state),
            AuthenticatedUser(1),
            Query(PeriodQuery {
                year: Some(2025),
                month: Some(13),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_month_returns_ok_with_empty_summary() {
        let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();

        let response = monthly_summary_endpoint(
            State(state),
            AuthenticatedUser(1),
            Query(PeriodQuery {
                year: Some(2025),
                month: Some(6),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
