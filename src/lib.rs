//! Spendscope is a shared expense ledger with local price intelligence.
//!
//! Users log purchases; the service normalizes free-text catalog data
//! (category, product, vendor) into stable entities, persists expenses
//! transactionally, and produces aggregate spending reports, including a
//! cross-user comparison of what other people in the same postal area paid
//! for the same products.
//!
//! This library provides a JSON REST API. Authentication is handled by an
//! upstream gateway which injects the verified user ID into each request.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod auth;
mod catalog;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod logging;
mod price;
mod report;
mod routing;
mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use user::{User, UserId, UserRole};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used as a user's display name.
    #[error("user name cannot be empty")]
    EmptyUserName,

    /// An empty string was used as a user's contact handle.
    #[error("contact cannot be empty")]
    EmptyContact,

    /// An empty string was used as a pincode.
    #[error("pincode cannot be empty")]
    EmptyPincode,

    /// An empty string was used as a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used as a vendor name.
    #[error("vendor name cannot be empty")]
    EmptyVendorName,

    /// An empty string was used as a product name.
    #[error("product name cannot be empty")]
    EmptyProductName,

    /// An ingestion batch was submitted with no line items.
    #[error("batch must contain at least one item")]
    EmptyBatch,

    /// A line item carried a quantity that is zero or negative.
    #[error("{0} is not a valid quantity, it must be greater than zero")]
    InvalidQuantity(f64),

    /// A line item carried a negative unit price.
    #[error("{0} is not a valid unit price, it must not be negative")]
    InvalidUnitPrice(f64),

    /// A report was requested for a calendar month outside 1-12.
    #[error("{0} is not a valid calendar month")]
    InvalidMonth(u8),

    /// A price comparison was requested over a window the engine does not
    /// support. Callers must keep the window between 1 and 365 days.
    #[error("{0} is not a valid analysis window, it must be between 1 and 365 days")]
    InvalidAnalysisWindow(u32),

    /// The contact handle used to create a user profile is already taken.
    #[error("the contact \"{0}\" is already registered")]
    DuplicateContact(String),

    /// The requesting user has no postal-area code on file, so pincode-scoped
    /// operations cannot run. The client should refresh the user's location.
    #[error("no pincode on file for this account")]
    MissingPincode,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Catalog resolution lost the insert race repeatedly and ran out of
    /// retries. This is transient; the whole operation is safe to retry.
    #[error("could not resolve {0} due to concurrent updates")]
    CatalogConflict(&'static str),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body returned for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::EmptyUserName
            | Error::EmptyContact
            | Error::EmptyPincode
            | Error::EmptyCategoryName
            | Error::EmptyVendorName
            | Error::EmptyProductName
            | Error::EmptyBatch
            | Error::InvalidQuantity(_)
            | Error::InvalidUnitPrice(_)
            | Error::InvalidMonth(_)
            | Error::InvalidAnalysisWindow(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::DuplicateContact(_) | Error::CatalogConflict(_) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            Error::MissingPincode | Error::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            // Internal failures are not intended to be shown to the client.
            Error::DatabaseLockError | Error::SqlError(_) => {
                tracing::error!("An unexpected error occurred: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_owned(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
