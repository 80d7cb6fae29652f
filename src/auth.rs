//! Extracts the authenticated user from a request.
//!
//! Bearer-token verification happens in an upstream gateway, which forwards
//! the verified identity in the `x-user-id` header. This module only trusts
//! that header; it never sees credentials.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::user::UserId;

/// The header the authentication gateway stores the verified user ID in.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The verified identity of the requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

/// The rejection returned when a request carries no usable identity header.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Missing or invalid authentication." })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<UserId>().ok())
            .ok_or(AuthRejection)?;

        Ok(AuthenticatedUser(user_id))
    }
}
