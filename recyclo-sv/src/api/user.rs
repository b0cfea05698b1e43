//! Caller identity
//!
//! Authentication happens in front of this service; the authenticated user
//! id arrives in the `X-User-Id` header. A missing or blank header means an
//! anonymous caller.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::convert::Infallible;

pub const USER_HEADER: &str = "x-user-id";

fn user_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Signed-in user if any
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<String>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OptionalUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(user_from_headers(&parts.headers)))
    }
}

/// Signed-in user; anonymous requests get 401
#[derive(Debug, Clone)]
pub struct RequiredUser(pub String);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequiredUser {
    type Rejection = UserError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers)
            .map(Self)
            .ok_or(UserError::NotSignedIn)
    }
}

#[derive(Debug)]
pub enum UserError {
    NotSignedIn,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match self {
            UserError::NotSignedIn => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Sign in required" })),
            )
                .into_response(),
        }
    }
}
