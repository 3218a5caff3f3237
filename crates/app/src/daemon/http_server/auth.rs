use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::AUTHORIZATION;

use common::secret::constant_time_eq;

use crate::ServiceState;

/// Extractor guarding authenticated endpoints. Accepts requests carrying
/// `Authorization: Bearer <token>` matching the configured API token; the
/// comparison is constant-time.
pub struct RequireAuth;

#[async_trait]
impl FromRequestParts<ServiceState> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingCredentials)?;

        if constant_time_eq(state.api_token(), token) {
            Ok(RequireAuth)
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,
    #[error("invalid token")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            http::StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
