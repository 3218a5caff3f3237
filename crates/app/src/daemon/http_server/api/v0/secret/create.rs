use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use common::prelude::{EngineError, ResourceInput};

use crate::daemon::http_server::auth::RequireAuth;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSecretRequest {
    pub resource: ResourceBody,
}

/// Wire shape of a submitted resource: at most one of the two fields,
/// with file content carried as base64.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSecretResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    pub access_name: String,
    pub access_code: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    _auth: RequireAuth,
    body: Bytes,
) -> Result<impl IntoResponse, CreateSecretError> {
    // Parsed by hand so a malformed body is always a 400, never a 415/422
    let req: CreateSecretRequest = serde_json::from_slice(&body)
        .map_err(|e| CreateSecretError::InvalidRequest(e.to_string()))?;

    let input = ResourceInput {
        url: req.resource.url,
        file: req
            .resource
            .file
            .map(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded))
            .transpose()
            .map_err(|_| CreateSecretError::InvalidRequest("not a valid base64 file".into()))?,
    };

    let issued = state.engine().create(input).await?;

    Ok((
        http::StatusCode::CREATED,
        Json(CreateSecretResponse {
            created: issued.created,
            access_name: issued.access_name,
            access_code: issued.access_code,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum CreateSecretError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IntoResponse for CreateSecretError {
    fn into_response(self) -> Response {
        match self {
            CreateSecretError::InvalidRequest(msg) => (
                http::StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            CreateSecretError::Engine(err) => match err {
                EngineError::Resource(_) => (
                    http::StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": err.to_string() })),
                )
                    .into_response(),
                _ => (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "unexpected error" })),
                )
                    .into_response(),
            },
        }
    }
}
