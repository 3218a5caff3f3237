use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use common::prelude::{EngineError, ResourcePayload};

use crate::ServiceState;

/// Wire shape of an access attempt. Anything submitted beyond the access
/// code (attempts to overwrite the counter, the timestamp, the resource,
/// the name) is dropped on deserialization and never reaches the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessSecretRequest {
    pub access_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessSecretResponse {
    /// The unlocked payload: the stored URL verbatim, or the file
    /// content base64-encoded
    pub resource: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(access_name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AccessSecretError> {
    // Parsed by hand so a malformed body is always a 400, never a 415/422
    let req: AccessSecretRequest = serde_json::from_slice(&body)
        .map_err(|e| AccessSecretError::InvalidRequest(e.to_string()))?;

    let payload = state.engine().access(&access_name, &req.access_code).await?;

    let resource = match payload {
        ResourcePayload::Url(url) => url,
        ResourcePayload::File { bytes, .. } => {
            base64::engine::general_purpose::STANDARD.encode(bytes)
        }
    };

    Ok((http::StatusCode::OK, Json(AccessSecretResponse { resource })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum AccessSecretError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IntoResponse for AccessSecretError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AccessSecretError::InvalidRequest(msg) => (http::StatusCode::BAD_REQUEST, msg.clone()),
            AccessSecretError::Engine(err) => match err {
                EngineError::NotFound => (http::StatusCode::NOT_FOUND, err.to_string()),
                EngineError::InvalidCode => (http::StatusCode::BAD_REQUEST, err.to_string()),
                EngineError::Gone => (http::StatusCode::GONE, err.to_string()),
                _ => (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "unexpected error".to_string(),
                ),
            },
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
