use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use common::prelude::EngineError;

use crate::daemon::http_server::auth::RequireAuth;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, StatisticsError> {
    let statistics = state.engine().statistics().await?;
    Ok((http::StatusCode::OK, Json(statistics)).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum StatisticsError {
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IntoResponse for StatisticsError {
    fn into_response(self) -> Response {
        (
            http::StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "unexpected error" })),
        )
            .into_response()
    }
}
