use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub async fn not_found_handler() -> Response {
    let err_msg = serde_json::json!({"msg": "not found"});
    (StatusCode::NOT_FOUND, Json(err_msg)).into_response()
}
