use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
mod auth;
mod config;
mod handlers;
mod health;

pub use config::Config;

use crate::ServiceState;

const API_PREFIX: &str = "/api";
const STATUS_PREFIX: &str = "/_status";

/// Uploads arrive as base64 JSON bodies; cap them well above the intended
/// small-file use case.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub async fn run_api(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let api_router = router(state).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, api_router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

/// Build the full API router; separate from [`run_api`] so tests can drive
/// it without binding a socket.
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .nest(API_PREFIX, api::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::body::Body;
    use http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;

    use super::*;
    use crate::daemon::ServiceConfig;

    const TEST_TOKEN: &str = "sekrit-test-token";

    /// The original test fixture: a 3x3 transparent PNG, base64 encoded
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAMAAAADCAYAAABWKLW/AAAAEklEQVR42mNUaG+vZ4ACRpwcAHTuBQv2OFcqAAAAAElFTkSuQmCC";

    async fn test_state() -> ServiceState {
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            sqlite_path: None,
            api_token: TEST_TOKEN.to_string(),
            engine: common::prelude::EngineConfig::default(),
            log_level: tracing::Level::INFO,
            log_dir: None,
        };
        ServiceState::from_config(&config).await.unwrap()
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_secret(router: &Router, resource: Value) -> Value {
        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v0/secret",
                Some(TEST_TOKEN),
                Some(json!({ "resource": resource })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await
    }

    async fn backdate(state: &ServiceState, access_name: &str, age: Duration) {
        sqlx::query("UPDATE secrets SET created = ?1 WHERE access_name = ?2")
            .bind(OffsetDateTime::now_utc() - age)
            .bind(access_name)
            .execute(&**state.database())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_url_secret() {
        let state = test_state().await;
        let router = router(state);

        let response = router
            .oneshot(request(
                Method::POST,
                "/api/v0/secret",
                Some(TEST_TOKEN),
                Some(json!({ "resource": { "url": "https://example.com/" } })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        assert!(!body["access_name"].as_str().unwrap().is_empty());
        assert_eq!(body["access_code"].as_str().unwrap().len(), 6);
        assert!(body["created"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_create_file_secret() {
        let state = test_state().await;
        let router = router(state);

        let response = router
            .oneshot(request(
                Method::POST,
                "/api/v0/secret",
                Some(TEST_TOKEN),
                Some(json!({ "resource": { "file": PNG_BASE64 } })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_unauthenticated() {
        let state = test_state().await;
        let router = router(state);

        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v0/secret",
                None,
                Some(json!({ "resource": { "url": "https://example.com/" } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(request(
                Method::POST,
                "/api/v0/secret",
                Some("wrong-token"),
                Some(json!({ "resource": { "url": "https://example.com/" } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_bad_request() {
        let state = test_state().await;
        let router = router(state);

        // empty body
        let response = router
            .clone()
            .oneshot(request(Method::POST, "/api/v0/secret", Some(TEST_TOKEN), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // both fields set
        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v0/secret",
                Some(TEST_TOKEN),
                Some(json!({ "resource": {
                    "url": "https://example.com/",
                    "file": PNG_BASE64,
                } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // undecodable base64
        let response = router
            .oneshot(request(
                Method::POST,
                "/api/v0/secret",
                Some(TEST_TOKEN),
                Some(json!({ "resource": { "file": "!!! not base64 !!!" } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_method_not_allowed() {
        let state = test_state().await;
        let router = router(state);

        let response = router
            .oneshot(request(Method::GET, "/api/v0/secret", Some(TEST_TOKEN), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_access_url_secret_round_trip() {
        let state = test_state().await;
        let router = router(state.clone());

        let created =
            create_secret(&router, json!({ "url": "https://example.com/" })).await;
        let access_name = created["access_name"].as_str().unwrap();
        let access_code = created["access_code"].as_str().unwrap();

        let uri = format!("/api/v0/secret/{}", access_name);
        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(request(
                    Method::PUT,
                    &uri,
                    None,
                    Some(json!({ "access_code": access_code })),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = response_json(response).await;
            assert_eq!(body["resource"], "https://example.com/");
        }
    }

    #[tokio::test]
    async fn test_access_file_secret_round_trip() {
        let state = test_state().await;
        let router = router(state.clone());

        let created = create_secret(&router, json!({ "file": PNG_BASE64 })).await;
        let uri = format!("/api/v0/secret/{}", created["access_name"].as_str().unwrap());

        let response = router
            .oneshot(request(
                Method::PUT,
                &uri,
                None,
                Some(json!({ "access_code": created["access_code"] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["resource"], PNG_BASE64);
    }

    #[tokio::test]
    async fn test_access_ignores_extra_fields() {
        let state = test_state().await;
        let router = router(state.clone());

        let created =
            create_secret(&router, json!({ "url": "https://example.com/" })).await;
        let access_name = created["access_name"].as_str().unwrap();
        let uri = format!("/api/v0/secret/{}", access_name);

        let response = router
            .clone()
            .oneshot(request(
                Method::PUT,
                &uri,
                None,
                Some(json!({
                    "access_code": created["access_code"],
                    "number_of_accesses": 100,
                    "access_name": "sample",
                    "created": "1999-01-01T00:00:00Z",
                    "resource": { "url": "https://www.elgoog.com/" },
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["resource"], "https://example.com/");

        // only the counter changed, and only via the defined increment
        let record = sqlx::query(
            "SELECT access_name, number_of_accesses FROM secrets WHERE access_name = ?1",
        )
        .bind(access_name)
        .fetch_one(&**state.database())
        .await
        .unwrap();
        use sqlx::Row;
        let accesses: i64 = record.try_get("number_of_accesses").unwrap();
        assert_eq!(accesses, 1);
    }

    #[tokio::test]
    async fn test_access_unknown_name() {
        let state = test_state().await;
        let router = router(state);

        let response = router
            .oneshot(request(
                Method::PUT,
                "/api/v0/secret/fd53c240-2a24-449f-92f4-0f8975c1aad5",
                None,
                Some(json!({ "access_code": "SAMPLE" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_access_wrong_code() {
        let state = test_state().await;
        let router = router(state.clone());

        let created =
            create_secret(&router, json!({ "url": "https://example.com/" })).await;
        let uri = format!("/api/v0/secret/{}", created["access_name"].as_str().unwrap());

        let response = router
            .oneshot(request(
                Method::PUT,
                &uri,
                None,
                Some(json!({ "access_code": "WRONGX" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_access_missing_code() {
        let state = test_state().await;
        let router = router(state.clone());

        let created =
            create_secret(&router, json!({ "url": "https://example.com/" })).await;
        let uri = format!("/api/v0/secret/{}", created["access_name"].as_str().unwrap());

        let response = router
            .oneshot(request(Method::PUT, &uri, None, Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_access_expired_secret() {
        let state = test_state().await;
        let router = router(state.clone());

        let created =
            create_secret(&router, json!({ "url": "https://example.com/" })).await;
        let access_name = created["access_name"].as_str().unwrap();
        backdate(&state, access_name, Duration::hours(25)).await;

        let uri = format!("/api/v0/secret/{}", access_name);
        let response = router
            .clone()
            .oneshot(request(
                Method::PUT,
                &uri,
                None,
                Some(json!({ "access_code": created["access_code"] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GONE);

        // wrong code still wins over expiry
        let response = router
            .oneshot(request(
                Method::PUT,
                &uri,
                None,
                Some(json!({ "access_code": "WRONGX" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_access_method_not_allowed() {
        let state = test_state().await;
        let router = router(state.clone());

        let created =
            create_secret(&router, json!({ "url": "https://example.com/" })).await;
        let uri = format!("/api/v0/secret/{}", created["access_name"].as_str().unwrap());

        for method in [Method::GET, Method::POST, Method::PATCH] {
            let response = router
                .clone()
                .oneshot(request(
                    method,
                    &uri,
                    None,
                    Some(json!({ "access_code": created["access_code"] })),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn test_statistics() {
        let state = test_state().await;
        let router = router(state.clone());

        // two accessed url secrets, one accessed file secret, one untouched
        let mut expected: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for resource in [
            json!({ "url": "https://example.com/" }),
            json!({ "url": "https://example.org/" }),
            json!({ "file": PNG_BASE64 }),
        ] {
            let is_file = resource.get("file").is_some();
            let created = create_secret(&router, resource).await;
            let uri = format!("/api/v0/secret/{}", created["access_name"].as_str().unwrap());
            let response = router
                .clone()
                .oneshot(request(
                    Method::PUT,
                    &uri,
                    None,
                    Some(json!({ "access_code": created["access_code"] })),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let day = created["created"].as_str().unwrap()[..10].to_string();
            let counts = expected.entry(day).or_default();
            if is_file {
                counts.0 += 1;
            } else {
                counts.1 += 1;
            }
        }
        create_secret(&router, json!({ "url": "https://example.net/" })).await;

        let response = router
            .oneshot(request(
                Method::GET,
                "/api/v0/statistics",
                Some(TEST_TOKEN),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        let expected_json: Value = expected
            .into_iter()
            .map(|(day, (files, links))| (day, json!({ "files": files, "links": links })))
            .collect::<serde_json::Map<String, Value>>()
            .into();
        assert_eq!(body, expected_json);
    }

    #[tokio::test]
    async fn test_statistics_unauthenticated() {
        let state = test_state().await;
        let router = router(state);

        let response = router
            .oneshot(request(Method::GET, "/api/v0/statistics", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_json_404() {
        let state = test_state().await;
        let router = router(state);

        let response = router
            .oneshot(request(Method::GET, "/definitely/not/here", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response_json(response).await;
        assert_eq!(body["msg"], "not found");
    }

    #[tokio::test]
    async fn test_version_probe() {
        let state = test_state().await;
        let router = router(state);

        let response = router
            .oneshot(request(Method::GET, "/_status/version", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
