use crate::{errors::ErrorResponse, response::ApiResponse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use core_config::AppInfo;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// A boxed future for health checks with a string error
pub type HealthCheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// Runs readiness checks concurrently.
///
/// All passing gives 200 with `{"status": "ready", "<name>": "connected", ...}`
/// as the envelope data; any failure gives 503 with the same map as details.
///
/// ```ignore
/// let checks: Vec<(&str, HealthCheckFuture)> = vec![(
///     "database",
///     Box::pin(async { check_health(&db).await.map_err(|e| e.to_string()) }),
/// )];
/// run_health_checks(checks).await
/// ```
pub async fn run_health_checks(checks: Vec<(&str, HealthCheckFuture<'_>)>) -> Response {
    let names: Vec<_> = checks.iter().map(|(name, _)| *name).collect();
    let results = join_all(checks.into_iter().map(|(_, check)| check)).await;

    let mut report = Map::new();
    let mut all_healthy = true;

    for (name, result) in names.into_iter().zip(results) {
        let state = match result {
            Ok(()) => "connected",
            Err(e) => {
                tracing::error!(check = name, error = %e, "Readiness check failed");
                all_healthy = false;
                "disconnected"
            }
        };
        report.insert(name.to_string(), json!(state));
    }

    if all_healthy {
        report.insert("status".to_string(), json!("ready"));
        ApiResponse::ok(Value::Object(report), "Service is ready").into_response()
    } else {
        report.insert("status".to_string(), json!("not ready"));
        let body = ErrorResponse::new("Service is not ready")
            .with_details(Value::Object(report).to_string());
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}

/// Liveness handler; always 200 while the process serves requests.
#[utoipa::path(
    get,
    path = "/health/",
    tag = "health",
    responses((status = 200, description = "API is running", body = ApiResponse<HealthResponse>))
)]
pub async fn health_handler(State(app): State<AppInfo>) -> ApiResponse<HealthResponse> {
    ApiResponse::ok(
        HealthResponse {
            status: "healthy",
            name: app.name,
            version: app.version,
        },
        "API is running successfully",
    )
}

/// Router exposing `GET /health/`.
pub fn health_router(app_info: AppInfo) -> Router {
    Router::new()
        .route("/health/", get(health_handler))
        .with_state(app_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_router_reports_healthy() {
        let response = health_router(AppInfo::new("shop_api", "1.2.3"))
            .oneshot(axum::http::Request::get("/health/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["version"], "1.2.3");
        assert_eq!(body["message"], "API is running successfully");
    }

    #[tokio::test]
    async fn test_run_health_checks_all_pass() {
        let checks: Vec<(&str, HealthCheckFuture)> = vec![("database", Box::pin(async { Ok(()) }))];
        let response = run_health_checks(checks).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["database"], "connected");
        assert_eq!(body["data"]["status"], "ready");
    }

    #[tokio::test]
    async fn test_run_health_checks_failure_is_unavailable() {
        let checks: Vec<(&str, HealthCheckFuture)> = vec![
            ("database", Box::pin(async { Err("timeout".to_string()) })),
            ("media", Box::pin(async { Ok(()) })),
        ];
        let response = run_health_checks(checks).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["details"].as_str().unwrap().contains("disconnected"));
    }
}
