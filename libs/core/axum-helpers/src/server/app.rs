use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{cors_layer_from_env, security_headers};
use axum::{Router, middleware};
use core_config::{Environment, server::ServerConfig};
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Combines domain routers with the cross-cutting layers.
///
/// - `apis` is nested under `/api`
/// - `root` is merged at the top level (readiness, static media)
/// - Swagger UI at `/docs`, spec at `/api-docs/openapi.json`
/// - tracing, security headers, CORS (see [`cors_layer_from_env`]),
///   compression and the configured request timeout
/// - envelope-shaped 404/405 fallbacks
///
/// Domain routers are expected to have their state applied already.
pub fn create_router<T>(
    apis: Router,
    root: Router,
    server_config: &ServerConfig,
    environment: &Environment,
) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let cors_layer = cors_layer_from_env(environment)?;

    let router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", T::openapi()))
        .nest("/api", apis)
        .merge(root)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TimeoutLayer::new(server_config.request_timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer)
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Serves `router` until SIGINT/SIGTERM, then runs `cleanup` bounded by
/// `shutdown_timeout`.
///
/// ```ignore
/// let cleanup = async move { close_postgres(db, "main").await };
/// create_production_app(router, &config.server, Duration::from_secs(30), cleanup).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (coordinator, mut shutdown_rx) = ShutdownCoordinator::new();
    let signal_handle = coordinator.clone();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    tokio::spawn(async move { signal_handle.wait_for_signal().await });

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .inspect_err(|e| tracing::error!("Server encountered an error: {:?}", e));

    info!("Running cleanup (timeout: {:?})", shutdown_timeout);
    if tokio::time::timeout(shutdown_timeout, cleanup).await.is_err() {
        tracing::warn!("Cleanup exceeded timeout of {:?}", shutdown_timeout);
    } else {
        info!("Cleanup completed");
    }

    serve_result
}

/// Closes a sea-orm pool, logging the outcome.
pub async fn close_postgres(db: sea_orm::DatabaseConnection, name: &str) {
    match db.close().await {
        Ok(_) => info!("PostgreSQL connection '{}' closed", name),
        Err(e) => tracing::error!("Error closing PostgreSQL connection '{}': {}", name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}, routing::get};
    use tower::ServiceExt;

    #[derive(OpenApi)]
    #[openapi()]
    struct EmptyDoc;

    fn router() -> Router {
        let apis = Router::new().route("/ping/", get(|| async { "pong" }));
        let root = Router::new().route("/ready", get(|| async { "ready" }));
        temp_env::with_var_unset("CORS_ALLOWED_ORIGIN", || {
            create_router::<EmptyDoc>(apis, root, &ServerConfig::default(), &Environment::Development)
                .unwrap()
        })
    }

    async fn status(method: &str, uri: &str) -> StatusCode {
        router()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_routes_are_mounted() {
        assert_eq!(status("GET", "/api/ping/").await, StatusCode::OK);
        assert_eq!(status("GET", "/ready").await, StatusCode::OK);
        assert_eq!(status("GET", "/api-docs/openapi.json").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fallbacks() {
        assert_eq!(status("GET", "/nope").await, StatusCode::NOT_FOUND);
        assert_eq!(status("POST", "/api/ping/").await, StatusCode::METHOD_NOT_ALLOWED);
    }
}
