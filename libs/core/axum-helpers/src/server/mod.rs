//! Server infrastructure: router assembly, health and readiness, graceful
//! shutdown.
//!
//! ```ignore
//! let api_routes = Router::new()
//!     .merge(health_router(app_info!()))
//!     .merge(products_router);
//! let router = create_router::<ApiDoc>(api_routes, root_routes, &config.server, &config.environment)?;
//! create_production_app(router, &config.server, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{close_postgres, create_production_app, create_router};
pub use health::{
    HealthCheckFuture, HealthResponse, health_handler, health_router, run_health_checks,
};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
