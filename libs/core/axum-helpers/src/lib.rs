//! # Axum Helpers
//!
//! Shared HTTP plumbing for the catalog services.
//!
//! - **[`response`]**: success envelope `{success, data, message}`
//! - **[`errors`]**: [`AppError`] and the failure envelope `{success, error, details}`
//! - **[`auth`]**: `Authorization: Token <key>` middleware and the [`AuthUser`] extractor
//! - **[`extractors`]**: UUID path extractor
//! - **[`server`]**: router assembly, health/readiness, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`audit`]**: audit logging for logins and catalog writes

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod response;
pub mod server;

pub use auth::{AuthUser, SharedAuthenticator, TokenAuthenticator, token_auth_middleware};

pub use server::{
    HealthCheckFuture, ShutdownCoordinator, close_postgres, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, create_permissive_cors_layer, security_headers};

pub use errors::{AppError, AppResult, ErrorCode, ErrorResponse, first_violation};

pub use response::ApiResponse;

pub use extractors::UuidPath;

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
