use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    routing::post,
};
use axum_helpers::{
    ApiResponse, AppResult, AuditEvent, AuditOutcome,
    errors::responses::{
        BadRequestValidationResponse, InternalServerErrorResponse, UnauthorizedResponse,
    },
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserError;
use crate::models::{LoginRequest, LoginResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const TAG: &str = "auth";

/// OpenAPI documentation for the accounts API
#[derive(OpenApi)]
#[openapi(
    paths(login),
    components(
        schemas(LoginRequest, LoginResponse),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Token login")
    )
)]
pub struct ApiDoc;

/// Create the accounts router (`POST /login/`)
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    Router::new()
        .route("/login/", post(login))
        .with_state(Arc::new(service))
}

/// Exchange username and password for an API token
#[utoipa::path(
    post,
    path = "/login/",
    tag = TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let Json(request) = payload?;
    let username = request.username.clone().unwrap_or_default();

    match service.login(request).await {
        Ok(response) => {
            AuditEvent::new("auth.login", AuditOutcome::Success)
                .actor(Some(response.user_id))
                .with_request_headers(&headers)
                .log();
            Ok(ApiResponse::ok(response, "Login successful"))
        }
        Err(err) => {
            if matches!(err, UserError::InvalidCredentials) {
                AuditEvent::new("auth.login", AuditOutcome::Failure)
                    .with_request_headers(&headers)
                    .with_details(json!({ "username": username }))
                    .log();
            }
            Err(err.into())
        }
    }
}
