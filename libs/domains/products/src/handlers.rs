//! HTTP handlers for Products API

use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
};
use axum_helpers::{
    ApiResponse, AppResult, AuditEvent, AuditOutcome, AuthUser, UuidPath,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    extractors::parse_uuid,
};
use core_config::media::MediaConfig;
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::form::ProductForm;
use crate::images::ImageStore;
use crate::models::{Category, ListParams, ProductInput};
use crate::repository::ProductRepository;
use crate::service::ProductService;
use crate::validation::InputMode;
use crate::views::{DashboardView, MediaLinks, ProductImageView, ProductListView, ProductView};

pub const TAG: &str = "products";

/// Up to ten 5MB images, base64-inflated, plus fields
pub const MAX_BODY_BYTES: usize = 80 * 1024 * 1024;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        replace_product,
        patch_product,
        delete_product,
        delete_product_image,
        dashboard,
    ),
    components(
        schemas(
            ProductView, ProductImageView, ProductListView, DashboardView,
            ProductInput, Category
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

struct ProductState<R: ProductRepository, S: ImageStore> {
    service: ProductService<R, S>,
    media: MediaConfig,
}

type SharedState<R, S> = Arc<ProductState<R, S>>;

/// Create the products router
///
/// Routes: `/products/`, `/products/{id}/`,
/// `/products/{id}/images/{image_id}/` and `/dashboard/`.
pub fn router<R, S>(service: ProductService<R, S>, media: MediaConfig) -> Router
where
    R: ProductRepository + 'static,
    S: ImageStore + 'static,
{
    let state = Arc::new(ProductState { service, media });

    Router::new()
        .route(
            "/products/",
            get(list_products::<R, S>).post(create_product::<R, S>),
        )
        .route(
            "/products/{id}/",
            get(get_product::<R, S>)
                .put(replace_product::<R, S>)
                .patch(patch_product::<R, S>)
                .delete(delete_product::<R, S>),
        )
        .route(
            "/products/{id}/images/{image_id}/",
            delete(delete_product_image::<R, S>),
        )
        .route("/dashboard/", get(dashboard::<R, S>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Log a write attempt to the audit target
fn audit<T>(
    action: &str,
    user: &AuthUser,
    resource: String,
    headers: &HeaderMap,
    result: &ProductResult<T>,
) {
    let outcome = match result {
        Ok(_) => AuditOutcome::Success,
        Err(ProductError::Forbidden) => AuditOutcome::Denied,
        Err(_) => AuditOutcome::Failure,
    };

    let event = AuditEvent::new(action, outcome)
        .actor(Some(user.id))
        .resource(resource)
        .with_request_headers(headers);
    match result {
        Ok(_) => event.log(),
        Err(e) => event.with_details(json!({ "error": e.to_string() })).log(),
    }
}

/// List products with optional filters
#[utoipa::path(
    get,
    path = "/products/",
    tag = TAG,
    params(ListParams),
    responses(
        (status = 200, description = "Products retrieved successfully", body = ApiResponse<ProductListView>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository, S: ImageStore>(
    State(state): State<SharedState<R, S>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> AppResult<ApiResponse<ProductListView>> {
    let page = state.service.list(params).await?;
    let links = MediaLinks::from_request(&state.media, &headers);
    Ok(ApiResponse::ok(
        ProductListView::new(page, &links),
        "Products retrieved successfully",
    ))
}

/// Create a product from a JSON or multipart body
#[utoipa::path(
    post,
    path = "/products/",
    tag = TAG,
    request_body(content = ProductInput, description = "JSON, or multipart/form-data with `images` file parts"),
    responses(
        (status = 201, description = "Product created successfully", body = ApiResponse<ProductView>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("token" = []))
)]
async fn create_product<R: ProductRepository, S: ImageStore>(
    State(state): State<SharedState<R, S>>,
    user: AuthUser,
    headers: HeaderMap,
    ProductForm(submission): ProductForm,
) -> AppResult<(StatusCode, ApiResponse<ProductView>)> {
    let result = state
        .service
        .create(submission.input, submission.images, &user)
        .await;

    let resource = match &result {
        Ok(product) => format!("product:{}", product.id),
        Err(_) => "product".to_string(),
    };
    audit("product.create", &user, resource, &headers, &result);

    let links = MediaLinks::from_request(&state.media, &headers);
    Ok(
        ApiResponse::ok(ProductView::new(result?, &links), "Product created successfully")
            .created(),
    )
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/{id}/",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ApiResponse<ProductView>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository, S: ImageStore>(
    State(state): State<SharedState<R, S>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<ProductView>> {
    let product = state.service.get(id).await?;
    let links = MediaLinks::from_request(&state.media, &headers);
    Ok(ApiResponse::ok(
        ProductView::new(product, &links),
        "Product retrieved successfully",
    ))
}

async fn update<R: ProductRepository, S: ImageStore>(
    state: SharedState<R, S>,
    user: AuthUser,
    headers: HeaderMap,
    id: Uuid,
    form: ProductForm,
    mode: InputMode,
) -> AppResult<ApiResponse<ProductView>> {
    let ProductForm(submission) = form;
    let result = state
        .service
        .update(id, submission.input, submission.images, &user, mode)
        .await;
    audit(
        "product.update",
        &user,
        format!("product:{id}"),
        &headers,
        &result,
    );

    let links = MediaLinks::from_request(&state.media, &headers);
    Ok(ApiResponse::ok(
        ProductView::new(result?, &links),
        "Product updated successfully",
    ))
}

/// Replace a product's fields; name, category and price are required
#[utoipa::path(
    put,
    path = "/products/{id}/",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content = ProductInput, description = "JSON or multipart/form-data; images are appended"),
    responses(
        (status = 200, description = "Product updated successfully", body = ApiResponse<ProductView>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("token" = []))
)]
async fn replace_product<R: ProductRepository, S: ImageStore>(
    State(state): State<SharedState<R, S>>,
    user: AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    form: ProductForm,
) -> AppResult<ApiResponse<ProductView>> {
    update(state, user, headers, id, form, InputMode::Full).await
}

/// Update only the supplied fields
#[utoipa::path(
    patch,
    path = "/products/{id}/",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content = ProductInput, description = "JSON or multipart/form-data; images are appended"),
    responses(
        (status = 200, description = "Product updated successfully", body = ApiResponse<ProductView>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("token" = []))
)]
async fn patch_product<R: ProductRepository, S: ImageStore>(
    State(state): State<SharedState<R, S>>,
    user: AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    form: ProductForm,
) -> AppResult<ApiResponse<ProductView>> {
    update(state, user, headers, id, form, InputMode::Partial).await
}

/// Delete a product and all of its images
#[utoipa::path(
    delete,
    path = "/products/{id}/",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted successfully"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("token" = []))
)]
async fn delete_product<R: ProductRepository, S: ImageStore>(
    State(state): State<SharedState<R, S>>,
    user: AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> AppResult<ApiResponse<()>> {
    let result = state.service.delete(id, &user).await;
    audit(
        "product.delete",
        &user,
        format!("product:{id}"),
        &headers,
        &result,
    );

    result?;
    Ok(ApiResponse::message("Product deleted successfully"))
}

/// Delete one image; the last image of a product cannot be removed
#[utoipa::path(
    delete,
    path = "/products/{id}/images/{image_id}/",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("image_id" = i64, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image deleted successfully"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("token" = []))
)]
async fn delete_product_image<R: ProductRepository, S: ImageStore>(
    State(state): State<SharedState<R, S>>,
    user: AuthUser,
    headers: HeaderMap,
    Path((id, image_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    let id = parse_uuid(&id)?;
    let image_id: i64 = image_id.parse().map_err(|_| ProductError::ImageNotFound)?;

    let result = state.service.delete_image(id, image_id, &user).await;
    audit(
        "product.image.delete",
        &user,
        format!("product:{id}/image:{image_id}"),
        &headers,
        &result,
    );

    result?;
    Ok(ApiResponse::message("Image deleted successfully"))
}

/// Products created by the caller
#[utoipa::path(
    get,
    path = "/dashboard/",
    tag = TAG,
    params(ListParams),
    responses(
        (status = 200, description = "Dashboard data retrieved successfully", body = ApiResponse<DashboardView>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    security(("token" = []))
)]
async fn dashboard<R: ProductRepository, S: ImageStore>(
    State(state): State<SharedState<R, S>>,
    user: AuthUser,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> AppResult<ApiResponse<DashboardView>> {
    let page = state.service.dashboard(params, user.id).await?;
    let links = MediaLinks::from_request(&state.media, &headers);
    Ok(ApiResponse::ok(
        DashboardView {
            listing: ProductListView::new(page, &links),
            creator: user,
        },
        "Dashboard data retrieved successfully",
    ))
}
