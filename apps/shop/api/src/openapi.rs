use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name referenced by `security(("token" = []))` on protected operations
pub const TOKEN_SCHEME: &str = "token";

#[derive(OpenApi)]
#[openapi(
    paths(axum_helpers::server::health::health_handler),
    components(
        schemas(axum_helpers::ErrorResponse, axum_helpers::server::HealthResponse)
    ),
    info(
        title = "Shop API",
        version = "0.1.0",
        description = "Product catalog with token authentication and image uploads"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    tags(
        (name = "health", description = "Liveness")
    ),
    modifiers(&DomainDocs, &TokenSecurity)
)]
pub struct ApiDoc;

/// Folds the domain documents into the application document
struct DomainDocs;

impl Modify for DomainDocs {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.merge(domain_users::ApiDoc::openapi());
        openapi.merge(domain_products::ApiDoc::openapi());
    }
}

/// `Authorization: Token <key>`
struct TokenSecurity;

impl Modify for TokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            TOKEN_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Token <key> as returned by POST /login/",
            ))),
        );
    }
}
