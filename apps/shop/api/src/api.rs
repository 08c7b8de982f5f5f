use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    middleware,
    response::Response,
    routing::get,
};
use axum_helpers::{
    HealthCheckFuture, SharedAuthenticator, health_router, run_health_checks,
    token_auth_middleware,
};
use core_config::{AppInfo, media::MediaConfig};
use domain_products::{ImageStore, ProductRepository, ProductService};
use domain_users::{UserRepository, UserService};
use sea_orm::DatabaseConnection;
use tower_http::services::ServeDir;

/// Creates the API routes without the `/api` prefix.
///
/// The `/api` prefix is added by `create_router`. A presented token is
/// resolved for every route; handlers decide whether an identity is required.
pub fn routes<U, P, S>(
    app: AppInfo,
    users: UserService<U>,
    products: ProductService<P, S>,
    media: MediaConfig,
) -> Router
where
    U: UserRepository + 'static,
    P: ProductRepository + 'static,
    S: ImageStore + 'static,
{
    let authenticator: SharedAuthenticator = Arc::new(users.clone());

    Router::new()
        .merge(health_router(app))
        .merge(domain_users::handlers::router(users))
        .merge(domain_products::handlers::router(products, media))
        .layer(middleware::from_fn_with_state(
            authenticator,
            token_auth_middleware,
        ))
}

/// Routes mounted outside `/api`: readiness and uploaded media
pub fn root_routes(db: DatabaseConnection, media: &MediaConfig) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .with_state(db)
        .nest_service(&media.url_prefix, ServeDir::new(&media.root))
}

/// Readiness check that pings the database
async fn ready_handler(State(db): State<DatabaseConnection>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "database",
        Box::pin(async {
            database::postgres::check_health(&db)
                .await
                .map_err(|e| format!("Database ping failed: {}", e))
        }),
    )];

    run_health_checks(checks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use domain_products::{InMemoryImageStore, InMemoryProductRepository};
    use domain_users::{CreateUser, InMemoryUserRepository};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn app() -> Router {
        let users = UserService::new(InMemoryUserRepository::new());
        users
            .create_user(CreateUser {
                username: "alice".to_string(),
                password: "s3cret-pass".to_string(),
                email: None,
            })
            .await
            .unwrap();
        let products = ProductService::new(
            InMemoryProductRepository::new(),
            InMemoryImageStore::new(),
        );

        routes(
            AppInfo::new("shop_api", "0.1.0"),
            users,
            products,
            MediaConfig::default(),
        )
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app()
            .await
            .oneshot(Request::get("/health/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_token_unlocks_product_writes() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/products/",
                None,
                json!({"name": "Dell XPS"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/login/",
                None,
                json!({"username": "alice", "password": "s3cret-pass"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::get("/dashboard/")
                    .header(header::AUTHORIZATION, format!("Token {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["creator"]["username"], "alice");
        assert_eq!(body["data"]["count"], 0);
    }

    #[tokio::test]
    async fn test_wrong_password_gets_no_token() {
        let response = app()
            .await
            .oneshot(json_request(
                "POST",
                "/login/",
                None,
                json!({"username": "alice", "password": "nope"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid username or password");
    }
}
