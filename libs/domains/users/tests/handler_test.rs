//! Handler tests for the Users domain
//!
//! Exercise `POST /login/` through the router with an in-memory repository:
//! - Envelope shape of successful and failed logins
//! - Status codes for missing and wrong credentials
//! - Token reuse across logins

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn service_with_user() -> UserService<InMemoryUserRepository> {
    let service = UserService::new(InMemoryUserRepository::new());
    service
        .create_user(CreateUser {
            username: "operator".to_string(),
            password: "correct horse".to_string(),
            email: Some("operator@example.com".to_string()),
        })
        .await
        .unwrap();
    service
}

fn login_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_login_returns_token_envelope() {
    let app = handlers::router(service_with_user().await);

    let response = app
        .oneshot(login_request(json!({
            "username": "operator",
            "password": "correct horse"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["data"]["username"], "operator");
    assert_eq!(body["data"]["email"], "operator@example.com");
    assert_eq!(body["data"]["token"].as_str().unwrap().len(), 40);
}

#[tokio::test]
async fn test_login_reuses_token() {
    let app = handlers::router(service_with_user().await);
    let credentials = json!({"username": "operator", "password": "correct horse"});

    let first = app.clone().oneshot(login_request(credentials.clone())).await.unwrap();
    let second = app.oneshot(login_request(credentials)).await.unwrap();

    let first = json_body(first.into_body()).await;
    let second = json_body(second.into_body()).await;
    assert_eq!(first["data"]["token"], second["data"]["token"]);
}

#[tokio::test]
async fn test_login_missing_fields_is_bad_request() {
    let app = handlers::router(service_with_user().await);

    let response = app
        .oneshot(login_request(json!({"username": "operator"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Username and password are required");
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let app = handlers::router(service_with_user().await);

    let response = app
        .oneshot(login_request(json!({
            "username": "operator",
            "password": "wrong"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Invalid username or password");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_login_malformed_json_is_bad_request() {
    let app = handlers::router(service_with_user().await);

    let request = Request::builder()
        .method("POST")
        .uri("/login/")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response.into_body()).await["success"], false);
}
