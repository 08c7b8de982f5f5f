use super::{INVALID_TOKEN, SharedAuthenticator, TOKEN_SCHEME};
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Reads the token from `Authorization: Token <key>`.
///
/// Returns `Ok(None)` when there is no header or it uses another scheme, so
/// the request continues anonymously. A `Token` header without exactly one
/// key is rejected.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case(TOKEN_SCHEME) => {}
        _ => return Ok(None),
    }

    match (parts.next(), parts.next()) {
        (Some(token), None) => Ok(Some(token)),
        _ => Err(AppError::Unauthorized(INVALID_TOKEN.to_string())),
    }
}

/// Attaches the caller's [`super::AuthUser`] to the request when a valid token
/// is presented. Invalid tokens are rejected on every route.
pub async fn token_auth_middleware(
    State(authenticator): State<SharedAuthenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers()) {
        Ok(token) => token.map(str::to_owned),
        Err(e) => return e.into_response(),
    };

    if let Some(token) = token {
        match authenticator.authenticate(&token).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "Authenticated request");
                request.extensions_mut().insert(user);
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthUser, TokenAuthenticator};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{HeaderValue, Request, StatusCode},
        middleware,
        routing::get,
    };
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct StaticAuthenticator;

    #[async_trait]
    impl TokenAuthenticator for StaticAuthenticator {
        async fn authenticate(&self, token: &str) -> Result<AuthUser, AppError> {
            if token == "good" {
                Ok(AuthUser {
                    id: Uuid::nil(),
                    username: "alice".into(),
                    email: None,
                })
            } else {
                Err(AppError::Unauthorized(INVALID_TOKEN.into()))
            }
        }
    }

    async fn whoami(user: AuthUser) -> String {
        user.username
    }

    async fn public() -> &'static str {
        "ok"
    }

    fn app() -> Router {
        let authenticator: SharedAuthenticator = Arc::new(StaticAuthenticator);
        Router::new()
            .route("/me", get(whoami))
            .route("/public", get(public))
            .layer(middleware::from_fn_with_state(authenticator, token_auth_middleware))
    }

    async fn status(path: &str, auth: Option<&str>) -> StatusCode {
        let mut builder = Request::get(path);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_extract_token_variants() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers).unwrap(), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc123"));
        assert_eq!(extract_token(&headers).unwrap(), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("token abc123"));
        assert_eq!(extract_token(&headers).unwrap(), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_token(&headers).unwrap(), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token"));
        assert!(extract_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token a b"));
        assert!(extract_token(&headers).is_err());
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        assert_eq!(status("/me", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status("/me", Some("Token good")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_even_on_public_route() {
        assert_eq!(status("/public", None).await, StatusCode::OK);
        assert_eq!(status("/public", Some("Token bad")).await, StatusCode::UNAUTHORIZED);
    }
}
