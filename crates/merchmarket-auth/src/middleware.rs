//! Authentication Middleware for Axum
//!
//! Guards protected routes: the request must carry
//! `Authorization: Bearer <token>` with a valid, unexpired token. On success
//! the [`AuthenticatedUser`] is placed in the request extensions; otherwise
//! the request is answered with a 401 JSON body and never reaches the
//! handler.

use axum::{
    body::Body,
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Response,
};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::{AuthError, ErrorResponse};
use crate::jwt::JwtService;
use crate::types::AuthenticatedUser;

/// Authentication middleware layer
#[derive(Clone)]
pub struct AuthLayer {
    jwt: Arc<JwtService>,
}

impl AuthLayer {
    /// Create a new authentication layer
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self { jwt }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            jwt: self.jwt.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    jwt: Arc<JwtService>,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let jwt = self.jwt.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match authenticate_request(req.headers(), &jwt) {
                Ok(user) => {
                    let (mut parts, body) = req.into_parts();
                    parts.extensions.insert(user);
                    inner.call(Request::from_parts(parts, body)).await
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected unauthenticated request");
                    Ok(auth_error_response(e))
                }
            }
        })
    }
}

/// Validate the bearer token in `headers`
fn authenticate_request(headers: &HeaderMap, jwt: &JwtService) -> Result<AuthenticatedUser, AuthError> {
    let token = extract_bearer_token(headers)?;
    let claims = jwt.verify(token)?;
    Ok(AuthenticatedUser::from(claims))
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuthHeader)?;

    // Scheme is case-insensitive
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(AuthError::MalformedAuthHeader),
    }
}

/// Create error response for authentication errors
pub fn auth_error_response(error: AuthError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse::from(&error);

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap_or_default()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::{routing::get, Extension, Router};
    use tower::ServiceExt;

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(JwtConfig {
            secret: "middleware-test-secret-32-bytes-long".to_string(),
            ..JwtConfig::default()
        }))
    }

    fn app(jwt: Arc<JwtService>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|Extension(user): Extension<AuthenticatedUser>| async move { user.username }),
            )
            .layer(AuthLayer::new(jwt))
    }

    async fn call(app: Router, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(matches!(extract_bearer_token(&headers), Err(AuthError::MissingAuthHeader)));

        for good in ["Bearer abc", "bearer abc", "BEARER abc"] {
            headers.insert(AUTHORIZATION, good.parse().unwrap());
            assert_eq!(extract_bearer_token(&headers).unwrap(), "abc", "{good}");
        }

        for bad in ["Basic abc", "Bearer", "Bearer ", "Bearerabc", "abc"] {
            headers.insert(AUTHORIZATION, bad.parse().unwrap());
            assert!(
                matches!(extract_bearer_token(&headers), Err(AuthError::MalformedAuthHeader)),
                "{bad}"
            );
        }
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let jwt = jwt();
        let token = jwt.issue("alice").unwrap().token;
        let (status, body) = call(app(jwt), Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn test_lowercase_scheme_reaches_handler() {
        let jwt = jwt();
        let token = jwt.issue("bob").unwrap().token;
        let (status, body) = call(app(jwt), Some(&format!("bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bob");
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (status, body) = call(app(jwt()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Требуется заголовок Authorization"));
    }

    #[tokio::test]
    async fn test_malformed_header() {
        let (status, body) = call(app(jwt()), Some("Token abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Неверный формат заголовка Authorization"));
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let (status, body) = call(app(jwt()), Some("Bearer nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("INVALID_TOKEN"));
    }

    #[test]
    fn test_auth_error_response() {
        let response = auth_error_response(AuthError::InvalidToken);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = auth_error_response(AuthError::Internal("boom".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
