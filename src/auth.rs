use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::services::user_service;
use crate::state::AppState;

/// Session secret presented as `Authorization: Bearer <secret>`.
pub fn bearer_secret(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolves the session on every request and stores the caller's
/// [`Principal`](crate::models::user::Principal) in the request extensions.
#[derive(Clone)]
pub struct SessionLayer {
    state: AppState,
}

impl SessionLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> tower::Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SessionService<S> {
    inner: S,
    state: AppState,
}

fn unauthorized(message: &str) -> Response {
    let body = json!({
        "data": null,
        "error": {
            "code": 401,
            "message": message,
        }
    });
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

impl<S, B> tower::Service<axum::http::Request<B>> for SessionService<S>
where
    S: tower::Service<axum::http::Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let state = self.state.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(secret) = bearer_secret(req.headers()) else {
                return Ok(unauthorized("Missing session"));
            };

            match user_service::current_principal(&state, &secret).await {
                Ok(Some(principal)) => {
                    req.extensions_mut().insert(principal);
                    inner.call(req).await
                }
                Ok(None) => Ok(unauthorized("Invalid or expired session")),
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}
