pub mod files;
pub mod health;
pub mod storage;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::SessionLayer;
use crate::state::AppState;

fn allowed_origins(origins: &str) -> AllowOrigin {
    if origins.trim() == "*" {
        return AllowOrigin::from(Any);
    }
    let list: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    AllowOrigin::list(list)
}

pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_size as usize;

    // Public routes (no session)
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/auth/sign-up", post(users::sign_up))
        .route("/api/v1/auth/sign-in", post(users::sign_in))
        .route("/api/v1/auth/verify", post(users::verify_secret));

    // Session-scoped API routes
    let api_routes = Router::new()
        .route("/status", get(health::status))
        .route("/me", get(users::me))
        .route("/auth/sign-out", post(users::sign_out))
        // Files
        .route("/files", get(files::list_files).post(files::upload_file))
        .route(
            "/files/{file_id}",
            patch(files::rename_file).delete(files::delete_file),
        )
        .route("/files/{file_id}/users", put(files::share_file))
        .route("/blobs/{blob_id}", get(files::download_blob))
        // Storage
        .route("/storage/summary", get(storage::summary))
        .layer(SessionLayer::new(state.clone()));

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.cors_allowed_origins))
        .allow_methods(Any)
        .allow_headers(Any);

    let x_request_id = http::HeaderName::from_static("x-request-id");

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
