use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::auth::bearer_secret;
use crate::error::AppError;
use crate::models::user::{Principal, SignInRequest, SignUpRequest, VerifySecretRequest};
use crate::services::user_service;
use crate::state::AppState;

pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let account_id = user_service::create_account(&state, &req.full_name, &req.email).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": { "account_id": account_id }, "error": null })),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<Value>, AppError> {
    let account_id = user_service::sign_in(&state, &req.email).await?;

    Ok(Json(json!({ "data": { "account_id": account_id }, "error": null })))
}

pub async fn verify_secret(
    State(state): State<AppState>,
    Json(req): Json<VerifySecretRequest>,
) -> Result<Json<Value>, AppError> {
    let session = user_service::verify_secret(&state, &req.account_id, &req.secret).await?;

    Ok(Json(json!({
        "data": {
            "session_id": session.id,
            "secret": session.secret,
            "expires_at": session.expires_at,
        },
        "error": null
    })))
}

pub async fn sign_out(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let secret = bearer_secret(&headers).ok_or(AppError::Unauthorized)?;
    user_service::sign_out(&state, &secret).await?;
    tracing::info!(user_id = %principal.id, "User signed out");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let profile = user_service::get_profile(&state, &principal).await?;

    Ok(Json(json!({ "data": profile, "error": null })))
}
