use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::{Extension, Json};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::file::{ListFilesQuery, RenameFileRequest, ShareFileRequest};
use crate::models::user::Principal;
use crate::services::file_service;
use crate::services::query_builder::FileQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: Option<String>,
}

fn header_safe_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect()
}

pub async fn list_files(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListFilesQuery>,
) -> Result<Json<Value>, AppError> {
    let query = FileQuery::from_params(&params)?;
    let files = file_service::list_files(&state, &principal, &query).await?;

    Ok(Json(json!({
        "data": {
            "total": files.len(),
            "documents": files,
        },
        "error": null
    })))
}

/// Raw request body is the file content; the name comes from `?name=` or
/// the `X-File-Name` header.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let name = params
        .name
        .or_else(|| {
            headers
                .get("X-File-Name")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default();

    let record = file_service::upload_file(&state, &principal, body, &name).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": record, "error": null })),
    ))
}

pub async fn rename_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(file_id): Path<String>,
    Json(req): Json<RenameFileRequest>,
) -> Result<Json<Value>, AppError> {
    let record =
        file_service::rename_file(&state, &principal, &file_id, &req.name, &req.extension).await?;

    Ok(Json(json!({ "data": record, "error": null })))
}

pub async fn share_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(file_id): Path<String>,
    Json(req): Json<ShareFileRequest>,
) -> Result<Json<Value>, AppError> {
    let record = file_service::update_file_users(&state, &principal, &file_id, &req.emails).await?;

    Ok(Json(json!({ "data": record, "error": null })))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, AppError> {
    file_service::delete_owned_file(&state, &principal, &file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_blob(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(blob_id): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let (record, blob) = file_service::open_file_blob(&state, &principal, &blob_id).await?;

    let disposition = format!("inline; filename=\"{}\"", header_safe_name(&record.name));

    axum::response::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &blob.content_type)
        .header(header::CONTENT_LENGTH, blob.data.len().to_string())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "private, no-cache")
        .header(
            header::LAST_MODIFIED,
            record.updated_at.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        )
        .body(Body::from(blob.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}
