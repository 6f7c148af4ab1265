use bytes::Bytes;
use uuid::Uuid;

use crate::error::{handle_store_error, AppError};
use crate::models::file::{file_extension, FileRecord, FileType, FileUpdate, NewFileRecord};
use crate::models::user::{looks_like_email, normalize_email, Principal};
use crate::services::query_builder::{self, FileQuery};
use crate::state::AppState;
use crate::stores::{Blob, StoreError};

/// A compensating blob delete that did not go through. The blob is left
/// orphaned; nothing retries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWarning {
    pub blob_id: String,
    pub error: StoreError,
}

/// How an upload ended once the blob was written.
#[derive(Debug)]
pub enum UploadOutcome {
    Committed(FileRecord),
    /// The record insert failed and the blob was deleted again.
    RolledBack { cause: StoreError },
    /// The record insert failed and so did the blob delete.
    RollbackFailed {
        cause: StoreError,
        warning: ConsistencyWarning,
    },
}

impl UploadOutcome {
    pub fn into_result(self) -> Result<FileRecord, AppError> {
        match self {
            UploadOutcome::Committed(record) => Ok(record),
            UploadOutcome::RolledBack { cause } | UploadOutcome::RollbackFailed { cause, .. } => {
                Err(AppError::Store(cause))
            }
        }
    }
}

pub async fn list_files(
    state: &AppState,
    principal: &Principal,
    query: &FileQuery,
) -> Result<Vec<FileRecord>, AppError> {
    let clauses = query_builder::build_file_query(principal, query);
    state
        .documents
        .list_documents(&state.config.files_collection_id, &clauses)
        .await
        .map_err(|e| handle_store_error(e, "Failed to get files"))
}

/// Writes the blob, then the record pointing at it. A failed record insert
/// deletes the blob again before the outcome is returned.
pub async fn upload_file_saga(
    state: &AppState,
    principal: &Principal,
    data: Bytes,
    filename: &str,
) -> Result<UploadOutcome, AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("File is empty or invalid".into()));
    }
    let filename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if filename.is_empty() {
        return Err(AppError::Validation("File name is required".into()));
    }
    let file_size = data.len() as u64;
    if file_size > state.config.max_upload_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size {} exceeds max upload size {}",
            file_size, state.config.max_upload_size
        )));
    }

    let bucket = &state.config.bucket_id;
    let blob = state
        .blobs
        .put_blob(bucket, data, filename)
        .await
        .map_err(|e| handle_store_error(e, "Failed to upload file"))?;

    let extension = file_extension(&blob.name);
    let fields = NewFileRecord {
        name: blob.name.clone(),
        file_type: FileType::from_extension(&extension),
        extension,
        url: state.config.blob_url(&blob.id),
        size: blob.size,
        owner: principal.id.clone(),
        account_id: principal.account_id.clone(),
        users: Vec::new(),
        bucket_file_id: blob.id.clone(),
    };

    let record_id = Uuid::new_v4().to_string();
    let cause = match state
        .documents
        .create_document(&state.config.files_collection_id, &record_id, fields)
        .await
    {
        Ok(record) => {
            tracing::info!(
                file_id = %record.id,
                owner = %record.owner,
                blob_id = %record.bucket_file_id,
                size = record.size,
                "File uploaded"
            );
            return Ok(UploadOutcome::Committed(record));
        }
        Err(cause) => cause,
    };

    tracing::error!(error = %cause, blob_id = %blob.id, "Failed to create file document");
    match state.blobs.delete_blob(bucket, &blob.id).await {
        Ok(()) => {
            tracing::info!(blob_id = %blob.id, "Blob rolled back after failed upload");
            Ok(UploadOutcome::RolledBack { cause })
        }
        Err(error) => {
            tracing::warn!(
                blob_id = %blob.id,
                error = %error,
                "Blob rollback failed, blob is orphaned"
            );
            Ok(UploadOutcome::RollbackFailed {
                cause,
                warning: ConsistencyWarning {
                    blob_id: blob.id,
                    error,
                },
            })
        }
    }
}

pub async fn upload_file(
    state: &AppState,
    principal: &Principal,
    data: Bytes,
    filename: &str,
) -> Result<FileRecord, AppError> {
    upload_file_saga(state, principal, data, filename)
        .await?
        .into_result()
}

/// Deletes the record, then its blob. The blob is only touched once the
/// record is gone, so no live record ever points at a deleted blob.
pub async fn delete_file(state: &AppState, record_id: &str, blob_id: &str) -> Result<(), AppError> {
    state
        .documents
        .delete_document(&state.config.files_collection_id, record_id)
        .await
        .map_err(|e| handle_store_error(e, "Failed to delete file document"))?;

    state
        .blobs
        .delete_blob(&state.config.bucket_id, blob_id)
        .await
        .map_err(|e| handle_store_error(e, "Failed to delete file blob"))?;

    tracing::info!(file_id = %record_id, blob_id = %blob_id, "File deleted");
    Ok(())
}

/// Loads a record the principal owns. Records that are merely shared with
/// the principal are forbidden; records they cannot see at all are not found.
async fn owned_record(
    state: &AppState,
    principal: &Principal,
    file_id: &str,
) -> Result<FileRecord, AppError> {
    let record = state
        .documents
        .get_document(&state.config.files_collection_id, file_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => AppError::NotFound(format!("File {} not found", file_id)),
            other => handle_store_error(other, "Failed to load file"),
        })?;

    if record.owner == principal.id {
        Ok(record)
    } else if record.is_visible_to(&principal.id, &principal.email) {
        Err(AppError::Forbidden("Only the owner can modify this file".into()))
    } else {
        Err(AppError::NotFound(format!("File {} not found", file_id)))
    }
}

pub async fn delete_owned_file(
    state: &AppState,
    principal: &Principal,
    file_id: &str,
) -> Result<(), AppError> {
    let record = owned_record(state, principal, file_id).await?;
    delete_file(state, &record.id, &record.bucket_file_id).await
}

pub async fn rename_file(
    state: &AppState,
    principal: &Principal,
    file_id: &str,
    name: &str,
    extension: &str,
) -> Result<FileRecord, AppError> {
    let name = name.trim();
    let extension = extension.trim().trim_start_matches('.');
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if name.contains(['/', '\\']) || extension.contains(['/', '\\']) {
        return Err(AppError::Validation("Name must not contain path separators".into()));
    }

    owned_record(state, principal, file_id).await?;

    let new_name = if extension.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", name, extension)
    };
    let record = state
        .documents
        .update_document(
            &state.config.files_collection_id,
            file_id,
            FileUpdate {
                name: Some(new_name),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| handle_store_error(e, "Failed to rename file"))?;

    tracing::info!(file_id = %file_id, name = %record.name, "File renamed");
    Ok(record)
}

/// Replaces the list of emails the file is shared with.
pub async fn update_file_users(
    state: &AppState,
    principal: &Principal,
    file_id: &str,
    emails: &[String],
) -> Result<FileRecord, AppError> {
    let mut users: Vec<String> = Vec::with_capacity(emails.len());
    for email in emails {
        let email = normalize_email(email);
        if !looks_like_email(&email) {
            return Err(AppError::Validation(format!("Invalid email: {}", email)));
        }
        if !users.contains(&email) {
            users.push(email);
        }
    }

    owned_record(state, principal, file_id).await?;

    let record = state
        .documents
        .update_document(
            &state.config.files_collection_id,
            file_id,
            FileUpdate {
                users: Some(users),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| handle_store_error(e, "Failed to update file users"))?;

    tracing::info!(file_id = %file_id, shared_with = record.users.len(), "File sharing updated");
    Ok(record)
}

/// Fetches the blob behind a record the principal can see.
pub async fn open_file_blob(
    state: &AppState,
    principal: &Principal,
    blob_id: &str,
) -> Result<(FileRecord, Blob), AppError> {
    let record = state
        .documents
        .list_documents(
            &state.config.files_collection_id,
            &query_builder::blob_lookup_query(principal, blob_id),
        )
        .await
        .map_err(|e| handle_store_error(e, "Failed to look up file"))?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("File {} not found", blob_id)))?;

    let blob = state
        .blobs
        .get_blob(&state.config.bucket_id, &record.bucket_file_id)
        .await
        .map_err(|e| handle_store_error(e, "Failed to read file blob"))?;

    Ok((record, blob))
}
