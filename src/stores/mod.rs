//! Collaborator interfaces the service orchestrates: a document store for
//! file records, a blob store for file contents, and an identity provider
//! for OTP login and sessions.
//!
//! The in-memory implementations in [`memory`] and [`identity`] back the
//! default server and the test suite.

pub mod identity;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::models::file::{FileRecord, FileUpdate, NewFileRecord};
use crate::models::query::Clause;
use crate::models::user::{Session, UserProfile};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to an object written to a blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobRef {
    pub id: String,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct Blob {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the records of `collection` matching every predicate clause,
    /// ordered by the order clauses and truncated by the limit clause.
    async fn list_documents(
        &self,
        collection: &str,
        clauses: &[Clause],
    ) -> StoreResult<Vec<FileRecord>>;

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<FileRecord>;

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        fields: NewFileRecord,
    ) -> StoreResult<FileRecord>;

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: FileUpdate,
    ) -> StoreResult<FileRecord>;

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_blob(&self, bucket: &str, data: Bytes, name: &str) -> StoreResult<BlobRef>;

    async fn get_blob(&self, bucket: &str, id: &str) -> StoreResult<Blob>;

    async fn delete_blob(&self, bucket: &str, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Issues a one-time passcode to `email`, creating the account on first
    /// use. Returns the account id the code must be verified against.
    async fn create_email_token(&self, email: &str) -> StoreResult<String>;

    /// Exchanges a one-time passcode for a session.
    async fn create_session(&self, account_id: &str, secret: &str) -> StoreResult<Session>;

    /// Account owning the session, if the secret names a live session.
    async fn session_account(&self, session_secret: &str) -> StoreResult<Option<String>>;

    async fn delete_session(&self, session_secret: &str) -> StoreResult<()>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>>;

    async fn find_user_by_account(&self, account_id: &str) -> StoreResult<Option<UserProfile>>;

    async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        avatar: &str,
        account_id: &str,
    ) -> StoreResult<UserProfile>;
}
