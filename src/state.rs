use crate::config::AppConfig;
use crate::stores::identity::{LogMailer, MemoryIdentity};
use crate::stores::memory::{MemoryBlobStore, MemoryDocumentStore};
use crate::stores::{BlobStore, DocumentStore, IdentityProvider};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<AppConfig>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// State backed by the in-memory stores, with passcodes written to the log.
    pub fn new(config: AppConfig) -> Self {
        let identity = MemoryIdentity::new(
            Arc::new(LogMailer),
            config.otp_ttl_secs,
            config.session_ttl_secs,
        );
        Self::with_backends(
            config,
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(identity),
        )
    }

    pub fn with_backends(
        config: AppConfig,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            documents,
            blobs,
            identity,
            config: Arc::new(config),
            start_time: chrono::Utc::now(),
        }
    }
}
