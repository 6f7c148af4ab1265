use anyhow::Context;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Base URL file links are built from.
    pub public_url: String,
    pub bucket_id: String,
    pub files_collection_id: String,
    pub max_upload_size: u64,
    pub otp_ttl_secs: u64,
    pub session_ttl_secs: u64,
    pub log_level: String,
    pub cors_allowed_origins: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .context("PORT must be a number")?;
        let public_url = env::var("PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host,
            port,
            public_url,
            bucket_id: env::var("BUCKET_ID").unwrap_or_else(|_| "files".into()),
            files_collection_id: env::var("FILES_COLLECTION_ID")
                .unwrap_or_else(|_| "files".into()),
            max_upload_size: parse_env("MAX_UPLOAD_SIZE", 104_857_600),
            otp_ttl_secs: parse_env("OTP_TTL_SECS", 900),
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 604_800),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".into()),
        })
    }

    /// Public link for a stored blob.
    pub fn blob_url(&self, blob_id: &str) -> String {
        format!("{}/api/v1/blobs/{}", self.public_url, blob_id)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
