use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use super::{IdentityProvider, StoreError, StoreResult};
use crate::models::user::{normalize_email, Session, UserProfile};

/// Delivers one-time passcodes to users.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_code(&self, email: &str, code: &str) -> StoreResult<()>;
}

/// Writes passcodes to the log instead of sending mail.
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_code(&self, email: &str, code: &str) -> StoreResult<()> {
        tracing::debug!(email = %email, code = %code, "One-time passcode issued");
        Ok(())
    }
}

/// Wrong guesses allowed before a pending passcode is discarded.
pub const MAX_PASSCODE_ATTEMPTS: u32 = 5;

struct PendingCode {
    code_hash: String,
    expires_at: DateTime<Utc>,
    failed_attempts: u32,
}

struct SessionEntry {
    id: String,
    account_id: String,
    expires_at: DateTime<Utc>,
}

fn digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..1_000_000u32))
}

/// Identity provider holding accounts, passcodes, sessions and user
/// profiles in memory. Passcodes and session secrets are stored as SHA-256
/// digests only.
pub struct MemoryIdentity {
    accounts: DashMap<String, String>,
    codes: DashMap<String, PendingCode>,
    sessions: DashMap<String, SessionEntry>,
    users: DashMap<String, UserProfile>,
    mailer: Arc<dyn OtpMailer>,
    otp_ttl: Duration,
    session_ttl: Duration,
}

impl MemoryIdentity {
    pub fn new(mailer: Arc<dyn OtpMailer>, otp_ttl_secs: u64, session_ttl_secs: u64) -> Self {
        Self {
            accounts: DashMap::new(),
            codes: DashMap::new(),
            sessions: DashMap::new(),
            users: DashMap::new(),
            mailer,
            otp_ttl: Duration::seconds(otp_ttl_secs as i64),
            session_ttl: Duration::seconds(session_ttl_secs as i64),
        }
    }

    /// Accounts for a passcode that did not match. Expired codes and codes
    /// that ran out of attempts are dropped.
    fn reject_passcode(&self, account_id: &str, now: DateTime<Utc>) -> StoreError {
        let exhausted = match self.codes.get_mut(account_id) {
            None => return StoreError::InvalidCredentials("No passcode pending for account".into()),
            Some(pending) if pending.expires_at <= now => None,
            Some(mut pending) => {
                pending.failed_attempts += 1;
                Some(pending.failed_attempts >= MAX_PASSCODE_ATTEMPTS)
            }
        };

        match exhausted {
            None => {
                self.codes.remove_if(account_id, |_, p| p.expires_at <= now);
                StoreError::InvalidCredentials("Passcode expired".into())
            }
            Some(true) => {
                self.codes
                    .remove_if(account_id, |_, p| p.failed_attempts >= MAX_PASSCODE_ATTEMPTS);
                tracing::warn!(account_id = %account_id, "Passcode discarded after too many attempts");
                StoreError::InvalidCredentials("Too many passcode attempts".into())
            }
            Some(false) => StoreError::InvalidCredentials("Invalid passcode".into()),
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn create_email_token(&self, email: &str) -> StoreResult<String> {
        let email = normalize_email(email);
        let account_id = self
            .accounts
            .entry(email.clone())
            .or_insert_with(|| Uuid::new_v4().simple().to_string())
            .clone();

        let code = generate_code();
        self.codes.insert(
            account_id.clone(),
            PendingCode {
                code_hash: digest(&code),
                expires_at: Utc::now() + self.otp_ttl,
                failed_attempts: 0,
            },
        );

        self.mailer.send_code(&email, &code).await?;
        Ok(account_id)
    }

    async fn create_session(&self, account_id: &str, secret: &str) -> StoreResult<Session> {
        let now = Utc::now();
        let presented = digest(secret);
        // Checked and consumed under one shard lock.
        let consumed = self.codes.remove_if(account_id, |_, pending| {
            pending.expires_at > now && pending.code_hash == presented
        });
        if consumed.is_none() {
            return Err(self.reject_passcode(account_id, now));
        }

        let session_secret = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        let session = Session {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            secret: session_secret.clone(),
            expires_at: now + self.session_ttl,
        };
        self.sessions.insert(
            digest(&session_secret),
            SessionEntry {
                id: session.id.clone(),
                account_id: session.account_id.clone(),
                expires_at: session.expires_at,
            },
        );

        tracing::debug!(session_id = %session.id, account_id = %account_id, "Session created");
        Ok(session)
    }

    async fn session_account(&self, session_secret: &str) -> StoreResult<Option<String>> {
        let key = digest(session_secret);
        let (account_id, expired) = match self.sessions.get(&key) {
            Some(entry) => (entry.account_id.clone(), entry.expires_at <= Utc::now()),
            None => return Ok(None),
        };

        if expired {
            if let Some((_, entry)) = self.sessions.remove(&key) {
                tracing::debug!(session_id = %entry.id, "Expired session dropped");
            }
            return Ok(None);
        }
        Ok(Some(account_id))
    }

    async fn delete_session(&self, session_secret: &str) -> StoreResult<()> {
        self.sessions
            .remove(&digest(session_secret))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Session not found".into()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>> {
        let email = normalize_email(email);
        Ok(self
            .users
            .iter()
            .find(|u| u.value().email == email)
            .map(|u| u.value().clone()))
    }

    async fn find_user_by_account(&self, account_id: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.value().account_id == account_id)
            .map(|u| u.value().clone()))
    }

    async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        avatar: &str,
        account_id: &str,
    ) -> StoreResult<UserProfile> {
        let email = normalize_email(email);
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(StoreError::Conflict(format!("User {} already exists", email)));
        }

        let profile = UserProfile {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email,
            avatar: avatar.to_string(),
            account_id: account_id.to_string(),
            created_at: Utc::now(),
        };
        self.users.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }
}
