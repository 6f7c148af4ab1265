use crate::error::{handle_store_error, AppError};
use crate::models::user::{
    looks_like_email, normalize_email, Principal, Session, UserProfile, AVATAR_PLACEHOLDER_URL,
};
use crate::state::AppState;

fn validated_email(email: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    if !looks_like_email(&email) {
        return Err(AppError::Validation(format!("Invalid email: {}", email)));
    }
    Ok(email)
}

async fn send_email_otp(state: &AppState, email: &str) -> Result<String, AppError> {
    state
        .identity
        .create_email_token(email)
        .await
        .map_err(|e| handle_store_error(e, "Failed to send email OTP"))
}

/// Sends a passcode and creates the profile on first sign-up. Returns the
/// account id the passcode must be verified against.
pub async fn create_account(
    state: &AppState,
    full_name: &str,
    email: &str,
) -> Result<String, AppError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::Validation("Full name is required".into()));
    }
    let email = validated_email(email)?;

    let existing = state
        .identity
        .find_user_by_email(&email)
        .await
        .map_err(|e| handle_store_error(e, "Failed to look up user"))?;

    let account_id = send_email_otp(state, &email).await?;

    if existing.is_none() {
        let profile = state
            .identity
            .create_user(full_name, &email, AVATAR_PLACEHOLDER_URL, &account_id)
            .await
            .map_err(|e| handle_store_error(e, "Failed to create user"))?;
        tracing::info!(user_id = %profile.id, account_id = %account_id, "Account created");
    }

    Ok(account_id)
}

/// Sends a fresh passcode to an existing user.
pub async fn sign_in(state: &AppState, email: &str) -> Result<String, AppError> {
    let email = validated_email(email)?;
    let user = state
        .identity
        .find_user_by_email(&email)
        .await
        .map_err(|e| handle_store_error(e, "Failed to sign in user"))?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    send_email_otp(state, &email).await?;
    Ok(user.account_id)
}

pub async fn verify_secret(
    state: &AppState,
    account_id: &str,
    secret: &str,
) -> Result<Session, AppError> {
    let session = state
        .identity
        .create_session(account_id, secret.trim())
        .await
        .map_err(|e| handle_store_error(e, "Failed to verify OTP"))?;
    tracing::info!(session_id = %session.id, account_id = %account_id, "User signed in");
    Ok(session)
}

/// Profile behind a session secret. `None` when the session is unknown or
/// expired; `NotFound` when the account has no profile.
pub async fn current_user(
    state: &AppState,
    session_secret: &str,
) -> Result<Option<UserProfile>, AppError> {
    let Some(account_id) = state
        .identity
        .session_account(session_secret)
        .await
        .map_err(|e| handle_store_error(e, "Failed to resolve session"))?
    else {
        return Ok(None);
    };

    state
        .identity
        .find_user_by_account(&account_id)
        .await
        .map_err(|e| handle_store_error(e, "Failed to load current user"))?
        .map(Some)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn current_principal(
    state: &AppState,
    session_secret: &str,
) -> Result<Option<Principal>, AppError> {
    Ok(current_user(state, session_secret)
        .await?
        .map(|user| user.principal()))
}

pub async fn get_profile(state: &AppState, principal: &Principal) -> Result<UserProfile, AppError> {
    state
        .identity
        .find_user_by_account(&principal.account_id)
        .await
        .map_err(|e| handle_store_error(e, "Failed to load user"))?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn sign_out(state: &AppState, session_secret: &str) -> Result<(), AppError> {
    state
        .identity
        .delete_session(session_secret)
        .await
        .map_err(|e| handle_store_error(e, "Failed to sign out user"))
}
