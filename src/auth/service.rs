use base64ct::{Base64UrlUnpadded, Encoding};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::dto::SessionResponse;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{Account, AccountStatus};
use crate::auth::token::TokenCodec;
use crate::error::{is_unique_violation, ApiError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// One-time token proving control of the registration email. 256 bits of
/// OS randomness, so no uniqueness re-check against the table is needed.
pub(crate) fn generate_activation_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Create a pending account with a fresh activation token.
pub async fn register(
    db: &PgPool,
    email: &str,
    password: &str,
    name: &str,
) -> Result<Account, ApiError> {
    let email = normalize_email(email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::InvalidInput("Invalid email".into()));
    }
    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::InvalidInput("Password too short".into()));
    }
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput("Name must not be empty".into()));
    }

    // Pre-check for a friendly error; the unique constraint below is the
    // real guard against the check/insert race.
    if Account::find_by_email(db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(password)?;
    let activation_token = generate_activation_token();

    let account = Account::insert_pending(db, &email, &hash, name.trim(), &activation_token)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "accounts_email_key") {
                ApiError::DuplicateEmail
            } else {
                e.into()
            }
        })?;

    info!(account_id = %account.id, email = %account.email, "account registered");
    Ok(account)
}

/// Consume an activation token, flipping the account to active. Returns
/// `false` for an unknown or already-consumed token; callers must not
/// distinguish the two cases externally.
pub async fn activate(db: &PgPool, token: &str) -> Result<bool, ApiError> {
    let consumed = Account::consume_activation_token(db, token).await?;
    if consumed {
        info!("account activated");
    } else {
        // audit trail only; the response stays ambiguous
        warn!("activation attempt with unknown or consumed token");
    }
    Ok(consumed)
}

/// Whether the account behind `email` has been activated.
pub async fn is_active(db: &PgPool, email: &str) -> Result<bool, ApiError> {
    let email = normalize_email(email);
    let account = Account::find_by_email(db, &email)
        .await?
        .ok_or(ApiError::AccountNotFound)?;
    Ok(account.status == AccountStatus::Active)
}

/// Login: resolve account, require active status, verify the password,
/// mint the session pair. The active check runs before credential
/// verification; inactive accounts are refused up front.
pub async fn login(
    db: &PgPool,
    tokens: &TokenCodec,
    email: &str,
    password: &str,
) -> Result<SessionResponse, ApiError> {
    let email = normalize_email(email);

    let account = Account::find_by_email(db, &email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            ApiError::AccountNotFound
        })?;

    if account.status != AccountStatus::Active {
        warn!(account_id = %account.id, "login refused for inactive account");
        return Err(ApiError::AccountNotActive);
    }

    if !verify_password(password, &account.password_hash)? {
        warn!(account_id = %account.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let (token, expires_at) = tokens.issue_session(account.id)?;
    let (refresh_token, _) = tokens.issue_refresh(account.id)?;

    info!(account_id = %account.id, email = %account.email, "login");
    Ok(SessionResponse {
        token,
        refresh_token,
        account_id: account.id,
        email: account.email,
        expires_at,
    })
}

/// Dev-only: look up the still-pending activation token for an email.
#[cfg(feature = "dev-endpoints")]
pub async fn peek_activation_token(
    db: &PgPool,
    email: &str,
) -> Result<Option<String>, ApiError> {
    let email = normalize_email(email);
    Ok(Account::pending_activation_token(db, &email).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@at@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("a@nodot"));
    }

    #[test]
    fn emails_are_normalized_case_insensitively() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn activation_tokens_are_long_and_unique() {
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let token = generate_activation_token();
            // 32 bytes -> 43 chars of unpadded base64url
            assert_eq!(token.len(), 43);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert!(seen.insert(token));
        }
    }
}
