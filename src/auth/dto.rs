use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::{Account, AccountStatus};

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Query string for the activation endpoint.
#[derive(Debug, Deserialize)]
pub struct ActivateQuery {
    pub token: String,
}

/// Session payload returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub refresh_token: String,
    pub account_id: Uuid,
    pub email: String,
    pub expires_at: OffsetDateTime,
}

/// Public part of an account returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicAccount {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: AccountStatus,
    pub created_at: OffsetDateTime,
}

impl From<Account> for PublicAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            status: account.status,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivationMessage {
    pub message: &'static str,
}

#[cfg(feature = "dev-endpoints")]
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[cfg(feature = "dev-endpoints")]
#[derive(Debug, Serialize)]
pub struct DevActivationToken {
    pub email: String,
    pub activation_token: String,
    pub activation_link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_account_never_serializes_secrets() {
        let account = Account {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            name: "A".into(),
            status: AccountStatus::Pending,
            activation_token: Some("one-time-token".into()),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicAccount::from(account)).expect("serialize");
        assert!(json.contains("a@x.com"));
        assert!(json.contains("pending"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("one-time-token"));
    }
}
