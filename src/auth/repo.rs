use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Account lifecycle; activation is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Active,
}

/// Account record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub name: String,
    pub status: AccountStatus,
    #[serde(skip_serializing)]
    pub activation_token: Option<String>, // set only while status = pending
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Account {
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<Account>> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, name, status, activation_token,
                   created_at, updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Account>> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, name, status, activation_token,
                   created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Insert a new pending account holding a fresh activation token.
    pub async fn insert_pending(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        name: &str,
        activation_token: &str,
    ) -> sqlx::Result<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, password_hash, name, status, activation_token)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING id, email, password_hash, name, status, activation_token,
                      created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(activation_token)
        .fetch_one(db)
        .await
    }

    /// Atomically consume an activation token: the conditional UPDATE lets
    /// at most one concurrent caller win; a re-used or unknown token
    /// matches zero rows.
    pub async fn consume_activation_token(db: &PgPool, token: &str) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET status = 'active', activation_token = NULL, updated_at = now()
            WHERE activation_token = $1 AND status = 'pending'
            "#,
        )
        .bind(token)
        .execute(db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Still-pending activation token for an email, if any.
    #[cfg(feature = "dev-endpoints")]
    pub async fn pending_activation_token(
        db: &PgPool,
        email: &str,
    ) -> sqlx::Result<Option<String>> {
        let row: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT activation_token
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(row.flatten())
    }
}
