use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Whether a category tracks money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "category_kind", rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

/// Category record in the database. `(account_id, name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub kind: CategoryKind,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub async fn exists_by_name(db: &PgPool, account_id: Uuid, name: &str) -> sqlx::Result<bool> {
    sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM categories WHERE account_id = $1 AND name = $2
        )
        "#,
    )
    .bind(account_id)
    .bind(name)
    .fetch_one(db)
    .await
}

pub async fn insert(
    db: &PgPool,
    account_id: Uuid,
    name: &str,
    icon: Option<&str>,
    kind: CategoryKind,
) -> sqlx::Result<Category> {
    sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (account_id, name, icon, kind)
        VALUES ($1, $2, $3, $4)
        RETURNING id, account_id, name, icon, kind, created_at, updated_at
        "#,
    )
    .bind(account_id)
    .bind(name)
    .bind(icon)
    .bind(kind)
    .fetch_one(db)
    .await
}

pub async fn list_by_account(db: &PgPool, account_id: Uuid) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, account_id, name, icon, kind, created_at, updated_at
        FROM categories
        WHERE account_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(account_id)
    .fetch_all(db)
    .await
}

pub async fn list_by_kind(
    db: &PgPool,
    account_id: Uuid,
    kind: CategoryKind,
) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, account_id, name, icon, kind, created_at, updated_at
        FROM categories
        WHERE account_id = $1 AND kind = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(account_id)
    .bind(kind)
    .fetch_all(db)
    .await
}

pub async fn find_by_id(
    db: &PgPool,
    account_id: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, account_id, name, icon, kind, created_at, updated_at
        FROM categories
        WHERE id = $1 AND account_id = $2
        "#,
    )
    .bind(id)
    .bind(account_id)
    .fetch_optional(db)
    .await
}

/// Update name/icon of an owned category; returns `None` when the row does
/// not exist or belongs to another account.
pub async fn update(
    db: &PgPool,
    account_id: Uuid,
    id: Uuid,
    name: &str,
    icon: Option<&str>,
) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories
        SET name = $3, icon = $4, updated_at = now()
        WHERE id = $1 AND account_id = $2
        RETURNING id, account_id, name, icon, kind, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(account_id)
    .bind(name)
    .bind(icon)
    .fetch_optional(db)
    .await
}
