use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::token::AuthUser;
use crate::categories::dto::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use crate::categories::repo::{self, CategoryKind};
use crate::error::{is_unique_violation, ApiError};
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list))
        .route("/categories/:id", get(get_one))
        .route("/categories/kind/:kind", get(list_by_kind))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create))
        .route("/categories/:id", put(update))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("Category name must not be empty".into()));
    }

    // Pre-check gives the common case a clean conflict; the unique
    // constraint catches the create/create race.
    if repo::exists_by_name(&state.db, account_id, name).await? {
        warn!(account_id = %account_id, name = %name, "duplicate category name");
        return Err(ApiError::CategoryExists);
    }

    let category = repo::insert(
        &state.db,
        account_id,
        name,
        payload.icon.as_deref(),
        payload.kind,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e, "categories_account_id_name_key") {
            ApiError::CategoryExists
        } else {
            e.into()
        }
    })?;

    info!(account_id = %account_id, category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = repo::list_by_account(&state.db, account_id).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = repo::find_by_id(&state.db, account_id, id)
        .await?
        .ok_or(ApiError::CategoryNotFound)?;
    Ok(Json(category.into()))
}

#[instrument(skip(state))]
pub async fn list_by_kind(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    Path(kind): Path<CategoryKind>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = repo::list_by_kind(&state.db, account_id, kind).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("Category name must not be empty".into()));
    }

    let updated = repo::update(&state.db, account_id, id, name, payload.icon.as_deref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "categories_account_id_name_key") {
                ApiError::CategoryExists
            } else {
                e.into()
            }
        })?
        .ok_or(ApiError::CategoryNotFound)?;

    info!(account_id = %account_id, category_id = %updated.id, "category updated");
    Ok(Json(updated.into()))
}
