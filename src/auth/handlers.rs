use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{
    ActivateQuery, ActivationMessage, LoginRequest, PublicAccount, RefreshRequest,
    RegisterRequest, SessionResponse,
};
use crate::auth::repo::{Account, AccountStatus};
use crate::auth::service;
use crate::auth::token::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/activate", get(activate))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[cfg(feature = "dev-endpoints")]
pub fn dev_routes() -> Router<AppState> {
    Router::new().route("/dev/activation-token", get(dev_activation_token))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicAccount>), ApiError> {
    let account =
        service::register(&state.db, &payload.email, &payload.password, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

#[instrument(skip(state, query))]
pub async fn activate(
    State(state): State<AppState>,
    Query(query): Query<ActivateQuery>,
) -> Result<Json<ActivationMessage>, ApiError> {
    if service::activate(&state.db, &query.token).await? {
        Ok(Json(ActivationMessage {
            message: "Account activated successfully",
        }))
    } else {
        Err(ApiError::ActivationTokenInvalid)
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    // Inactive accounts are refused before the password is ever checked.
    if !service::is_active(&state.db, &payload.email).await? {
        return Err(ApiError::AccountNotActive);
    }
    let session =
        service::login(&state.db, &state.tokens, &payload.email, &payload.password).await?;
    Ok(Json(session))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let claims = state.tokens.verify_refresh(&payload.refresh_token)?;

    let account = Account::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::AccountNotFound)?;
    if account.status != AccountStatus::Active {
        return Err(ApiError::AccountNotActive);
    }

    let (token, expires_at) = state.tokens.issue_session(account.id)?;
    let (refresh_token, _) = state.tokens.issue_refresh(account.id)?;
    Ok(Json(SessionResponse {
        token,
        refresh_token,
        account_id: account.id,
        email: account.email,
        expires_at,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
) -> Result<Json<PublicAccount>, ApiError> {
    let account = Account::find_by_id(&state.db, account_id)
        .await?
        .ok_or(ApiError::AccountNotFound)?;
    Ok(Json(account.into()))
}

#[cfg(feature = "dev-endpoints")]
#[instrument(skip(state))]
pub async fn dev_activation_token(
    State(state): State<AppState>,
    Query(query): Query<crate::auth::dto::EmailQuery>,
) -> Result<Json<crate::auth::dto::DevActivationToken>, ApiError> {
    let token = service::peek_activation_token(&state.db, &query.email)
        .await?
        .ok_or(ApiError::AccountNotFound)?;
    Ok(Json(crate::auth::dto::DevActivationToken {
        activation_link: format!(
            "http://localhost:8080/api/v1/activate?token={token}"
        ),
        email: query.email,
        activation_token: token,
    }))
}
