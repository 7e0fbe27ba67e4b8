use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::token::TokenError;

/// Domain errors surfaced to the HTTP layer. The transport mapping lives in
/// `IntoResponse`; handlers never build status codes by hand.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Account is not active. Please activate your account first.")]
    AccountNotActive,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Activation token not found or already used")]
    ActivationTokenInvalid,
    #[error("Category with this name already exists")]
    CategoryExists,
    #[error("Category not found")]
    CategoryNotFound,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail | Self::CategoryExists => StatusCode::CONFLICT,
            Self::AccountNotFound | Self::ActivationTokenInvalid | Self::CategoryNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::AccountNotActive => StatusCode::FORBIDDEN,
            Self::InvalidCredentials | Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // internal detail stays in the logs
            Self::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// True when `err` is a database unique-constraint violation on `constraint`.
/// Used to map insert races onto domain conflicts instead of 500s.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::AccountNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::AccountNotActive.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::ActivationTokenInvalid.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::CategoryExists.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn token_errors_are_unauthorized() {
        assert_eq!(
            ApiError::Token(TokenError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Token(TokenError::InvalidSignature).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn internal_errors_hide_detail_in_message() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused at 10.0.0.3"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
