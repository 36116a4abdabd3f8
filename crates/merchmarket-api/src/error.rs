//! API error handling
//!
//! Every failure renders as `{"error": "<message>", "code": "<CODE>"}`.
//! Messages are fixed client-facing strings; the underlying cause is only
//! logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use merchmarket_auth::AuthError;
use merchmarket_db::DbError;
use merchmarket_ledger::{AccountRole, LedgerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Body missing, unparsable or failing field validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Protected handler reached without an identity
    #[error("No authenticated user on request")]
    Unauthorized,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Ledger(e) => match e {
                LedgerError::InvalidAmount { .. }
                | LedgerError::MissingItem
                | LedgerError::SelfTransfer
                | LedgerError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
                LedgerError::AccountNotFound { .. } | LedgerError::ItemNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                LedgerError::Storage(_) | LedgerError::Commit(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Auth(e) => e.error_code(),
            Self::Ledger(e) => match e {
                LedgerError::InvalidAmount { .. }
                | LedgerError::MissingItem
                | LedgerError::SelfTransfer => "VALIDATION_ERROR",
                LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
                LedgerError::AccountNotFound { .. } | LedgerError::ItemNotFound { .. } => {
                    "NOT_FOUND"
                }
                LedgerError::Storage(_) | LedgerError::Commit(_) => "INTERNAL_ERROR",
            },
            Self::Storage(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to clients
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "Неверный запрос",
            Self::Unauthorized => "Пользователь не авторизован",
            Self::Auth(e) => e.client_message(),
            Self::Ledger(e) => match e {
                LedgerError::InvalidAmount { .. } => "Сумма перевода должна быть положительной",
                LedgerError::MissingItem => "Не указан предмет для покупки",
                LedgerError::SelfTransfer => "Нельзя отправить монеты самому себе",
                LedgerError::InsufficientFunds { .. } => "Недостаточно средств",
                LedgerError::AccountNotFound { role, .. } => match role {
                    AccountRole::Source => "Ошибка при получении отправителя",
                    AccountRole::Destination => "Получатель не найден",
                    AccountRole::Buyer => "Пользователь не найден",
                    AccountRole::Owner => "Не удалось найти пользователя",
                },
                LedgerError::ItemNotFound { .. } => "Товар не найден",
                LedgerError::Commit(_) => "Ошибка при сохранении транзакции",
                LedgerError::Storage(_) => "Внутренняя ошибка сервера",
            },
            Self::Storage(_) => "Внутренняя ошибка сервера",
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    #[schema(example = "Недостаточно средств")]
    pub error: String,
    /// Machine-readable error code
    #[schema(example = "INSUFFICIENT_FUNDS")]
    pub code: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.message().to_string(),
            code: err.error_code().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "Request rejected");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
