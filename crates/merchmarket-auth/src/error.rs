//! Authentication error types
//!
//! Every variant knows its HTTP status, a stable machine-readable code and
//! the message shown to clients. Client messages are fixed strings that
//! existing callers match on; internal details only reach the logs.

use merchmarket_db::DbError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // Request Errors
    // =========================================================================
    /// Username or password missing or unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No Authorization header on a protected request
    #[error("Authorization header is missing")]
    MissingAuthHeader,

    /// Authorization header is not `Bearer <token>`
    #[error("Authorization header is malformed")]
    MalformedAuthHeader,

    // =========================================================================
    // Token Errors
    // =========================================================================
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Token is invalid (malformed, wrong signature, etc.)
    #[error("Invalid token")]
    InvalidToken,

    // =========================================================================
    // Credential Errors
    // =========================================================================
    /// Password does not match the stored hash
    #[error("Invalid credentials")]
    InvalidCredentials,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Password hashing failed
    #[error("Password hashing failed")]
    PasswordHashingFailed,

    /// Token encoding failed
    #[error("Token signing failed: {0}")]
    TokenSigningFailed(String),

    /// Account lookup failed in storage
    #[error("Account lookup failed: {0}")]
    AccountLookupFailed(#[source] DbError),

    /// Account insert failed in storage
    #[error("Account creation failed: {0}")]
    AccountCreationFailed(#[source] DbError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not be exposed to clients)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,

            Self::MissingAuthHeader
            | Self::MalformedAuthHeader
            | Self::TokenExpired
            | Self::InvalidToken
            | Self::InvalidCredentials => 401,

            Self::PasswordHashingFailed
            | Self::TokenSigningFailed(_)
            | Self::AccountLookupFailed(_)
            | Self::AccountCreationFailed(_)
            | Self::Config(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Get an error code for the client (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_REQUEST",
            Self::MissingAuthHeader => "UNAUTHENTICATED",
            Self::MalformedAuthHeader => "INVALID_AUTH_HEADER",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::PasswordHashingFailed
            | Self::TokenSigningFailed(_)
            | Self::AccountLookupFailed(_)
            | Self::AccountCreationFailed(_)
            | Self::Config(_)
            | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to clients
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "Неверный запрос",
            Self::MissingAuthHeader => "Требуется заголовок Authorization",
            Self::MalformedAuthHeader => "Неверный формат заголовка Authorization",
            Self::TokenExpired | Self::InvalidToken => "Неверный или просроченный токен",
            Self::InvalidCredentials => "Неверный пароль",
            Self::PasswordHashingFailed => "Ошибка при генерации хеша",
            Self::TokenSigningFailed(_) => "Не удалось создать токен",
            Self::AccountLookupFailed(_) => "Ошибка при поиске пользователя",
            Self::AccountCreationFailed(_) => "Не удалось создать пользователя",
            Self::Config(_) | Self::Internal(_) => "Внутренняя ошибка сервера",
        }
    }
}

/// Error body returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Error code (machine-readable)
    pub code: String,
}

impl From<&AuthError> for ErrorResponse {
    fn from(error: &AuthError) -> Self {
        Self {
            error: error.client_message().to_string(),
            code: error.error_code().to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}
