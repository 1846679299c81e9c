use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки загрузки пользователя и работы с паролями.
#[derive(Debug, Clone, Error)]
pub enum UserError {
    /// Хранилище не знает пользователя с таким id. `message` уже
    /// локализовано.
    #[error("{message}")]
    NotFound { id: u64, message: String },
    /// Параметры пользователя нельзя превратить в реестр.
    #[error("Invalid user params: {reason}")]
    InvalidParams { reason: String },
    /// Ошибка хеширования пароля.
    #[error("Password hashing failed: {reason}")]
    PasswordHashFailed { reason: String },
    /// Параметры алгоритма хеширования вне допустимого диапазона.
    #[error("Invalid hash options: {reason}")]
    InvalidHashOptions { reason: String },
}

impl ErrorExt for UserError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::UserNotFound,
            Self::InvalidParams { .. } => StatusCode::InvalidData,
            Self::PasswordHashFailed { .. } => StatusCode::PasswordHashFailed,
            Self::InvalidHashOptions { .. } => StatusCode::InvalidArgs,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::PasswordHashFailed { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "user".to_string()),
            ("status_code", self.status_code().to_string()),
        ];
        if let Self::NotFound { id, .. } = self {
            tags.push(("user_id", id.to_string()));
        }
        tags
    }
}
