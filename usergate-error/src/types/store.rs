use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки хранилищ пользователей и групп.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },
    /// Строка хранилища не декодируется в типизированную запись.
    #[error("Cannot decode row: {reason}")]
    Decode { reason: String },
}

/// Ошибки хранилища сессий.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Session store unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("Session data is corrupted for key {key}")]
    Corrupted { key: String },
}

impl ErrorExt for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unavailable { .. } => StatusCode::StorageUnavailable,
            Self::QueryFailed { .. } => StatusCode::QueryFailed,
            Self::Decode { .. } => StatusCode::DeserializationFailed,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn client_message(&self) -> String {
        "Internal server error".to_string()
    }
}

impl ErrorExt for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unavailable { .. } => StatusCode::SessionUnavailable,
            Self::Corrupted { .. } => StatusCode::CorruptedData,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
