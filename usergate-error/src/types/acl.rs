use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки сервиса ACL.
#[derive(Debug, Clone, Error)]
pub enum AclError {
    /// Невалидное правило (плохой glob-шаблон секции или действия).
    #[error("Invalid ACL rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },
    /// Группа не зарегистрирована в ACL.
    #[error("Unknown user group: {id}")]
    UnknownGroup { id: u64 },
    /// Границы nested-set группы некорректны.
    #[error("Invalid bounds for group {id}: lft={lft}, rgt={rgt}")]
    InvalidBounds { id: u64, lft: i64, rgt: i64 },
}

impl ErrorExt for AclError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRule { .. } => StatusCode::InvalidAclRule,
            Self::UnknownGroup { .. } => StatusCode::NotFound,
            Self::InvalidBounds { .. } => StatusCode::InvalidData,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
