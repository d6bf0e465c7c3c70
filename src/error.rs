use serde_json::json;

/// Failure taxonomy shared by the store, the lifecycle engine and the IPC
/// handlers. Every variant maps onto one wire error code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{entity} not found")]
    NotFound {
        entity: &'static str,
        details: Option<serde_json::Value>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("select a workspace first")]
    NoWorkspace,

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: serde_json::Value) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn not_found(entity: &'static str, details: serde_json::Value) -> Self {
        AppError::NotFound {
            entity,
            details: Some(details),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "bad_params",
            AppError::Conflict(_) => "conflict",
            AppError::NotFound { .. } => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NoWorkspace => "no_workspace",
            AppError::Storage(_) => "db_query_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation { details, .. } | AppError::NotFound { details, .. } => {
                details.clone()
            }
            AppError::Storage(e) => Some(json!({ "cause": e.to_string() })),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_taxonomy() {
        assert_eq!(AppError::validation("x").code(), "bad_params");
        assert_eq!(AppError::Conflict("dup".into()).code(), "conflict");
        assert_eq!(
            AppError::not_found("unlock request", json!({ "id": "a" })).code(),
            "not_found"
        );
        assert_eq!(AppError::NoWorkspace.code(), "no_workspace");
        assert_eq!(
            AppError::Storage(rusqlite::Error::InvalidQuery).code(),
            "db_query_failed"
        );
    }

    #[test]
    fn not_found_message_names_entity() {
        let e = AppError::not_found("teacher", json!({ "uniqueId": "X" }));
        assert_eq!(e.to_string(), "teacher not found");
        assert_eq!(e.details(), Some(json!({ "uniqueId": "X" })));
    }
}
