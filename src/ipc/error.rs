use serde_json::json;

use crate::error::{AppError, AppResult};

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Turn a handler outcome into a response line, logging failures.
pub fn respond(id: &str, method: &str, result: AppResult<serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => {
            match &e {
                AppError::Storage(cause) => {
                    tracing::error!(request_id = id, method, error = %cause, "storage failure");
                }
                other => {
                    tracing::warn!(
                        request_id = id,
                        method,
                        code = other.code(),
                        error = %other,
                        "request rejected"
                    );
                }
            }
            err(id, e.code(), e.to_string(), e.details())
        }
    }
}
