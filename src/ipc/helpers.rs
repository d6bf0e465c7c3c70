use rusqlite::Connection;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::ipc::types::AppState;
use crate::marks::{Evaluation, SheetKey};

pub fn db(state: &AppState) -> AppResult<&Connection> {
    state.db.as_ref().ok_or(AppError::NoWorkspace)
}

pub fn opt_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn req_str(params: &serde_json::Value, key: &str) -> AppResult<String> {
    opt_str(params, key).ok_or_else(|| AppError::validation(format!("missing {key}")))
}

/// Integer or numeric string; form fields arrive as either.
fn int_like(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn req_year(params: &serde_json::Value) -> AppResult<i64> {
    match params.get("year").and_then(int_like) {
        Some(y) if y > 0 => Ok(y),
        _ => Err(AppError::validation_with(
            "missing/invalid year",
            json!({ "year": params.get("year") }),
        )),
    }
}

pub fn opt_year(params: &serde_json::Value) -> AppResult<Option<i64>> {
    match params.get("year") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(_) => req_year(params).map(Some),
    }
}

pub fn req_roll(params: &serde_json::Value) -> AppResult<u32> {
    match params.get("roll").and_then(int_like) {
        Some(r) if r > 0 && r <= i64::from(u32::MAX) => Ok(r as u32),
        _ => Err(AppError::validation_with(
            "missing/invalid roll",
            json!({ "roll": params.get("roll") }),
        )),
    }
}

/// `evaluation`, or the older `evolution` spelling, as 1/2/3.
pub fn req_evaluation(params: &serde_json::Value) -> AppResult<Evaluation> {
    let raw = params.get("evaluation").or_else(|| params.get("evolution"));
    raw.and_then(int_like)
        .and_then(|n| Evaluation::parse(&n.to_string()))
        .ok_or_else(|| {
            AppError::validation_with(
                "evaluation must be one of 1, 2, 3",
                json!({ "evaluation": raw }),
            )
        })
}

pub fn req_sheet_key(params: &serde_json::Value) -> AppResult<SheetKey> {
    let year = req_year(params)?;
    let section = req_str(params, "section")?;
    let subject = req_str(params, "subject")?;
    let evaluation = req_evaluation(params)?;
    SheetKey::new(year, section, subject, evaluation)
}

pub fn opt_bool(params: &serde_json::Value, key: &str) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_and_evaluation_accept_strings_and_numbers() {
        assert_eq!(req_year(&json!({ "year": "2025" })).expect("year"), 2025);
        assert_eq!(req_year(&json!({ "year": 2025 })).expect("year"), 2025);
        assert!(req_year(&json!({ "year": "twenty" })).is_err());
        assert!(req_year(&json!({})).is_err());

        assert_eq!(
            req_evaluation(&json!({ "evaluation": "3" })).expect("eval"),
            Evaluation::Third
        );
        assert_eq!(
            req_evaluation(&json!({ "evolution": 2 })).expect("eval"),
            Evaluation::Second
        );
        assert!(req_evaluation(&json!({ "evaluation": "4" })).is_err());
    }

    #[test]
    fn sheet_key_reports_first_missing_field() {
        let e = req_sheet_key(&json!({ "year": 2025, "subject": "MATH", "evaluation": 1 }))
            .expect_err("missing section");
        assert_eq!(e.to_string(), "missing section");
    }

    #[test]
    fn roll_must_be_positive() {
        assert_eq!(req_roll(&json!({ "roll": "7" })).expect("roll"), 7);
        assert!(req_roll(&json!({ "roll": 0 })).is_err());
        assert!(req_roll(&json!({ "roll": -2 })).is_err());
    }
}
