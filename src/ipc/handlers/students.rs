use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::helpers::{db, req_roll, req_str, req_year};
use crate::ipc::types::{AppState, Request};
use crate::store::roster::{self, Student};
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = req_year(&req.params)?;
    let section = req_str(&req.params, "section")?;
    let students = roster::get_roster(conn, year, &section)?;
    Ok(json!({ "students": students }))
}

fn handle_set(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = req_year(&req.params)?;
    let section = req_str(&req.params, "section")?;
    let Some(raw) = req.params.get("students") else {
        return Err(AppError::validation("missing students"));
    };
    let students: Vec<Student> = serde_json::from_value(raw.clone()).map_err(|e| {
        AppError::validation_with(
            "students must be a list of {roll, name}",
            json!({ "error": e.to_string() }),
        )
    })?;

    let count = roster::set_roster(conn, year, &section, &students)?;
    tracing::info!(year, section = %section, count, "roster replaced");
    Ok(json!({ "count": count }))
}

/// `names` is either one comma-separated string or an array of strings.
fn upload_names(params: &serde_json::Value) -> AppResult<Vec<String>> {
    match params.get("names") {
        Some(serde_json::Value::String(s)) => Ok(s.split(',').map(str::to_string).collect()),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::validation("names must be strings"))
            })
            .collect(),
        _ => Err(AppError::validation("missing names")),
    }
}

fn handle_upload(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = req_year(&req.params)?;
    let section = req_str(&req.params, "section")?;
    let students = roster::roster_from_names(upload_names(&req.params)?);
    if students.is_empty() {
        return Err(AppError::validation("no student names given"));
    }

    let count = roster::set_roster(conn, year, &section, &students)?;
    tracing::info!(year, section = %section, count, "roster uploaded");
    Ok(json!({ "count": count, "students": students }))
}

fn handle_rename(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = req_year(&req.params)?;
    let section = req_str(&req.params, "section")?;
    let roll = req_roll(&req.params)?;
    let name = req_str(&req.params, "name")?;
    roster::rename_student(conn, year, &section, roll, &name)?;
    Ok(json!({ "ok": true }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = req_year(&req.params)?;
    let section = req_str(&req.params, "section")?;
    let roll = req_roll(&req.params)?;
    roster::remove_student(conn, year, &section, roll)?;
    tracing::info!(year, section = %section, roll, "student removed from roster");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_list(state, req),
        "students.set" => handle_set(state, req),
        "students.upload" => handle_upload(state, req),
        "students.rename" => handle_rename(state, req),
        "students.delete" => handle_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
