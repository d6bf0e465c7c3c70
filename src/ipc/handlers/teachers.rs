use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::helpers::{db, req_str};
use crate::ipc::types::{AppState, Request};
use crate::store::teachers;
use serde_json::json;

fn handle_list(state: &mut AppState, _req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let list = teachers::list_teachers(conn)?;
    Ok(json!({ "teachers": list }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let unique_id = req_str(&req.params, "uniqueId")?;
    teachers::delete_teacher(conn, &unique_id)?;
    tracing::info!(unique_id = %unique_id, "teacher deleted");
    Ok(json!({ "ok": true }))
}

fn handle_reset_password(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let unique_id = req_str(&req.params, "uniqueId")?;
    // Passwords are compared verbatim, so keep them untrimmed.
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    teachers::reset_password(conn, &unique_id, password)?;
    tracing::info!(unique_id = %unique_id, "teacher password reset");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "teachers.list" => handle_list(state, req),
        "teachers.delete" => handle_delete(state, req),
        "teachers.resetPassword" => handle_reset_password(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
