use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::helpers::{db, req_str};
use crate::ipc::types::{AppState, Request};
use crate::session::SessionError;
use crate::store::teachers;
use chrono::Utc;
use serde_json::json;

const ADMIN_DISPLAY_NAME: &str = "Class Teacher (Admin)";

fn handle_register(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let full_name = req_str(&req.params, "fullName")?;
    let subject = req_str(&req.params, "subject")?;
    // Passwords are compared verbatim, so keep them untrimmed.
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let teacher = teachers::register(conn, &full_name, &subject, password)?;
    tracing::info!(unique_id = %teacher.unique_id, subject = %teacher.subject, "teacher registered");
    Ok(json!({ "uniqueId": teacher.unique_id }))
}

fn handle_login(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let unique_id = req_str(&req.params, "uniqueId")?;
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    if unique_id == state.config.admin_id && password == state.config.admin_password() {
        let (token, inbox) = match state.sessions.open(Utc::now()) {
            Ok(v) => v,
            Err(SessionError::AlreadyActive) => {
                tracing::warn!("admin login refused: a session is already active");
                return Err(AppError::Conflict(SessionError::AlreadyActive.to_string()));
            }
        };
        // A successful open means every earlier session is gone.
        state.session_inboxes.clear();
        state.session_inboxes.insert(token.clone(), inbox);
        tracing::info!("admin logged in");
        return Ok(json!({
            "isAdmin": true,
            "sessionToken": token,
            "user": { "uniqueId": state.config.admin_id, "fullName": ADMIN_DISPLAY_NAME },
        }));
    }

    let conn = db(state)?;
    match teachers::get_teacher(conn, &unique_id)? {
        Some(t) if t.password == password => {
            tracing::info!(unique_id = %t.unique_id, "teacher logged in");
            Ok(json!({
                "isAdmin": false,
                "user": {
                    "uniqueId": t.unique_id,
                    "fullName": t.full_name,
                    "subject": t.subject,
                },
            }))
        }
        _ => Err(AppError::Unauthorized("wrong unique id or password".into())),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let token = req_str(&req.params, "sessionToken")?;
    let closed = state.sessions.close(&token);
    state.session_inboxes.remove(&token);
    if closed {
        tracing::info!("admin logged out");
    }
    Ok(json!({ "closed": closed }))
}

fn handle_notices(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let token = req_str(&req.params, "sessionToken")?;
    if !state.sessions.touch(&token, Utc::now()) {
        state.session_inboxes.remove(&token);
        return Err(AppError::Unauthorized("admin session expired or unknown".into()));
    }
    let notices: Vec<_> = state
        .session_inboxes
        .get(&token)
        .map(|rx| rx.try_iter().collect())
        .unwrap_or_default();
    Ok(json!({ "notices": notices }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "auth.register" => handle_register(state, req),
        "auth.login" => handle_login(state, req),
        "admin.logout" => handle_logout(state, req),
        "admin.notices" => handle_notices(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
