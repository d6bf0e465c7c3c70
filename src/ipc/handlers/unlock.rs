use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::helpers::{db, opt_str, req_sheet_key, req_str};
use crate::ipc::types::{AppState, Request};
use crate::store::unlock::{self, ListFilter, UnlockRequest, STATUS_APPROVED, STATUS_PENDING};
use serde_json::json;

/// Wire form of a request. Older clients read `evolution`, so it is sent
/// alongside `evaluation`.
fn request_json(req: &UnlockRequest) -> serde_json::Value {
    let mut v = json!(req);
    v["evolution"] = json!(req.evaluation);
    v
}

fn handle_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let status = opt_str(&req.params, "status");
    if let Some(s) = status.as_deref() {
        if s != STATUS_PENDING && s != STATUS_APPROVED {
            return Err(AppError::validation_with(
                "status must be pending or approved",
                json!({ "status": s }),
            ));
        }
    }
    let filter = ListFilter {
        status,
        teacher_name: opt_str(&req.params, "teacherName"),
        subject: opt_str(&req.params, "subject"),
    };
    let requests: Vec<_> = unlock::list_requests(conn, &filter)?
        .iter()
        .map(request_json)
        .collect();
    Ok(json!({ "requests": requests }))
}

fn handle_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let teacher_name = req_str(&req.params, "teacherName")?;
    let key = req_sheet_key(&req.params)?;
    let created = unlock::create_request(conn, &teacher_name, &key)?;
    tracing::info!(
        id = %created.id,
        teacher = %created.teacher_name,
        subject = %created.subject,
        section = %created.section,
        evaluation = %created.evaluation,
        "unlock requested"
    );
    Ok(json!({ "request": request_json(&created) }))
}

fn handle_approve(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let id = req_str(&req.params, "id")?;
    let (request, change) = unlock::approve_request(conn, &id)?;
    tracing::info!(
        id = %request.id,
        subject = %request.subject,
        section = %request.section,
        from = %change.previous,
        "unlock approved; sheet reopened"
    );
    Ok(json!({
        "status": change.current.as_str(),
        "previousStatus": change.previous.as_str(),
    }))
}

/// Denial and teacher dismissal both just drop the request.
fn handle_remove(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let id = req_str(&req.params, "id")?;
    let removed = unlock::delete_request(conn, &id)?;
    tracing::info!(id = %removed.id, method = %req.method, "unlock request removed");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "unlock.list" => handle_list(state, req),
        "unlock.create" => handle_create(state, req),
        "unlock.approve" => handle_approve(state, req),
        "unlock.deny" | "unlock.delete" => handle_remove(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
