use crate::consolidate;
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::helpers::{db, req_str, req_year};
use crate::ipc::types::{AppState, Request};
use crate::store::{marksheets, roster};
use serde_json::json;

fn handle_consolidated(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = req_year(&req.params)?;
    let section = req_str(&req.params, "section")?;
    let students = roster::get_roster(conn, year, &section)?;
    let sheets = marksheets::get_all_sheets(conn, year, &section)?;

    let view = consolidate::consolidate(year, &section, &state.config.subjects, &students, &sheets);
    if !view.orphaned_rolls.is_empty() {
        tracing::info!(
            year,
            section = %section,
            orphaned = view.orphaned_rolls.len(),
            "marks held for rolls not on the roster"
        );
    }
    Ok(json!(view))
}

fn handle_subject_view(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = req_year(&req.params)?;
    let section = req_str(&req.params, "section")?;
    let subject = req_str(&req.params, "subject")?;
    let students = roster::get_roster(conn, year, &section)?;
    let sheets = marksheets::get_all_sheets(conn, year, &section)?;

    Ok(json!(consolidate::subject_view(
        year, &section, &subject, &students, &sheets
    )))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "marks.consolidated" => handle_consolidated(state, req),
        "marks.subjectView" => handle_subject_view(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
