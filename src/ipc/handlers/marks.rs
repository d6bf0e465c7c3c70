use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::helpers::{db, opt_bool, req_roll, req_sheet_key, req_str, req_year};
use crate::ipc::types::{AppState, Request};
use crate::lifecycle::{self, Transition};
use crate::marks::{self, MarkField, SheetStatus};
use crate::store::{marksheets, roster};
use serde_json::json;

fn roster_rolls(
    conn: &rusqlite::Connection,
    year: i64,
    section: &str,
) -> AppResult<Vec<u32>> {
    Ok(roster::get_roster(conn, year, section)?
        .into_iter()
        .map(|s| s.roll)
        .collect())
}

fn handle_get(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let key = req_sheet_key(&req.params)?;
    let sheet = marksheets::get_sheet(conn, &key)?;
    let rolls = roster_rolls(conn, key.year, &key.section)?;

    Ok(json!({
        "sheet": sheet.to_json(),
        "controls": lifecycle::controls(sheet.status),
        "missingRolls": lifecycle::missing_rolls(rolls, &sheet.entries),
        "warnings": marks::bounds_warnings(key.evaluation, &sheet.entries),
    }))
}

fn handle_save(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let key = req_sheet_key(&req.params)?;
    let raw_status = req_str(&req.params, "status")?;
    let target = SheetStatus::parse(&raw_status).ok_or_else(|| {
        AppError::validation_with(
            "status must be one of: draft, submitted, pending_unlock",
            json!({ "status": raw_status }),
        )
    })?;
    let transition = Transition::for_save_target(target)?;
    // Entries are replaced wholesale; only an explicit `{}` clears the sheet.
    let entries = match req.params.get("entries") {
        None | Some(serde_json::Value::Null) => {
            return Err(AppError::validation("missing entries"));
        }
        Some(raw) => marks::parse_entries(raw)?,
    };

    let change = marksheets::save_sheet(conn, &key, transition, &entries)?;
    let rolls = roster_rolls(conn, key.year, &key.section)?;
    tracing::info!(
        year = key.year,
        section = %key.section,
        subject = %key.subject,
        evaluation = %key.evaluation,
        from = %change.previous,
        to = %change.current,
        "marksheet saved"
    );

    Ok(json!({
        "status": change.current.as_str(),
        "previousStatus": change.previous.as_str(),
        "warnings": marks::bounds_warnings(key.evaluation, &entries),
        "missingRolls": lifecycle::missing_rolls(rolls, &entries),
    }))
}

fn handle_update_cell(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let key = req_sheet_key(&req.params)?;
    let roll = req_roll(&req.params)?;
    let raw_field = req_str(&req.params, "field")?;
    let field = MarkField::parse(&raw_field).ok_or_else(|| {
        AppError::validation_with(
            "field must be written or practical",
            json!({ "field": raw_field }),
        )
    })?;
    let raw_value = match req.params.get("value") {
        None => String::new(),
        Some(v) => marks::mark_value_text(v).ok_or_else(|| {
            AppError::validation("value must be a string, number or null")
        })?,
    };
    let value = marks::canonical_mark(&raw_value);
    let admin = opt_bool(&req.params, "admin");

    if !admin {
        let current = marksheets::get_status(conn, &key)?.unwrap_or(SheetStatus::New);
        if !lifecycle::is_editable(current) {
            return Err(AppError::Conflict(format!(
                "sheet is {current} and cannot be edited"
            )));
        }
    }

    let status = marksheets::set_cell(conn, &key, roll, field, value.as_deref())?;
    tracing::debug!(
        subject = %key.subject,
        evaluation = %key.evaluation,
        roll,
        field = field.as_str(),
        admin,
        "cell updated"
    );
    let warnings: Vec<_> = marks::check_bound(key.evaluation, roll, field, value.as_deref())
        .into_iter()
        .collect();

    Ok(json!({
        "status": status.as_str(),
        "value": value,
        "warnings": warnings,
    }))
}

fn handle_list_section(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = req_year(&req.params)?;
    let section = req_str(&req.params, "section")?;
    let sheets: Vec<serde_json::Value> = marksheets::get_all_sheets(conn, year, &section)?
        .iter()
        .map(|s| s.to_json())
        .collect();
    Ok(json!({ "sheets": sheets }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "marks.get" => handle_get(state, req),
        "marks.save" => handle_save(state, req),
        "marks.updateCell" => handle_update_cell(state, req),
        "marks.listSection" => handle_list_section(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
