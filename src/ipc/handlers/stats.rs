use crate::config::current_year;
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::helpers::{db, opt_year};
use crate::ipc::types::{AppState, Request};
use crate::store::{roster, teachers, unlock};
use serde_json::json;

fn handle_overview(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = db(state)?;
    let year = opt_year(&req.params)?.unwrap_or_else(current_year);

    let total_teachers = teachers::list_teachers(conn)?.len();
    let per_class = roster::count_by_section(conn, year)?;
    let total_students: i64 = per_class.iter().map(|(_, n)| n).sum();
    let pending = unlock::count_pending(conn)?;

    let students_per_class: serde_json::Map<String, serde_json::Value> = per_class
        .into_iter()
        .map(|(section, n)| (section, json!(n)))
        .collect();

    Ok(json!({
        "totalTeachers": total_teachers,
        "totalStudents": total_students,
        "pendingRequests": pending,
        "currentYear": year,
        "studentsPerClass": students_per_class,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "stats.overview" => handle_overview(state, req),
        _ => return None,
    };
    Some(respond(&req.id, &req.method, result))
}
