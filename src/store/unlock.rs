use crate::error::{AppError, AppResult};
use crate::lifecycle::{self, Transition};
use crate::marks::{Evaluation, SheetKey, SheetStatus};
use crate::store::marksheets::{self, StatusChange};
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    pub id: String,
    pub teacher_name: String,
    pub subject: String,
    pub year: i64,
    pub section: String,
    pub evaluation: String,
    pub status: String,
    pub created_at: String,
}

impl UnlockRequest {
    pub fn sheet_key(&self) -> AppResult<SheetKey> {
        let evaluation = Evaluation::parse(&self.evaluation).ok_or_else(|| {
            AppError::validation_with(
                "stored unlock request has an invalid evaluation",
                json!({ "id": self.id, "evaluation": self.evaluation }),
            )
        })?;
        SheetKey::new(self.year, &self.section, &self.subject, evaluation)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(UnlockRequest {
            id: row.get(0)?,
            teacher_name: row.get(1)?,
            subject: row.get(2)?,
            year: row.get(3)?,
            section: row.get(4)?,
            evaluation: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, teacher_name, subject, year, section, evaluation, status, created_at";

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<String>,
    pub teacher_name: Option<String>,
    pub subject: Option<String>,
}

pub fn list_requests(conn: &Connection, filter: &ListFilter) -> AppResult<Vec<UnlockRequest>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM unlock_requests
         WHERE (?1 IS NULL OR status = ?1)
           AND (?2 IS NULL OR teacher_name = ?2)
           AND (?3 IS NULL OR subject = ?3)
         ORDER BY created_at, rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            (&filter.status, &filter.teacher_name, &filter.subject),
            UnlockRequest::from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_request(conn: &Connection, id: &str) -> AppResult<Option<UnlockRequest>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM unlock_requests WHERE id = ?");
    Ok(conn
        .query_row(&sql, [id], UnlockRequest::from_row)
        .optional()?)
}

pub fn count_pending(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM unlock_requests WHERE status = ?",
        [STATUS_PENDING],
        |r| r.get(0),
    )?)
}

/// Queue a teacher's request to reopen a locked sheet.
///
/// The sheet must be `submitted` or `pending_unlock`, and only one pending
/// request may exist per (teacher, subject, year, section, evaluation). The
/// duplicate check and the insert are separate statements; two racing
/// creates can both pass it. The sheet status is not changed here.
pub fn create_request(
    conn: &Connection,
    teacher_name: &str,
    key: &SheetKey,
) -> AppResult<UnlockRequest> {
    let teacher_name = teacher_name.trim();
    if teacher_name.is_empty() {
        return Err(AppError::validation("teacherName must not be empty"));
    }

    let status = marksheets::get_status(conn, key)?.unwrap_or(SheetStatus::New);
    if !lifecycle::accepts_unlock_request(status) {
        return Err(AppError::validation_with(
            "only a submitted sheet can be unlocked",
            json!({ "sheet": key.to_json(), "status": status.as_str() }),
        ));
    }

    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM unlock_requests
             WHERE teacher_name = ? AND subject = ? AND year = ? AND section = ?
               AND evaluation = ? AND status = ?",
            (
                teacher_name,
                &key.subject,
                key.year,
                &key.section,
                key.evaluation.as_str(),
                STATUS_PENDING,
            ),
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Err(AppError::Conflict(format!(
            "an unlock request is already pending ({id})"
        )));
    }

    let req = UnlockRequest {
        id: Uuid::new_v4().to_string(),
        teacher_name: teacher_name.to_string(),
        subject: key.subject.clone(),
        year: key.year,
        section: key.section.clone(),
        evaluation: key.evaluation.as_str().to_string(),
        status: STATUS_PENDING.to_string(),
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO unlock_requests(id, teacher_name, subject, year, section, evaluation, status, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &req.id,
            &req.teacher_name,
            &req.subject,
            req.year,
            &req.section,
            &req.evaluation,
            &req.status,
            &req.created_at,
        ),
    )?;
    Ok(req)
}

/// Reopen the request's sheet as `draft` and drop the request. Both happen
/// in one transaction; nothing of the request is kept.
pub fn approve_request(conn: &Connection, id: &str) -> AppResult<(UnlockRequest, StatusChange)> {
    let Some(req) = get_request(conn, id)? else {
        return Err(AppError::not_found("unlock request", json!({ "id": id })));
    };
    let key = req.sheet_key()?;

    let tx = conn.unchecked_transaction()?;
    let change = marksheets::transition_sheet(&tx, &key, Transition::ApproveUnlock)?;
    tx.execute("DELETE FROM unlock_requests WHERE id = ?", [id])?;
    tx.commit()?;
    Ok((req, change))
}

/// Remove a request without touching the sheet. Used for admin denial and
/// for a teacher dismissing a notification.
pub fn delete_request(conn: &Connection, id: &str) -> AppResult<UnlockRequest> {
    let Some(req) = get_request(conn, id)? else {
        return Err(AppError::not_found("unlock request", json!({ "id": id })));
    };
    conn.execute("DELETE FROM unlock_requests WHERE id = ?", [id])?;
    Ok(req)
}
