use crate::error::{AppError, AppResult};
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde_json::json;

/// Teacher account. Passwords are stored and compared as plain text; this
/// mirrors the school's existing accounts and is a known weakness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub unique_id: String,
    pub full_name: String,
    pub subject: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// `FN` + `LN` + `_<subject>_<serial>`, with FN/LN the first two letters of
/// the first and last name parts, upper-cased. A single-part name has no LN.
pub fn make_unique_id(full_name: &str, subject: &str, serial: i64) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    let first = parts.first().copied().unwrap_or("");
    let last = if parts.len() > 1 {
        parts.last().copied().unwrap_or("")
    } else {
        ""
    };
    let fn_part: String = first.chars().take(2).collect::<String>().to_uppercase();
    let ln_part: String = last.chars().take(2).collect::<String>().to_uppercase();
    format!("{fn_part}{ln_part}_{subject}_{serial}")
}

fn next_serial(conn: &Connection, counter: &str) -> AppResult<i64> {
    Ok(conn.query_row(
        "INSERT INTO counters(name, seq) VALUES(?, 1)
         ON CONFLICT(name) DO UPDATE SET seq = seq + 1
         RETURNING seq",
        [counter],
        |r| r.get(0),
    )?)
}

pub fn register(
    conn: &Connection,
    full_name: &str,
    subject: &str,
    password: &str,
) -> AppResult<Teacher> {
    let full_name = full_name.trim();
    let subject = subject.trim();
    if full_name.is_empty() || subject.is_empty() || password.is_empty() {
        return Err(AppError::validation(
            "fullName, subject and password are required",
        ));
    }

    let serial = next_serial(conn, &format!("teacher_{subject}"))?;
    let unique_id = make_unique_id(full_name, subject, serial);
    if get_teacher(conn, &unique_id)?.is_some() {
        return Err(AppError::Conflict(format!(
            "teacher {unique_id} already exists"
        )));
    }

    conn.execute(
        "INSERT INTO teachers(unique_id, full_name, subject, password, created_at)
         VALUES(?, ?, ?, ?, ?)",
        (&unique_id, full_name, subject, password, now_rfc3339()),
    )?;
    Ok(Teacher {
        unique_id,
        full_name: full_name.to_string(),
        subject: subject.to_string(),
        password: password.to_string(),
    })
}

pub fn get_teacher(conn: &Connection, unique_id: &str) -> AppResult<Option<Teacher>> {
    Ok(conn
        .query_row(
            "SELECT unique_id, full_name, subject, password FROM teachers WHERE unique_id = ?",
            [unique_id],
            |row| {
                Ok(Teacher {
                    unique_id: row.get(0)?,
                    full_name: row.get(1)?,
                    subject: row.get(2)?,
                    password: row.get(3)?,
                })
            },
        )
        .optional()?)
}

pub fn list_teachers(conn: &Connection) -> AppResult<Vec<Teacher>> {
    let mut stmt = conn.prepare(
        "SELECT unique_id, full_name, subject, password FROM teachers
         ORDER BY subject, unique_id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Teacher {
                unique_id: row.get(0)?,
                full_name: row.get(1)?,
                subject: row.get(2)?,
                password: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_teacher(conn: &Connection, unique_id: &str) -> AppResult<()> {
    let n = conn.execute("DELETE FROM teachers WHERE unique_id = ?", [unique_id])?;
    if n == 0 {
        return Err(AppError::not_found(
            "teacher",
            json!({ "uniqueId": unique_id }),
        ));
    }
    Ok(())
}

/// The new password is stored exactly as given, like at registration.
pub fn reset_password(conn: &Connection, unique_id: &str, password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::validation("password must not be empty"));
    }
    let n = conn.execute(
        "UPDATE teachers SET password = ? WHERE unique_id = ?",
        (password, unique_id),
    )?;
    if n == 0 {
        return Err(AppError::not_found(
            "teacher",
            json!({ "uniqueId": unique_id }),
        ));
    }
    Ok(())
}
