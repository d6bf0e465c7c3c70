use crate::error::AppResult;
use crate::lifecycle::{self, Transition};
use crate::marks::{Entries, Evaluation, MarkEntry, MarkField, Marksheet, SheetKey, SheetStatus};
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension};

pub fn get_status(conn: &Connection, key: &SheetKey) -> AppResult<Option<SheetStatus>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT status FROM marksheets
             WHERE year = ? AND section = ? AND subject = ? AND evaluation = ?",
            (
                key.year,
                &key.section,
                &key.subject,
                key.evaluation.as_str(),
            ),
            |r| r.get(0),
        )
        .optional()?;
    // Unknown stored statuses read as draft so the sheet stays reachable.
    Ok(raw.map(|s| SheetStatus::parse(&s).unwrap_or(SheetStatus::Draft)))
}

/// Load one sheet; a key with nothing stored reads as a `new`, empty sheet.
pub fn get_sheet(conn: &Connection, key: &SheetKey) -> AppResult<Marksheet> {
    let Some(status) = get_status(conn, key)? else {
        return Ok(Marksheet::unsaved(key.clone()));
    };
    let mut stmt = conn.prepare(
        "SELECT roll, written, practical FROM marksheet_entries
         WHERE year = ? AND section = ? AND subject = ? AND evaluation = ?
         ORDER BY roll",
    )?;
    let entries = stmt
        .query_map(
            (
                key.year,
                &key.section,
                &key.subject,
                key.evaluation.as_str(),
            ),
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    MarkEntry {
                        written: row.get(1)?,
                        practical: row.get(2)?,
                    },
                ))
            },
        )?
        .collect::<Result<Entries, _>>()?;
    Ok(Marksheet {
        key: key.clone(),
        status,
        entries,
    })
}

/// Every stored sheet for a section, in subject then evaluation order.
pub fn get_all_sheets(conn: &Connection, year: i64, section: &str) -> AppResult<Vec<Marksheet>> {
    let mut sheet_stmt = conn.prepare(
        "SELECT subject, evaluation, status FROM marksheets
         WHERE year = ? AND section = ?
         ORDER BY subject, evaluation",
    )?;
    let heads = sheet_stmt
        .query_map((year, section), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut sheets: Vec<Marksheet> = Vec::with_capacity(heads.len());
    for (subject, evaluation, status) in heads {
        let Some(evaluation) = Evaluation::parse(&evaluation) else {
            tracing::warn!(year, section, %subject, %evaluation, "skipping sheet with unknown evaluation");
            continue;
        };
        sheets.push(Marksheet {
            key: SheetKey {
                year,
                section: section.to_string(),
                subject,
                evaluation,
            },
            status: SheetStatus::parse(&status).unwrap_or(SheetStatus::Draft),
            entries: Entries::new(),
        });
    }

    let mut entry_stmt = conn.prepare(
        "SELECT subject, evaluation, roll, written, practical FROM marksheet_entries
         WHERE year = ? AND section = ?",
    )?;
    let rows = entry_stmt
        .query_map((year, section), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                MarkEntry {
                    written: row.get(3)?,
                    practical: row.get(4)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (subject, evaluation, roll, entry) in rows {
        let Some(evaluation) = Evaluation::parse(&evaluation) else {
            continue;
        };
        if let Some(sheet) = sheets
            .iter_mut()
            .find(|s| s.key.subject == subject && s.key.evaluation == evaluation)
        {
            sheet.entries.insert(roll, entry);
        }
    }
    Ok(sheets)
}

/// Create the sheet row as `draft` if it does not exist yet. Shared by the
/// full-save and the single-cell paths so both start from the same default.
fn ensure_sheet(conn: &Connection, key: &SheetKey) -> AppResult<SheetStatus> {
    if let Some(status) = get_status(conn, key)? {
        return Ok(status);
    }
    conn.execute(
        "INSERT INTO marksheets(year, section, subject, evaluation, status, updated_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            key.year,
            &key.section,
            &key.subject,
            key.evaluation.as_str(),
            SheetStatus::Draft.as_str(),
            now_rfc3339(),
        ),
    )?;
    Ok(SheetStatus::New)
}

fn write_status(conn: &Connection, key: &SheetKey, status: SheetStatus) -> AppResult<()> {
    conn.execute(
        "UPDATE marksheets SET status = ?, updated_at = ?
         WHERE year = ? AND section = ? AND subject = ? AND evaluation = ?",
        (
            status.as_str(),
            now_rfc3339(),
            key.year,
            &key.section,
            &key.subject,
            key.evaluation.as_str(),
        ),
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: SheetStatus,
    pub current: SheetStatus,
}

/// Full-sheet upsert: runs the lifecycle transition, then replaces status
/// and every entry.
pub fn save_sheet(
    conn: &Connection,
    key: &SheetKey,
    transition: Transition,
    entries: &Entries,
) -> AppResult<StatusChange> {
    let tx = conn.unchecked_transaction()?;
    let previous = ensure_sheet(&tx, key)?;
    let current = lifecycle::apply(previous, transition)?;
    write_status(&tx, key, current)?;

    tx.execute(
        "DELETE FROM marksheet_entries
         WHERE year = ? AND section = ? AND subject = ? AND evaluation = ?",
        (
            key.year,
            &key.section,
            &key.subject,
            key.evaluation.as_str(),
        ),
    )?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO marksheet_entries(year, section, subject, evaluation, roll, written, practical)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
        )?;
        for (roll, entry) in entries {
            insert.execute((
                key.year,
                &key.section,
                &key.subject,
                key.evaluation.as_str(),
                roll,
                &entry.written,
                &entry.practical,
            ))?;
        }
    }
    tx.commit()?;

    if lifecycle::reopens(previous, current) {
        tracing::warn!(
            year = key.year,
            section = %key.section,
            subject = %key.subject,
            evaluation = %key.evaluation,
            from = %previous,
            transition = transition.name(),
            "locked sheet reopened by full save"
        );
    }
    Ok(StatusChange { previous, current })
}

/// Apply a status-only transition, creating the sheet if needed. Entries
/// are left alone.
pub fn transition_sheet(
    conn: &Connection,
    key: &SheetKey,
    transition: Transition,
) -> AppResult<StatusChange> {
    let previous = ensure_sheet(conn, key)?;
    let current = lifecycle::apply(previous, transition)?;
    write_status(conn, key, current)?;
    Ok(StatusChange { previous, current })
}

/// Single-cell upsert. Does not run any transition: a new sheet is created
/// as `draft`, an existing sheet keeps its status.
pub fn set_cell(
    conn: &Connection,
    key: &SheetKey,
    roll: u32,
    field: MarkField,
    value: Option<&str>,
) -> AppResult<SheetStatus> {
    let tx = conn.unchecked_transaction()?;
    let existing = ensure_sheet(&tx, key)?;
    let status = lifecycle::status_after_cell_edit(match existing {
        SheetStatus::New => None,
        s => Some(s),
    });

    // Column name comes from the closed MarkField set, never from input.
    let sql = format!(
        "INSERT INTO marksheet_entries(year, section, subject, evaluation, roll, {col})
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(year, section, subject, evaluation, roll) DO UPDATE SET
           {col} = excluded.{col}",
        col = field.as_str()
    );
    tx.execute(
        &sql,
        (
            key.year,
            &key.section,
            &key.subject,
            key.evaluation.as_str(),
            roll,
            value,
        ),
    )?;
    tx.execute(
        "UPDATE marksheets SET updated_at = ?
         WHERE year = ? AND section = ? AND subject = ? AND evaluation = ?",
        (
            now_rfc3339(),
            key.year,
            &key.section,
            &key.subject,
            key.evaluation.as_str(),
        ),
    )?;
    tx.commit()?;
    Ok(status)
}
