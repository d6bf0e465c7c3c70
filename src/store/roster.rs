use crate::error::{AppError, AppResult};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub roll: u32,
    pub name: String,
}

pub fn get_roster(conn: &Connection, year: i64, section: &str) -> AppResult<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT roll, name FROM roster_students
         WHERE year = ? AND section = ?
         ORDER BY roll",
    )?;
    let rows = stmt
        .query_map((year, section), |row| {
            Ok(Student {
                roll: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Replace the whole roster for (year, section). Never merges.
pub fn set_roster(
    conn: &Connection,
    year: i64,
    section: &str,
    students: &[Student],
) -> AppResult<usize> {
    let mut seen = HashSet::new();
    for s in students {
        if s.roll == 0 {
            return Err(AppError::validation("roll numbers must be positive"));
        }
        if s.name.trim().is_empty() {
            return Err(AppError::validation_with(
                "student name must not be empty",
                json!({ "roll": s.roll }),
            ));
        }
        if !seen.insert(s.roll) {
            return Err(AppError::validation_with(
                "duplicate roll number",
                json!({ "roll": s.roll }),
            ));
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM roster_students WHERE year = ? AND section = ?",
        (year, section),
    )?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO roster_students(year, section, roll, name) VALUES(?, ?, ?, ?)",
        )?;
        for s in students {
            insert.execute((year, section, s.roll, s.name.trim()))?;
        }
    }
    tx.commit()?;
    Ok(students.len())
}

/// Turn an uploaded list of names into a numbered roster: trim, drop
/// blanks and repeated names (first one wins), then number from 1 in input
/// order.
pub fn roster_from_names<I, S>(names: I) -> Vec<Student>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.clone()))
        .enumerate()
        .map(|(i, name)| Student {
            roll: (i + 1) as u32,
            name,
        })
        .collect()
}

pub fn rename_student(
    conn: &Connection,
    year: i64,
    section: &str,
    roll: u32,
    new_name: &str,
) -> AppResult<()> {
    let name = new_name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    let changed = conn.execute(
        "UPDATE roster_students SET name = ? WHERE year = ? AND section = ? AND roll = ?",
        (name, year, section, roll),
    )?;
    if changed == 0 {
        return Err(student_not_found(year, section, roll));
    }
    Ok(())
}

/// Drops the student from the roster only. Their marks stay stored.
pub fn remove_student(conn: &Connection, year: i64, section: &str, roll: u32) -> AppResult<()> {
    let changed = conn.execute(
        "DELETE FROM roster_students WHERE year = ? AND section = ? AND roll = ?",
        (year, section, roll),
    )?;
    if changed == 0 {
        return Err(student_not_found(year, section, roll));
    }
    Ok(())
}

/// Student counts per section for one year, sections in name order.
pub fn count_by_section(conn: &Connection, year: i64) -> AppResult<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT section, COUNT(*) FROM roster_students
         WHERE year = ?
         GROUP BY section
         ORDER BY section",
    )?;
    let rows = stmt
        .query_map([year], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn student_not_found(year: i64, section: &str, roll: u32) -> AppError {
    AppError::not_found(
        "student",
        json!({ "year": year, "section": section, "roll": roll }),
    )
}
