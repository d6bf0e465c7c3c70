use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE_NAME: &str = "marksheets.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // Rosters: one row per student; (year, section) is the roster document.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS roster_students(
            year INTEGER NOT NULL,
            section TEXT NOT NULL,
            roll INTEGER NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY(year, section, roll)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS marksheets(
            year INTEGER NOT NULL,
            section TEXT NOT NULL,
            subject TEXT NOT NULL,
            evaluation TEXT NOT NULL,
            status TEXT NOT NULL,
            updated_at TEXT,
            PRIMARY KEY(year, section, subject, evaluation)
        )",
        [],
    )?;

    // Entries are not tied to the roster: marks for a removed student stay
    // here and reappear when the roll is back on the roster.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS marksheet_entries(
            year INTEGER NOT NULL,
            section TEXT NOT NULL,
            subject TEXT NOT NULL,
            evaluation TEXT NOT NULL,
            roll INTEGER NOT NULL,
            written TEXT,
            practical TEXT,
            PRIMARY KEY(year, section, subject, evaluation, roll),
            FOREIGN KEY(year, section, subject, evaluation)
                REFERENCES marksheets(year, section, subject, evaluation)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marksheet_entries_section
            ON marksheet_entries(year, section)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS unlock_requests(
            id TEXT PRIMARY KEY,
            teacher_name TEXT NOT NULL,
            subject TEXT NOT NULL,
            year INTEGER NOT NULL,
            section TEXT NOT NULL,
            evaluation TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_unlock_requests_tuple
            ON unlock_requests(teacher_name, subject, year, section, evaluation, status)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            unique_id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            subject TEXT NOT NULL,
            password TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS counters(
            name TEXT PRIMARY KEY,
            seq INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}
