use anyhow::{Context, Result};
use rusqlite::{Connection, Row};
use std::path::Path;

use toto_core::models::{validate_numbers, Drawing};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS drawings (
    year   INTEGER NOT NULL,
    issue  INTEGER NOT NULL,
    n1     INTEGER NOT NULL,
    n2     INTEGER NOT NULL,
    n3     INTEGER NOT NULL,
    n4     INTEGER NOT NULL,
    n5     INTEGER NOT NULL,
    n6     INTEGER NOT NULL,
    PRIMARY KEY (year, issue)
);
";

const COLUMNS: &str = "year, issue, n1, n2, n3, n4, n5, n6";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("toto.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Migration failed")?;
    Ok(())
}

pub fn insert_drawing(conn: &Connection, drawing: &Drawing) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO drawings (year, issue, n1, n2, n3, n4, n5, n6)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            drawing.year,
            drawing.issue,
            drawing.numbers[0],
            drawing.numbers[1],
            drawing.numbers[2],
            drawing.numbers[3],
            drawing.numbers[4],
            drawing.numbers[5],
        ],
    ).context("Insert failed")?;
    Ok(changed > 0)
}

/// Raw row, validated afterwards so a corrupt row surfaces as an error
/// naming the drawing instead of a SQLite type error.
struct DrawingRow {
    year: u16,
    issue: u32,
    numbers: [u8; 6],
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<DrawingRow> {
    Ok(DrawingRow {
        year: row.get(0)?,
        issue: row.get(1)?,
        numbers: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
            row.get::<_, u8>(7)?,
        ],
    })
}

fn into_drawing(row: DrawingRow) -> Result<Drawing> {
    let numbers = validate_numbers(&row.numbers)
        .with_context(|| format!("Invalid drawing {}/{}", row.year, row.issue))?;
    Ok(Drawing::new(row.year, row.issue, numbers))
}

/// Chronological history (oldest first) starting with `year`.
pub fn fetch_drawings_since(conn: &Connection, year: u16) -> Result<Vec<Drawing>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM drawings WHERE year >= ?1 ORDER BY year ASC, issue ASC"
    ))?;
    let rows = stmt
        .query_map([year], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_drawing).collect()
}

/// Most recent drawings first.
pub fn fetch_last_drawings(conn: &Connection, limit: u32) -> Result<Vec<Drawing>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM drawings ORDER BY year DESC, issue DESC LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map([limit], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_drawing).collect()
}

pub fn count_drawings(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM drawings", [], |row| row.get(0))?;
    Ok(count)
}

/// Years present in the database with their drawing counts, oldest first.
pub fn years(conn: &Connection) -> Result<Vec<(u16, u32)>> {
    let mut stmt = conn.prepare(
        "SELECT year, COUNT(*) FROM drawings GROUP BY year ORDER BY year ASC"
    )?;
    let years = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(years)
}
