use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use super::collect_rows;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "subsedeId")]
    pub venue_id: Option<i64>,
}

fn pitch_from_row(row: &Row<'_>) -> rusqlite::Result<Pitch> {
    Ok(Pitch {
        id: row.get(0)?,
        name: row.get(1)?,
        venue_id: row.get(2)?,
    })
}

pub fn list_pitches(conn: &Connection) -> Result<Vec<Pitch>> {
    let mut stmt = conn
        .prepare("SELECT id, nombre, subsedeId FROM canchas ORDER BY id ASC")
        .context("prepare list pitches query")?;
    let rows = stmt
        .query_map([], pitch_from_row)
        .context("query list pitches")?;
    collect_rows(rows, "pitch")
}

pub fn list_pitches_by_venue(conn: &Connection, venue_id: i64) -> Result<Vec<Pitch>> {
    let mut stmt = conn
        .prepare("SELECT id, nombre, subsedeId FROM canchas WHERE subsedeId = ?1 ORDER BY id ASC")
        .context("prepare list venue pitches query")?;
    let rows = stmt
        .query_map(params![venue_id], pitch_from_row)
        .context("query list venue pitches")?;
    collect_rows(rows, "pitch")
}

pub fn get_pitch(conn: &Connection, id: i64) -> Result<Option<Pitch>> {
    conn.query_row(
        "SELECT id, nombre, subsedeId FROM canchas WHERE id = ?1",
        params![id],
        pitch_from_row,
    )
    .optional()
    .context("query pitch")
}

pub fn create_pitch(conn: &Connection, name: &str, venue_id: Option<i64>) -> Result<Pitch> {
    conn.execute(
        "INSERT INTO canchas (nombre, subsedeId) VALUES (?1, ?2)",
        params![name, venue_id],
    )
    .context("insert pitch")?;
    Ok(Pitch {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        venue_id,
    })
}

pub fn update_pitch(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    venue_id: Option<i64>,
) -> Result<Option<Pitch>> {
    let Some(existing) = get_pitch(conn, id)? else {
        return Ok(None);
    };
    conn.execute(
        "UPDATE canchas SET nombre = ?1, subsedeId = ?2 WHERE id = ?3",
        params![
            name.unwrap_or(&existing.name),
            venue_id.or(existing.venue_id),
            id
        ],
    )
    .context("update pitch")?;
    get_pitch(conn, id)
}

pub fn delete_pitch(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM canchas WHERE id = ?1", params![id])
        .context("delete pitch")?;
    Ok(())
}
