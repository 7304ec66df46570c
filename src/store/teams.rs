use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use super::collect_rows;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "subsedeId")]
    pub venue_id: i64,
    /// Public URL of the uploaded crest, e.g. `/uploads/1700000000000-1a2b.png`.
    #[serde(rename = "escudo")]
    pub crest: Option<String>,
    #[serde(rename = "grupo")]
    pub group: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub venue_id: i64,
    pub crest: Option<String>,
    pub group: Option<String>,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub crest: Option<String>,
    pub group: Option<String>,
}

const TEAM_COLUMNS: &str = "id, nombre, subsedeId, escudo, grupo";

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        venue_id: row.get(2)?,
        crest: row.get(3)?,
        group: row.get(4)?,
    })
}

pub fn list_teams_by_venue(conn: &Connection, venue_id: i64) -> Result<Vec<Team>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM equipos WHERE subsedeId = ?1 ORDER BY id ASC"
        ))
        .context("prepare list teams query")?;
    let rows = stmt
        .query_map(params![venue_id], team_from_row)
        .context("query list teams")?;
    collect_rows(rows, "team")
}

pub fn get_team(conn: &Connection, id: i64) -> Result<Option<Team>> {
    conn.query_row(
        &format!("SELECT {TEAM_COLUMNS} FROM equipos WHERE id = ?1"),
        params![id],
        team_from_row,
    )
    .optional()
    .context("query team")
}

pub fn create_team(conn: &Connection, team: &NewTeam) -> Result<Team> {
    conn.execute(
        "INSERT INTO equipos (nombre, subsedeId, escudo, grupo) VALUES (?1, ?2, ?3, ?4)",
        params![team.name, team.venue_id, team.crest, team.group],
    )
    .context("insert team")?;
    Ok(Team {
        id: conn.last_insert_rowid(),
        name: team.name.clone(),
        venue_id: team.venue_id,
        crest: team.crest.clone(),
        group: team.group.clone(),
    })
}

pub fn update_team(conn: &Connection, id: i64, update: TeamUpdate) -> Result<Option<Team>> {
    let Some(existing) = get_team(conn, id)? else {
        return Ok(None);
    };
    let name = update.name.unwrap_or(existing.name);
    let crest = update.crest.or(existing.crest);
    let group = update.group.or(existing.group);
    conn.execute(
        "UPDATE equipos SET nombre = ?1, escudo = ?2, grupo = ?3 WHERE id = ?4",
        params![name, crest, group, id],
    )
    .context("update team")?;
    get_team(conn, id)
}

pub fn delete_team(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM equipos WHERE id = ?1", params![id])
        .context("delete team")?;
    Ok(())
}
