use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use super::collect_rows;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    /// `YYYY-MM-DD`.
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: String,
    #[serde(rename = "documento")]
    pub document: String,
    #[serde(rename = "numeroCamiseta")]
    pub shirt_number: i64,
    #[serde(rename = "equipoId")]
    pub team_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub document: String,
    pub shirt_number: i64,
    pub team_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub document: Option<String>,
    pub shirt_number: Option<i64>,
}

const PLAYER_COLUMNS: &str =
    "id, nombre, apellido, fechaNacimiento, documento, numeroCamiseta, equipoId";

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        birth_date: row.get(3)?,
        document: row.get(4)?,
        shirt_number: row.get(5)?,
        team_id: row.get(6)?,
    })
}

pub fn list_players_by_team(conn: &Connection, team_id: i64) -> Result<Vec<Player>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PLAYER_COLUMNS} FROM jugadores WHERE equipoId = ?1
             ORDER BY numeroCamiseta ASC, id ASC"
        ))
        .context("prepare list players query")?;
    let rows = stmt
        .query_map(params![team_id], player_from_row)
        .context("query list players")?;
    collect_rows(rows, "player")
}

pub fn get_player(conn: &Connection, id: i64) -> Result<Option<Player>> {
    conn.query_row(
        &format!("SELECT {PLAYER_COLUMNS} FROM jugadores WHERE id = ?1"),
        params![id],
        player_from_row,
    )
    .optional()
    .context("query player")
}

pub fn create_player(conn: &Connection, player: &NewPlayer) -> Result<Player> {
    conn.execute(
        r#"
        INSERT INTO jugadores (nombre, apellido, fechaNacimiento, documento, numeroCamiseta, equipoId)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            player.first_name,
            player.last_name,
            player.birth_date,
            player.document,
            player.shirt_number,
            player.team_id
        ],
    )
    .context("insert player")?;
    Ok(Player {
        id: conn.last_insert_rowid(),
        first_name: player.first_name.clone(),
        last_name: player.last_name.clone(),
        birth_date: player.birth_date.clone(),
        document: player.document.clone(),
        shirt_number: player.shirt_number,
        team_id: player.team_id,
    })
}

/// A player never changes team through an update; delete and re-register instead.
pub fn update_player(conn: &Connection, id: i64, update: PlayerUpdate) -> Result<Option<Player>> {
    let Some(existing) = get_player(conn, id)? else {
        return Ok(None);
    };
    conn.execute(
        r#"
        UPDATE jugadores
        SET nombre = ?1, apellido = ?2, fechaNacimiento = ?3, documento = ?4, numeroCamiseta = ?5
        WHERE id = ?6
        "#,
        params![
            update.first_name.unwrap_or(existing.first_name),
            update.last_name.unwrap_or(existing.last_name),
            update.birth_date.unwrap_or(existing.birth_date),
            update.document.unwrap_or(existing.document),
            update.shirt_number.unwrap_or(existing.shirt_number),
            id
        ],
    )
    .context("update player")?;
    get_player(conn, id)
}

pub fn delete_player(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM jugadores WHERE id = ?1", params![id])
        .context("delete player")?;
    Ok(())
}
