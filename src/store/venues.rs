use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use super::collect_rows;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
}

fn venue_from_row(row: &Row<'_>) -> rusqlite::Result<Venue> {
    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

pub fn list_venues(conn: &Connection) -> Result<Vec<Venue>> {
    let mut stmt = conn
        .prepare("SELECT id, nombre FROM subsedes ORDER BY id ASC")
        .context("prepare list venues query")?;
    let rows = stmt
        .query_map([], venue_from_row)
        .context("query list venues")?;
    collect_rows(rows, "venue")
}

pub fn get_venue(conn: &Connection, id: i64) -> Result<Option<Venue>> {
    conn.query_row(
        "SELECT id, nombre FROM subsedes WHERE id = ?1",
        params![id],
        venue_from_row,
    )
    .optional()
    .context("query venue")
}

pub fn create_venue(conn: &Connection, name: &str) -> Result<Venue> {
    conn.execute("INSERT INTO subsedes (nombre) VALUES (?1)", params![name])
        .context("insert venue")?;
    Ok(Venue {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub fn update_venue(conn: &Connection, id: i64, name: Option<&str>) -> Result<Option<Venue>> {
    let Some(existing) = get_venue(conn, id)? else {
        return Ok(None);
    };
    let name = name.unwrap_or(&existing.name);
    conn.execute(
        "UPDATE subsedes SET nombre = ?1 WHERE id = ?2",
        params![name, id],
    )
    .context("update venue")?;
    get_venue(conn, id)
}

/// Teams, pitches and fixtures of the venue go with it.
pub fn delete_venue(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM subsedes WHERE id = ?1", params![id])
        .context("delete venue")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{open_in_memory, teams};

    #[test]
    fn create_update_delete_round_trip() {
        let conn = open_in_memory().expect("open db");
        let venue = create_venue(&conn, "Sede Norte").expect("create");
        assert_eq!(list_venues(&conn).expect("list").len(), 1);

        let updated = update_venue(&conn, venue.id, Some("Sede Sur"))
            .expect("update")
            .expect("venue exists");
        assert_eq!(updated.name, "Sede Sur");

        let untouched = update_venue(&conn, venue.id, None)
            .expect("update")
            .expect("venue exists");
        assert_eq!(untouched.name, "Sede Sur");

        assert!(update_venue(&conn, 999, Some("x")).expect("update").is_none());

        delete_venue(&conn, venue.id).expect("delete");
        assert!(get_venue(&conn, venue.id).expect("get").is_none());
    }

    #[test]
    fn deleting_venue_cascades_to_teams() {
        let conn = open_in_memory().expect("open db");
        let venue = create_venue(&conn, "Sede").expect("create venue");
        teams::create_team(
            &conn,
            &teams::NewTeam {
                name: "Halcones".to_string(),
                venue_id: venue.id,
                crest: None,
                group: Some("A".to_string()),
            },
        )
        .expect("create team");

        delete_venue(&conn, venue.id).expect("delete");
        assert!(teams::list_teams_by_venue(&conn, venue.id)
            .expect("list")
            .is_empty());
    }
}
