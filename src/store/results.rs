use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::collect_rows;
use super::fixtures::{FIXTURE_COLUMNS, Fixture, fixture_from_row, get_fixture};
use crate::standings::MatchRecord;

#[derive(Debug, Clone)]
pub struct ResultInput {
    pub home_goals: u32,
    pub away_goals: u32,
    pub notes: Option<String>,
}

pub fn list_results_by_venue(conn: &Connection, venue_id: i64) -> Result<Vec<Fixture>> {
    let mut stmt = conn
        .prepare(&format!(
            r#"
            SELECT {FIXTURE_COLUMNS}
            FROM partidos p
            WHERE p.subsedeId = ?1
              AND p.golesLocal IS NOT NULL
              AND p.golesVisitante IS NOT NULL
            ORDER BY p.fecha ASC, p.hora ASC, p.id ASC
            "#
        ))
        .context("prepare list results query")?;
    let rows = stmt
        .query_map(params![venue_id], fixture_from_row)
        .context("query list results")?;
    collect_rows(rows, "result")
}

/// Returns `None` when the fixture does not exist in that venue.
pub fn record_result(
    conn: &Connection,
    venue_id: i64,
    fixture_id: i64,
    result: &ResultInput,
) -> Result<Option<Fixture>> {
    let changed = conn
        .execute(
            r#"
            UPDATE partidos SET golesLocal = ?1, golesVisitante = ?2, observaciones = ?3
            WHERE id = ?4 AND subsedeId = ?5
            "#,
            params![
                result.home_goals,
                result.away_goals,
                result.notes.as_deref().unwrap_or(""),
                fixture_id,
                venue_id
            ],
        )
        .context("record result")?;
    if changed == 0 {
        return Ok(None);
    }
    get_fixture(conn, fixture_id)
}

/// Turns the fixture back into an unplayed one.
pub fn clear_result(conn: &Connection, fixture_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE partidos SET golesLocal = NULL, golesVisitante = NULL, observaciones = '' WHERE id = ?1",
        params![fixture_id],
    )
    .context("clear result")?;
    Ok(())
}

/// Every fixture of the venue, in creation order, with each side's current
/// name and group. Stored goals that are negative count as no result.
pub fn load_match_records(conn: &Connection, venue_id: i64) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                p.local, p.visitante, p.golesLocal, p.golesVisitante,
                el.nombre, el.grupo,
                ev.nombre, ev.grupo
            FROM partidos p
            LEFT JOIN equipos el ON el.id = p.local
            LEFT JOIN equipos ev ON ev.id = p.visitante
            WHERE p.subsedeId = ?1
            ORDER BY p.id ASC
            "#,
        )
        .context("prepare match records query")?;
    let rows = stmt
        .query_map(params![venue_id], |row| {
            let home_goals: Option<i64> = row.get(2)?;
            let away_goals: Option<i64> = row.get(3)?;
            Ok(MatchRecord {
                home_team_id: row.get(0)?,
                away_team_id: row.get(1)?,
                home_goals: home_goals.and_then(|g| u32::try_from(g).ok()),
                away_goals: away_goals.and_then(|g| u32::try_from(g).ok()),
                home_team_name: row.get(4)?,
                home_group: row.get(5)?,
                away_team_name: row.get(6)?,
                away_group: row.get(7)?,
            })
        })
        .context("query match records")?;
    collect_rows(rows, "match record")
}
