use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use super::collect_rows;

pub const UNKNOWN_TEAM_LABEL: &str = "Desconocido";

/// A row of `partidos`: a scheduled fixture, with goals once a result is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: i64,
    #[serde(rename = "subsedeId")]
    pub venue_id: i64,
    #[serde(rename = "local")]
    pub home_team_id: i64,
    #[serde(rename = "visitante")]
    pub away_team_id: i64,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "hora")]
    pub time: Option<String>,
    #[serde(rename = "canchaId")]
    pub pitch_id: Option<i64>,
    #[serde(rename = "golesLocal")]
    pub home_goals: Option<i64>,
    #[serde(rename = "golesVisitante")]
    pub away_goals: Option<i64>,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
    #[serde(rename = "grupo")]
    pub group: Option<String>,
}

/// Fixture list entry with the names the schedule view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureListing {
    #[serde(flatten)]
    pub fixture: Fixture,
    #[serde(rename = "localNombre")]
    pub home_team_name: Option<String>,
    #[serde(rename = "visitanteNombre")]
    pub away_team_name: Option<String>,
    #[serde(rename = "cancha")]
    pub pitch_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureDetail {
    #[serde(flatten)]
    pub fixture: Fixture,
    #[serde(rename = "equipoLocalNombre")]
    pub home_team_name: String,
    #[serde(rename = "equipoVisitanteNombre")]
    pub away_team_name: String,
}

#[derive(Debug, Clone)]
pub struct NewFixture {
    pub venue_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub date: String,
    pub time: String,
    pub pitch_id: i64,
    pub group: Option<String>,
}

/// Results and group are not touched here; see `results` for scores.
#[derive(Debug, Clone, Default)]
pub struct FixtureUpdate {
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub pitch_id: Option<i64>,
}

pub(crate) const FIXTURE_COLUMNS: &str = "p.id, p.subsedeId, p.local, p.visitante, p.fecha, p.hora, p.canchaId, \
     p.golesLocal, p.golesVisitante, p.observaciones, p.grupo";

pub(crate) fn fixture_from_row(row: &Row<'_>) -> rusqlite::Result<Fixture> {
    Ok(Fixture {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        home_team_id: row.get(2)?,
        away_team_id: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        pitch_id: row.get(6)?,
        home_goals: row.get(7)?,
        away_goals: row.get(8)?,
        notes: row.get(9)?,
        group: row.get(10)?,
    })
}

pub fn list_fixtures_by_venue(conn: &Connection, venue_id: i64) -> Result<Vec<FixtureListing>> {
    let mut stmt = conn
        .prepare(&format!(
            r#"
            SELECT
                {FIXTURE_COLUMNS},
                el.nombre AS localNombre,
                ev.nombre AS visitanteNombre,
                c.nombre AS cancha
            FROM partidos p
            LEFT JOIN equipos el ON el.id = p.local
            LEFT JOIN equipos ev ON ev.id = p.visitante
            LEFT JOIN canchas c ON c.id = p.canchaId
            WHERE p.subsedeId = ?1
            ORDER BY p.fecha ASC, p.hora ASC, p.id ASC
            "#
        ))
        .context("prepare list fixtures query")?;
    let rows = stmt
        .query_map(params![venue_id], |row| {
            Ok(FixtureListing {
                fixture: fixture_from_row(row)?,
                home_team_name: row.get(11)?,
                away_team_name: row.get(12)?,
                pitch_name: row.get(13)?,
            })
        })
        .context("query list fixtures")?;
    collect_rows(rows, "fixture")
}

pub fn get_fixture(conn: &Connection, id: i64) -> Result<Option<Fixture>> {
    conn.query_row(
        &format!("SELECT {FIXTURE_COLUMNS} FROM partidos p WHERE p.id = ?1"),
        params![id],
        fixture_from_row,
    )
    .optional()
    .context("query fixture")
}

pub fn get_fixture_detail(conn: &Connection, id: i64) -> Result<Option<FixtureDetail>> {
    let detail = conn
        .query_row(
            &format!(
                r#"
                SELECT {FIXTURE_COLUMNS}, el.nombre, ev.nombre
                FROM partidos p
                LEFT JOIN equipos el ON el.id = p.local
                LEFT JOIN equipos ev ON ev.id = p.visitante
                WHERE p.id = ?1
                "#
            ),
            params![id],
            |row| {
                let home: Option<String> = row.get(11)?;
                let away: Option<String> = row.get(12)?;
                Ok(FixtureDetail {
                    fixture: fixture_from_row(row)?,
                    home_team_name: home.unwrap_or_else(|| UNKNOWN_TEAM_LABEL.to_string()),
                    away_team_name: away.unwrap_or_else(|| UNKNOWN_TEAM_LABEL.to_string()),
                })
            },
        )
        .optional()
        .context("query fixture detail")?;
    Ok(detail)
}

pub fn create_fixture(conn: &Connection, fixture: &NewFixture) -> Result<Fixture> {
    conn.execute(
        r#"
        INSERT INTO partidos (subsedeId, local, visitante, fecha, hora, canchaId, grupo)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            fixture.venue_id,
            fixture.home_team_id,
            fixture.away_team_id,
            fixture.date,
            fixture.time,
            fixture.pitch_id,
            fixture.group
        ],
    )
    .context("insert fixture")?;
    let id = conn.last_insert_rowid();
    get_fixture(conn, id)?.with_context(|| format!("fixture {id} missing after insert"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureUpdateOutcome {
    Updated(Fixture),
    NotFound,
    /// The merged fixture would have the same team on both sides.
    SameTeam,
}

pub fn update_fixture(
    conn: &Connection,
    id: i64,
    update: FixtureUpdate,
) -> Result<FixtureUpdateOutcome> {
    let Some(existing) = get_fixture(conn, id)? else {
        return Ok(FixtureUpdateOutcome::NotFound);
    };
    let home_team_id = update.home_team_id.unwrap_or(existing.home_team_id);
    let away_team_id = update.away_team_id.unwrap_or(existing.away_team_id);
    if home_team_id == away_team_id {
        return Ok(FixtureUpdateOutcome::SameTeam);
    }
    conn.execute(
        r#"
        UPDATE partidos
        SET local = ?1, visitante = ?2, fecha = ?3, hora = ?4, canchaId = ?5
        WHERE id = ?6
        "#,
        params![
            home_team_id,
            away_team_id,
            update.date.unwrap_or(existing.date),
            update.time.or(existing.time),
            update.pitch_id.or(existing.pitch_id),
            id
        ],
    )
    .context("update fixture")?;
    Ok(match get_fixture(conn, id)? {
        Some(fixture) => FixtureUpdateOutcome::Updated(fixture),
        None => FixtureUpdateOutcome::NotFound,
    })
}

pub fn delete_fixture(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM partidos WHERE id = ?1", params![id])
        .context("delete fixture")?;
    Ok(())
}
