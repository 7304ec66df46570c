use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};

use super::{AppState, non_blank, ok_body, parse_id};
use crate::error::{ApiError, ApiResult};
use crate::store::fixtures::{
    Fixture, FixtureDetail, FixtureListing, FixtureUpdate, FixtureUpdateOutcome, NewFixture,
    create_fixture,
    delete_fixture, get_fixture_detail, list_fixtures_by_venue, update_fixture,
};
use crate::store::results::{self, ResultInput};

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct FixturePayload {
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "subsedeId")]
    venue_id: Option<i64>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "local")]
    home_team_id: Option<i64>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "visitante")]
    away_team_id: Option<i64>,
    #[serde(rename = "fecha")]
    date: Option<String>,
    #[serde(rename = "hora")]
    time: Option<String>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "canchaId")]
    pitch_id: Option<i64>,
    #[serde(rename = "grupo")]
    group: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct ResultPayload {
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "subsedeId")]
    venue_id: Option<i64>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "partido")]
    fixture_id: Option<i64>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "golesLocal")]
    home_goals: Option<i64>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "golesVisitante")]
    away_goals: Option<i64>,
    #[serde(rename = "observaciones")]
    notes: Option<String>,
}

fn validate_date(value: &str) -> ApiResult<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ApiError::bad_request("Fecha inválida"))
}

// An empty time means "to be announced".
fn validate_time(value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Ok(());
    }
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map(|_| ())
        .map_err(|_| ApiError::bad_request("Hora inválida"))
}

fn same_team_error() -> ApiError {
    ApiError::bad_request("Un equipo no puede jugar contra sí mismo")
}

fn validate_sides(home: i64, away: i64) -> ApiResult<()> {
    if home == away {
        return Err(same_team_error());
    }
    Ok(())
}

fn goals(value: i64) -> ApiResult<u32> {
    u32::try_from(value).map_err(|_| ApiError::bad_request("Goles inválidos"))
}

pub async fn list_by_venue(
    State(state): State<AppState>,
    Path(raw_venue_id): Path<String>,
) -> ApiResult<Json<Vec<FixtureListing>>> {
    let venue_id = parse_id(&raw_venue_id)?;
    let fixtures = state
        .db
        .run(move |conn| list_fixtures_by_venue(conn, venue_id))
        .await?;
    tracing::debug!(venue_id, fixtures = fixtures.len(), "listed fixtures");
    Ok(Json(fixtures))
}

pub async fn show(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<FixtureDetail>> {
    let id = parse_id(&raw_id)?;
    let detail = state
        .db
        .run(move |conn| get_fixture_detail(conn, id))
        .await?;
    detail
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Partido no encontrado"))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<FixturePayload>, JsonRejection>,
) -> ApiResult<Json<Fixture>> {
    let Json(payload) = payload?;
    let (Some(venue_id), Some(home_team_id), Some(away_team_id), Some(date), Some(pitch_id)) = (
        payload.venue_id,
        payload.home_team_id,
        payload.away_team_id,
        non_blank(payload.date),
        payload.pitch_id,
    ) else {
        return Err(ApiError::bad_request("Datos incompletos"));
    };
    let time = payload.time.unwrap_or_default();
    validate_date(&date)?;
    validate_time(&time)?;
    validate_sides(home_team_id, away_team_id)?;

    let new_fixture = NewFixture {
        venue_id,
        home_team_id,
        away_team_id,
        date,
        time: time.trim().to_string(),
        pitch_id,
        group: non_blank(payload.group),
    };
    let fixture = state
        .db
        .run(move |conn| create_fixture(conn, &new_fixture))
        .await?;
    tracing::info!(
        fixture_id = fixture.id,
        venue_id,
        home_team_id,
        away_team_id,
        "fixture scheduled"
    );
    Ok(Json(fixture))
}

pub async fn update(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<FixturePayload>, JsonRejection>,
) -> ApiResult<Json<Fixture>> {
    let id = parse_id(&raw_id)?;
    let Json(payload) = payload?;
    let update = FixtureUpdate {
        home_team_id: payload.home_team_id,
        away_team_id: payload.away_team_id,
        date: non_blank(payload.date),
        time: payload.time.map(|t| t.trim().to_string()),
        pitch_id: payload.pitch_id,
    };
    if let Some(date) = update.date.as_deref() {
        validate_date(date)?;
    }
    if let Some(time) = update.time.as_deref() {
        validate_time(time)?;
    }
    if let (Some(home), Some(away)) = (update.home_team_id, update.away_team_id) {
        validate_sides(home, away)?;
    }

    let outcome = state
        .db
        .run(move |conn| update_fixture(conn, id, update))
        .await?;
    match outcome {
        FixtureUpdateOutcome::Updated(fixture) => {
            tracing::info!(fixture_id = id, "fixture updated");
            Ok(Json(fixture))
        }
        FixtureUpdateOutcome::NotFound => Err(ApiError::not_found("Partido no encontrado")),
        FixtureUpdateOutcome::SameTeam => Err(same_team_error()),
    }
}

pub async fn remove(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    state.db.run(move |conn| delete_fixture(conn, id)).await?;
    tracing::info!(fixture_id = id, "fixture deleted");
    Ok(ok_body())
}

pub async fn list_results(
    State(state): State<AppState>,
    Path(raw_venue_id): Path<String>,
) -> ApiResult<Json<Vec<Fixture>>> {
    let venue_id = parse_id(&raw_venue_id)?;
    let played = state
        .db
        .run(move |conn| results::list_results_by_venue(conn, venue_id))
        .await?;
    Ok(Json(played))
}

pub async fn record_result(
    State(state): State<AppState>,
    payload: Result<Json<ResultPayload>, JsonRejection>,
) -> ApiResult<Json<Fixture>> {
    let Json(payload) = payload?;
    let (Some(venue_id), Some(fixture_id), Some(home_goals), Some(away_goals)) = (
        payload.venue_id,
        payload.fixture_id,
        payload.home_goals,
        payload.away_goals,
    ) else {
        return Err(ApiError::bad_request("Datos incompletos"));
    };
    let input = ResultInput {
        home_goals: goals(home_goals)?,
        away_goals: goals(away_goals)?,
        notes: payload.notes,
    };

    let fixture = state
        .db
        .run(move |conn| results::record_result(conn, venue_id, fixture_id, &input))
        .await?
        .ok_or_else(|| ApiError::not_found("Partido no encontrado"))?;
    tracing::info!(
        fixture_id,
        venue_id,
        home_goals,
        away_goals,
        "result recorded"
    );
    Ok(Json(fixture))
}

pub async fn clear_result(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    state
        .db
        .run(move |conn| results::clear_result(conn, id))
        .await?;
    tracing::info!(fixture_id = id, "result cleared");
    Ok(ok_body())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_accepts_numeric_strings() {
        let payload: FixturePayload = serde_json::from_str(
            r#"{"subsedeId":"3","local":7,"visitante":"8","fecha":"2024-05-01","canchaId":""}"#,
        )
        .expect("payload parses");
        assert_eq!(payload.venue_id, Some(3));
        assert_eq!(payload.home_team_id, Some(7));
        assert_eq!(payload.away_team_id, Some(8));
        assert_eq!(payload.pitch_id, None);
        assert_eq!(payload.time, None);
    }

    #[test]
    fn time_validation_allows_blank() {
        assert!(validate_time("").is_ok());
        assert!(validate_time("18:30").is_ok());
        assert!(validate_time("25:00").is_err());
        assert!(validate_date("2024-02-30").is_err());
    }

    #[test]
    fn negative_goals_are_rejected() {
        assert!(matches!(goals(-1), Err(ApiError::BadRequest(_))));
        assert_eq!(goals(4).expect("valid"), 4);
    }
}
