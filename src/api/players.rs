use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};

use super::{AppState, non_blank, ok_body, parse_id};
use crate::error::{ApiError, ApiResult};
use crate::store::players::{
    NewPlayer, Player, PlayerUpdate, create_player, delete_player, list_players_by_team,
    update_player,
};

// Browser forms post numbers as strings; both forms are accepted.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct PlayerPayload {
    #[serde(rename = "nombre")]
    first_name: Option<String>,
    #[serde(rename = "apellido")]
    last_name: Option<String>,
    #[serde(rename = "fechaNacimiento")]
    birth_date: Option<String>,
    #[serde(rename = "documento")]
    document: Option<String>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "numeroCamiseta")]
    shirt_number: Option<i64>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "equipoId")]
    team_id: Option<i64>,
}

fn validate_birth_date(value: &str) -> ApiResult<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ApiError::bad_request("Fecha de nacimiento inválida"))
}

fn validate_shirt_number(value: i64) -> ApiResult<()> {
    if value <= 0 {
        return Err(ApiError::bad_request("Número de camiseta inválido"));
    }
    Ok(())
}

pub async fn list_by_team(
    State(state): State<AppState>,
    Path(raw_team_id): Path<String>,
) -> ApiResult<Json<Vec<Player>>> {
    let team_id = parse_id(&raw_team_id)?;
    let players = state
        .db
        .run(move |conn| list_players_by_team(conn, team_id))
        .await?;
    Ok(Json(players))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<PlayerPayload>, JsonRejection>,
) -> ApiResult<Json<Player>> {
    let Json(payload) = payload?;
    let (
        Some(first_name),
        Some(last_name),
        Some(birth_date),
        Some(document),
        Some(shirt_number),
        Some(team_id),
    ) = (
        non_blank(payload.first_name),
        non_blank(payload.last_name),
        non_blank(payload.birth_date),
        non_blank(payload.document),
        payload.shirt_number,
        payload.team_id,
    )
    else {
        return Err(ApiError::bad_request("Datos faltantes"));
    };
    validate_birth_date(&birth_date)?;
    validate_shirt_number(shirt_number)?;

    let new_player = NewPlayer {
        first_name,
        last_name,
        birth_date,
        document,
        shirt_number,
        team_id,
    };
    let player = state
        .db
        .run(move |conn| create_player(conn, &new_player))
        .await?;
    tracing::info!(player_id = player.id, team_id, "player registered");
    Ok(Json(player))
}

pub async fn update(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<PlayerPayload>, JsonRejection>,
) -> ApiResult<Json<Player>> {
    let id = parse_id(&raw_id)?;
    let Json(payload) = payload?;
    let update = PlayerUpdate {
        first_name: non_blank(payload.first_name),
        last_name: non_blank(payload.last_name),
        birth_date: non_blank(payload.birth_date),
        document: non_blank(payload.document),
        shirt_number: payload.shirt_number,
    };
    if let Some(birth_date) = update.birth_date.as_deref() {
        validate_birth_date(birth_date)?;
    }
    if let Some(shirt_number) = update.shirt_number {
        validate_shirt_number(shirt_number)?;
    }

    let player = state
        .db
        .run(move |conn| update_player(conn, id, update))
        .await?
        .ok_or_else(|| ApiError::not_found("Jugador no encontrado"))?;
    tracing::info!(player_id = id, "player updated");
    Ok(Json(player))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    state.db.run(move |conn| delete_player(conn, id)).await?;
    tracing::info!(player_id = id, "player deleted");
    Ok(ok_body())
}
