use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};

use super::{AppState, non_blank, ok_body, parse_id};
use crate::error::{ApiError, ApiResult};
use crate::store::pitches::{
    Pitch, create_pitch, delete_pitch, list_pitches, list_pitches_by_venue, update_pitch,
};

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct PitchPayload {
    #[serde(rename = "nombre")]
    name: Option<String>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "subsedeId")]
    venue_id: Option<i64>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Pitch>>> {
    let pitches = state.db.run(|conn| list_pitches(conn)).await?;
    Ok(Json(pitches))
}

pub async fn list_by_venue(
    State(state): State<AppState>,
    Path(raw_venue_id): Path<String>,
) -> ApiResult<Json<Vec<Pitch>>> {
    let venue_id = parse_id(&raw_venue_id)?;
    let pitches = state
        .db
        .run(move |conn| list_pitches_by_venue(conn, venue_id))
        .await?;
    Ok(Json(pitches))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<PitchPayload>, JsonRejection>,
) -> ApiResult<Json<Pitch>> {
    let Json(payload) = payload?;
    let Some(name) = non_blank(payload.name) else {
        return Err(ApiError::bad_request("Nombre requerido"));
    };
    let venue_id = payload.venue_id;
    let pitch = state
        .db
        .run(move |conn| create_pitch(conn, &name, venue_id))
        .await?;
    tracing::info!(pitch_id = pitch.id, ?venue_id, "pitch created");
    Ok(Json(pitch))
}

pub async fn update(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<PitchPayload>, JsonRejection>,
) -> ApiResult<Json<Pitch>> {
    let id = parse_id(&raw_id)?;
    let Json(payload) = payload?;
    let name = non_blank(payload.name);
    let venue_id = payload.venue_id;
    let pitch = state
        .db
        .run(move |conn| update_pitch(conn, id, name.as_deref(), venue_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Cancha no encontrada"))?;
    tracing::info!(pitch_id = id, "pitch updated");
    Ok(Json(pitch))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    state.db.run(move |conn| delete_pitch(conn, id)).await?;
    tracing::info!(pitch_id = id, "pitch deleted");
    Ok(ok_body())
}
