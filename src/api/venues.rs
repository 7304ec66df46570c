use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;

use super::{AppState, non_blank, ok_body, parse_id};
use crate::error::{ApiError, ApiResult};
use crate::store::venues::{
    Venue, create_venue, delete_venue, get_venue, list_venues, update_venue,
};

#[derive(Debug, Deserialize)]
pub struct VenuePayload {
    #[serde(rename = "nombre")]
    name: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Venue>>> {
    let venues = state.db.run(|conn| list_venues(conn)).await?;
    Ok(Json(venues))
}

pub async fn show(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Venue>> {
    let id = parse_id(&raw_id)?;
    let venue = state.db.run(move |conn| get_venue(conn, id)).await?;
    venue
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Subsede no encontrada"))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<VenuePayload>, JsonRejection>,
) -> ApiResult<Json<Venue>> {
    let Json(payload) = payload?;
    let Some(name) = non_blank(payload.name) else {
        return Err(ApiError::bad_request("Nombre requerido"));
    };
    let venue = state.db.run(move |conn| create_venue(conn, &name)).await?;
    tracing::info!(venue_id = venue.id, name = %venue.name, "venue created");
    Ok(Json(venue))
}

pub async fn update(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<VenuePayload>, JsonRejection>,
) -> ApiResult<Json<Venue>> {
    let id = parse_id(&raw_id)?;
    let Json(payload) = payload?;
    let name = non_blank(payload.name);
    let venue = state
        .db
        .run(move |conn| update_venue(conn, id, name.as_deref()))
        .await?;
    let venue = venue.ok_or_else(|| ApiError::not_found("Subsede no encontrada"))?;
    tracing::info!(venue_id = id, "venue updated");
    Ok(Json(venue))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    state.db.run(move |conn| delete_venue(conn, id)).await?;
    tracing::info!(venue_id = id, "venue deleted");
    Ok(ok_body())
}
