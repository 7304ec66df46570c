use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::Multipart;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::header;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{NoneAsEmptyString, PickFirst, serde_as};

use super::{AppState, non_blank, ok_body, parse_id};
use crate::error::{ApiError, ApiResult};
use crate::store::teams::{
    NewTeam, Team, TeamUpdate, create_team, delete_team, get_team, list_teams_by_venue,
    update_team,
};
use crate::uploads;

/// Team create/edit requests arrive as multipart forms when they carry the
/// crest image, and as plain JSON otherwise.
#[derive(Debug, Default)]
struct TeamForm {
    name: Option<String>,
    venue_id: Option<i64>,
    group: Option<String>,
    crest: Option<(Option<String>, Bytes)>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct TeamPayload {
    #[serde(rename = "nombre")]
    name: Option<String>,
    #[serde_as(as = "PickFirst<(_, NoneAsEmptyString)>")]
    #[serde(default, rename = "subsedeId")]
    venue_id: Option<i64>,
    #[serde(rename = "grupo")]
    group: Option<String>,
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("application/json"))
}

async fn read_team_request(request: Request) -> ApiResult<TeamForm> {
    if is_json(&request) {
        let Json(payload) = Json::<TeamPayload>::from_request(request, &()).await?;
        return Ok(TeamForm {
            name: non_blank(payload.name),
            venue_id: payload.venue_id,
            group: non_blank(payload.group),
            crest: None,
        });
    }
    let multipart = Multipart::from_request(request, &()).await?;
    read_team_form(multipart).await
}

async fn read_team_form(mut multipart: Multipart) -> ApiResult<TeamForm> {
    let mut form = TeamForm::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };
        match field_name.as_str() {
            "nombre" => form.name = non_blank(Some(field.text().await?)),
            "subsedeId" => {
                form.venue_id = non_blank(Some(field.text().await?))
                    .map(|raw| parse_id(&raw))
                    .transpose()?;
            }
            "grupo" => form.group = non_blank(Some(field.text().await?)),
            "escudo" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.crest = Some((file_name, bytes));
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown team form field"),
        }
    }
    Ok(form)
}

async fn store_form_crest(state: &AppState, form: &mut TeamForm) -> ApiResult<Option<String>> {
    let Some((file_name, bytes)) = form.crest.take() else {
        return Ok(None);
    };
    let url = uploads::store_crest(&state.uploads_dir, file_name.as_deref(), &bytes).await?;
    Ok(Some(url))
}

// The crest is written before the row; a failed write to the database must
// not leave the file behind.
async fn discard_on_error<T>(
    state: &AppState,
    crest: Option<&str>,
    result: ApiResult<T>,
) -> ApiResult<T> {
    if result.is_err()
        && let Some(url) = crest
    {
        uploads::discard_crest(&state.uploads_dir, url).await;
    }
    result
}

pub async fn list_by_venue(
    State(state): State<AppState>,
    Path(raw_venue_id): Path<String>,
) -> ApiResult<Json<Vec<Team>>> {
    let venue_id = parse_id(&raw_venue_id)?;
    let teams = state
        .db
        .run(move |conn| list_teams_by_venue(conn, venue_id))
        .await?;
    Ok(Json(teams))
}

pub async fn show(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Team>> {
    let id = parse_id(&raw_id)?;
    let team = state.db.run(move |conn| get_team(conn, id)).await?;
    team.map(Json)
        .ok_or_else(|| ApiError::not_found("Equipo no encontrado"))
}

pub async fn create(State(state): State<AppState>, request: Request) -> ApiResult<Json<Team>> {
    let mut form = read_team_request(request).await?;
    let (Some(name), Some(venue_id)) = (form.name.clone(), form.venue_id) else {
        return Err(ApiError::bad_request("Datos faltantes"));
    };
    let crest = store_form_crest(&state, &mut form).await?;

    let new_team = NewTeam {
        name,
        venue_id,
        crest: crest.clone(),
        group: form.group,
    };
    let created = state
        .db
        .run(move |conn| create_team(conn, &new_team))
        .await
        .map_err(ApiError::from);
    let team = discard_on_error(&state, crest.as_deref(), created).await?;
    tracing::info!(team_id = team.id, venue_id, name = %team.name, "team created");
    Ok(Json(team))
}

pub async fn update(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    request: Request,
) -> ApiResult<Json<Team>> {
    let id = parse_id(&raw_id)?;
    let mut form = read_team_request(request).await?;
    if state.db.run(move |conn| get_team(conn, id)).await?.is_none() {
        return Err(ApiError::not_found("Equipo no encontrado"));
    }
    let crest = store_form_crest(&state, &mut form).await?;

    let update = TeamUpdate {
        name: form.name,
        crest: crest.clone(),
        group: form.group,
    };
    let updated = state
        .db
        .run(move |conn| update_team(conn, id, update))
        .await
        .map_err(ApiError::from)
        .and_then(|team| team.ok_or_else(|| ApiError::not_found("Equipo no encontrado")));
    let team = discard_on_error(&state, crest.as_deref(), updated).await?;
    tracing::info!(team_id = id, "team updated");
    Ok(Json(team))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    state.db.run(move |conn| delete_team(conn, id)).await?;
    tracing::info!(team_id = id, "team deleted");
    Ok(ok_body())
}
