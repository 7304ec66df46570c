use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::{AppState, parse_id};
use crate::error::ApiResult;
use crate::standings::{compute_standings, group_mismatches, rank_standings};
use crate::store::results::load_match_records;

#[derive(Debug, Default, Deserialize)]
pub struct StandingsQuery {
    /// Return each group as an array already in table order.
    #[serde(default)]
    ordenado: bool,
}

pub async fn show(
    State(state): State<AppState>,
    Path(raw_venue_id): Path<String>,
    Query(query): Query<StandingsQuery>,
) -> ApiResult<Response> {
    let venue_id = parse_id(&raw_venue_id)?;
    let records = state
        .db
        .run(move |conn| load_match_records(conn, venue_id))
        .await?;

    for mismatch in group_mismatches(&records) {
        tracing::warn!(
            venue_id,
            home_team_id = mismatch.home_team_id,
            away_team_id = mismatch.away_team_id,
            home_group = %mismatch.home_group,
            away_group = %mismatch.away_group,
            "fixture sides are in different groups; both counted under the home group"
        );
    }

    let standings = compute_standings(&records);
    tracing::debug!(
        venue_id,
        fixtures = records.len(),
        groups = standings.len(),
        "computed standings"
    );

    if query.ordenado {
        return Ok(Json(rank_standings(&standings)).into_response());
    }
    Ok(Json(standings).into_response())
}
