use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::store::{self, Db};
use crate::uploads;

mod fixtures;
mod pitches;
mod players;
mod standings;
mod teams;
mod venues;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub uploads_dir: PathBuf,
    pub static_dir: PathBuf,
}

// Paths keep the browser client's URLs. A `{id}` in first position is the
// venue or team the collection belongs to on list routes, and the entity's
// own id on update/delete routes.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/subsede", get(venues::list).post(venues::create))
        .route(
            "/subsede/{id}",
            get(venues::show).put(venues::update).delete(venues::remove),
        )
        .route("/equipos", post(teams::create))
        .route(
            "/equipos/{id}",
            get(teams::list_by_venue)
                .put(teams::update)
                .delete(teams::remove),
        )
        .route("/equipos/{id}/equipo", get(teams::show))
        .route("/canchas", get(pitches::list).post(pitches::create))
        .route(
            "/canchas/{id}",
            get(pitches::list_by_venue)
                .put(pitches::update)
                .delete(pitches::remove),
        )
        .route("/jugadores", post(players::create))
        .route(
            "/jugadores/{id}",
            get(players::list_by_team)
                .put(players::update)
                .delete(players::remove),
        )
        .route("/fixture", post(fixtures::create))
        .route(
            "/fixture/{id}",
            get(fixtures::list_by_venue)
                .put(fixtures::update)
                .delete(fixtures::remove),
        )
        .route("/fixture/partido/{id}", get(fixtures::show))
        .route("/resultados", post(fixtures::record_result))
        .route(
            "/resultados/{id}",
            get(fixtures::list_results).delete(fixtures::clear_result),
        )
        .route("/posiciones/{id}", get(standings::show))
        .route("/uploads/{file}", get(uploads::serve_upload))
        .fallback(uploads::serve_client)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let conn = store::open_db(&config.db)?;
    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .with_context(|| format!("create uploads dir {}", config.uploads_dir.display()))?;

    let state = AppState {
        db: Db::new(conn),
        uploads_dir: config.uploads_dir.clone(),
        static_dir: config.static_dir.clone(),
    };
    let app = router(state, config.max_upload_bytes);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        db = %config.db.display(),
        uploads = %config.uploads_dir.display(),
        "torneo server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn cors(req: Request, next: Next) -> Response {
    let requested_headers = req
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned();
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,HEAD,PUT,PATCH,POST,DELETE"),
    );
    if let Some(value) = requested_headers {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }
    response
}

pub(crate) fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request("ID inválido"))
}

/// Empty or whitespace-only form values count as missing.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn ok_body() -> Json<Value> {
    Json(json!({ "ok": true }))
}
