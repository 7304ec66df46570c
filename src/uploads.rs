use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderValue, Method, Uri, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};

pub const UPLOADS_ROUTE: &str = "/uploads";
const MAX_EXTENSION_LEN: usize = 8;

/// `<unix millis>-<random hex><.ext>`; only a short alphanumeric extension of
/// the client's file name survives.
pub fn crest_file_name(original: Option<&str>) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::random::<u32>();
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{millis}-{suffix:08x}{ext}")
}

/// Writes the file and returns the public URL stored on the team.
pub async fn store_crest(dir: &Path, original: Option<&str>, bytes: &[u8]) -> Result<String> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create uploads dir {}", dir.display()))?;
    let file_name = crest_file_name(original);
    let path = dir.join(&file_name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("write upload {}", path.display()))?;
    tracing::info!(file = %file_name, bytes = bytes.len(), "stored crest upload");
    Ok(format!("{UPLOADS_ROUTE}/{file_name}"))
}

/// Removes a crest written by [`store_crest`] whose team row never made it
/// into the database. URLs outside the uploads route are left alone.
pub async fn discard_crest(dir: &Path, url: &str) {
    let Some(file_name) = url
        .strip_prefix(UPLOADS_ROUTE)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|name| is_plain_file_name(name))
    else {
        return;
    };
    let path = dir.join(file_name);
    if let Err(err) = tokio::fs::remove_file(&path).await {
        tracing::warn!(file = %path.display(), error = %err, "failed to remove orphaned crest");
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "webmanifest" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

async fn file_response(path: PathBuf) -> ApiResult<Response> {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("Archivo no encontrado"));
        }
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("read {}", path.display()))
                .into());
        }
    };
    let mut response = Body::from(bytes).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&path)),
    );
    Ok(response)
}

pub async fn serve_upload(
    State(state): State<AppState>,
    UrlPath(file): UrlPath<String>,
) -> ApiResult<Response> {
    if !is_plain_file_name(&file) {
        return Err(ApiError::not_found("Archivo no encontrado"));
    }
    file_response(state.uploads_dir.join(file)).await
}

/// Anything the API does not route is the browser client: serve the static
/// file when it exists, `index.html` otherwise.
pub async fn serve_client(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return ApiError::not_found("Ruta no encontrada").into_response();
    }
    let requested = uri.path().trim_start_matches('/');
    let segments_ok = requested.split('/').all(|s| s.is_empty() || is_plain_file_name(s));
    if !requested.is_empty() && segments_ok {
        let candidate = state.static_dir.join(requested);
        if tokio::fs::metadata(&candidate)
            .await
            .is_ok_and(|m| m.is_file())
        {
            return file_response(candidate).await.into_response();
        }
    }

    match file_response(state.static_dir.join("index.html")).await {
        Ok(response) => response,
        Err(ApiError::NotFound(_)) => ApiError::not_found("Ruta no encontrada").into_response(),
        Err(err) => err.into_response(),
    }
}
