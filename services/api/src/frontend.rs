use crate::infra::AppState;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use maizebus::config::FrontendConfig;
use maizebus::error::AppError;
use serde_json::json;
use std::path::{Component, Path, PathBuf};

const INDEX: &str = "index.html";

/// The built single-page client, served from disk on every request.
#[derive(Debug, Clone)]
pub(crate) struct FrontendAssets {
    dist_dir: PathBuf,
}

impl FrontendAssets {
    pub(crate) fn new(config: &FrontendConfig) -> Self {
        Self {
            dist_dir: config.dist_dir.clone(),
        }
    }

    pub(crate) fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    pub(crate) fn is_built(&self) -> bool {
        self.dist_dir.join(INDEX).is_file()
    }

    /// Maps a request path onto the bundle; `None` when it tries to leave it.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = Path::new(request_path.trim_start_matches('/'));
        let mut resolved = self.dist_dir.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }

    /// A file from the bundle, or `index.html` for client-side routes.
    pub(crate) async fn respond(&self, request_path: &str) -> Result<Response, AppError> {
        if let Some(path) = self.resolve(request_path) {
            if path != self.dist_dir && is_file(&path).await {
                return file_response(&path).await;
            }
        }

        let index = self.dist_dir.join(INDEX);
        if is_file(&index).await {
            return file_response(&index).await;
        }

        Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Frontend not built. Please run npm run build:client" })),
        )
            .into_response())
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

async fn file_response(path: &Path) -> Result<Response, AppError> {
    let body = tokio::fs::read(path).await?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type.essence_str().to_string())],
        body,
    )
        .into_response())
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Router fallback: unknown API paths get JSON 404s, everything else is the client.
pub(crate) async fn fallback(
    Extension(state): Extension<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, AppError> {
    if is_api_path(uri.path()) {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "API endpoint not found" })),
        )
            .into_response());
    }

    if method != Method::GET && method != Method::HEAD {
        return Ok((StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response());
    }

    state.frontend.respond(uri.path()).await
}
