//! Entry page every proxy redirect points to

use axum::{
    body::Body,
    extract::{Request, State},
    http::Uri,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use super::proxy::ENTRY_PATH;
use super::state::AppState;

/// Serves the UI directory under `/balancer`; unknown paths get its `index.html`
pub async fn entry_page(State(state): State<AppState>, mut request: Request) -> Response {
    let tail = request
        .uri()
        .path()
        .strip_prefix(ENTRY_PATH)
        .filter(|tail| !tail.is_empty())
        .unwrap_or("/");
    *request.uri_mut() = tail.parse::<Uri>().unwrap_or_else(|_| Uri::from_static("/"));

    let index = state.ui_dir.join("index.html");
    let service = ServeDir::new(&state.ui_dir)
        .append_index_html_on_directories(false)
        .fallback(ServeFile::new(index));

    match service.oneshot(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}
