//! Reverse proxying to team instances

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Response};
use thiserror::Error;
use tracing::debug;

const MAX_REQUEST_BODY_BYTES: usize = 32 * 1024 * 1024;

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Backend request failed: {0}")]
    Upstream(String),
}

/// Forwards requests to a backend and streams the response back
#[derive(Debug, Clone)]
pub struct ProxyForwarder {
    client: reqwest::Client,
}

impl ProxyForwarder {
    pub fn new() -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ForwardError::Upstream(e.to_string()))?;

        Ok(Self { client })
    }

    /// Send `request` to `base_url`, keeping method, path, query, headers and body
    pub async fn forward(
        &self,
        base_url: &str,
        request: Request<Body>,
    ) -> Result<Response<Body>, ForwardError> {
        let (parts, body) = request.into_parts();
        let url = join_url(base_url, parts.uri.path(), parts.uri.query());
        let body = axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES)
            .await
            .map_err(|e| ForwardError::Body(e.to_string()))?;

        debug!(method = %parts.method, url = %url, "Forwarding request");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(strip_hop_by_hop(&parts.headers))
            .body(body)
            .send()
            .await
            .map_err(|e| ForwardError::Upstream(e.to_string()))?;

        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers());

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        Ok(response)
    }
}

fn join_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }

    url
}

/// Copy of `headers` without connection-level headers, including any the
/// `Connection` header names
fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();

    headers
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            !HOP_BY_HOP_HEADERS.contains(&name) && !listed.iter().any(|l| l == name)
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
