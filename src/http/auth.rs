//! HTTP basic authentication middleware.
//!
//! Installed only when credentials are configured; every route, including
//! the streaming endpoint, sits behind it.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::config::BasicAuthCredentials;

pub async fn basic_auth_middleware(
    State(credentials): State<Arc<Vec<BasicAuthCredentials>>>,
    request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if authorized(&credentials, header_value) {
        next.run(request).await
    } else {
        challenge()
    }
}

fn authorized(credentials: &[BasicAuthCredentials], header: Option<&str>) -> bool {
    let Some(value) = header else { return false };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(pair) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((username, password)) = pair.split_once(':') else {
        return false;
    };

    credentials
        .iter()
        .any(|c| c.username == username && c.password == password)
}

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"hostwatch\"")],
        "",
    )
        .into_response()
}
