//! HTTP caching middleware

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::IntoResponse,
};

/// Adds `Cache-Control: max-age=<max_age_sec>` to successful responses
/// that did not set their own.
pub async fn http_cache(
    State(max_age_sec): State<usize>,
    request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let mut response = next.run(request).await;

    if response.status().is_success() && !response.headers().contains_key(header::CACHE_CONTROL) {
        if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", max_age_sec)) {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
    }
    response
}
