//! Random slowdown middleware, for exercising loading states of the frontend
#![cfg_attr(not(feature = "slowdown"), allow(dead_code))]

use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

const MEAN_DELAY_MS: f64 = 1000.0;
const DELAY_STD_DEV_MS: f64 = 2000.0;

fn random_delay() -> Duration {
    let millis = Normal::new(MEAN_DELAY_MS, DELAY_STD_DEV_MS)
        .map(|normal| normal.sample(&mut rand::rng()))
        .unwrap_or(MEAN_DELAY_MS);
    Duration::from_millis(millis.max(0.0) as u64)
}

/// Delays each request by a normally distributed amount of time, never negative.
pub async fn slowdown_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    tokio::time::sleep(random_delay()).await;
    next.run(request).await
}
