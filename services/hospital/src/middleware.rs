//! Request logging, rate limiting and CORS

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{
        HeaderName, HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{net::SocketAddr, time::Duration, time::Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::rate_limiter::RateLimiter;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Log method, path, status and latency of every request
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), elapsed_ms, "Request failed");
    } else {
        info!(%method, %path, status = status.as_u16(), elapsed_ms, "Request handled");
    }

    response
}

/// Throttle `/api/*` requests per client address
///
/// The address comes from `ConnectInfo`; requests without one share a
/// single budget.
pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with("/api/") {
        return next.run(request).await;
    }

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if limiter.check(&client).await {
        return next.run(request).await;
    }

    warn!(%client, path = %request.uri().path(), "Rate limit exceeded");
    let window = limiter.config().window;
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(RETRY_AFTER, window.as_secs().to_string())],
        Json(json!({
            "error": "Too many requests from this IP, please try again later.",
            "retryAfter": describe_window(window),
        })),
    )
        .into_response()
}

fn describe_window(window: Duration) -> String {
    match window.as_secs() {
        60 => "1 minute".to_string(),
        secs if secs % 60 == 0 => format!("{} minutes", secs / 60),
        1 => "1 second".to_string(),
        secs => format!("{secs} seconds"),
    }
}

/// CORS for the listed origins; other origins get no allow header
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(PREFLIGHT_MAX_AGE)
}
