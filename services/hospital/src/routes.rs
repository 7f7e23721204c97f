//! Hospital service routes

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    error::{HospitalError, HospitalResult},
    middleware::{cors_layer, limit_requests, log_requests},
    models::Page,
    state::AppState,
};

pub mod appointments;
pub mod doctors;
pub mod patients;

/// Create the router for the hospital service
pub fn create_router(state: AppState) -> Router {
    let limiter = state.rate_limiter.clone();
    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .merge(patients::router())
        .merge(doctors::router())
        .merge(appointments::router())
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/docs", get(api_docs))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(limiter, limit_requests))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

/// Parse a path identifier; anything but a positive integer is rejected
pub(crate) fn parse_id(raw: &str, entity: &'static str) -> HospitalResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(HospitalError::InvalidIdentifier { entity })
}

/// Envelope for a paginated listing
pub(crate) fn page_envelope<T: Serialize>(items: Vec<T>, page: Page) -> Json<Value> {
    let count = items.len();
    Json(json!({
        "success": true,
        "data": items,
        "count": count,
        "pagination": {
            "limit": page.limit,
            "offset": page.offset,
            "hasMore": i64::try_from(count).is_ok_and(|count| count == page.limit),
        },
    }))
}

/// Envelope for an unpaginated listing
pub(crate) fn list_envelope<T: Serialize>(items: Vec<T>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": items,
        "count": items.len(),
    }))
}

pub(crate) fn data_envelope<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

/// Envelope for a write, carrying the resulting record
pub(crate) fn write_envelope<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data,
    }))
}

pub(crate) fn message_envelope(message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
    }))
}

/// Health check endpoint backed by a datastore round trip
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = match state.health.ping().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            false
        }
    };

    let (status, label, database) = if healthy {
        (StatusCode::OK, "OK", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "ERROR", "disconnected")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "hospital",
            "database": database,
            "environment": state.environment,
            "timestamp": Utc::now(),
        })),
    )
}

/// Static description of the API
pub async fn api_docs() -> impl IntoResponse {
    Json(json!({
        "title": "Hospital Management System API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "patients": {
                "GET /api/patients": "List patients (limit, offset, search)",
                "GET /api/patients/stats": "Patient statistics",
                "GET /api/patients/:id": "Get a patient",
                "GET /api/patients/:id/appointments": "Appointments of a patient",
                "POST /api/patients": "Create a patient",
                "PUT /api/patients/:id": "Replace a patient",
                "DELETE /api/patients/:id": "Delete a patient and its appointments",
            },
            "doctors": {
                "GET /api/doctors": "List doctors (limit, offset, search)",
                "GET /api/doctors/stats": "Doctor statistics",
                "GET /api/doctors/:id": "Get a doctor",
                "POST /api/doctors": "Create a doctor",
                "PUT /api/doctors/:id": "Replace a doctor",
                "DELETE /api/doctors/:id": "Delete a doctor and its appointments",
            },
            "appointments": {
                "GET /api/appointments": "List appointments (limit, offset, search)",
                "GET /api/appointments/today": "Appointments scheduled today",
                "GET /api/appointments/stats": "Appointment statistics",
                "GET /api/appointments/:id": "Get an appointment",
                "POST /api/appointments": "Book an appointment",
                "PUT /api/appointments/:id": "Replace an appointment",
                "DELETE /api/appointments/:id": "Delete an appointment",
            },
            "health": {
                "GET /health": "Service and database health",
                "GET /api/health": "Service and database health",
            },
        },
    }))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "message": format!("No route for {}", uri.path()),
        })),
    )
}
