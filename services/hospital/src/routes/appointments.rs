//! Appointment endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;
use chrono::Local;
use serde_json::json;

use super::{
    data_envelope, list_envelope, message_envelope, page_envelope, parse_id, write_envelope,
};
use crate::{
    error::{HospitalError, HospitalResult},
    models::{AppointmentPayload, ListQuery},
    state::AppState,
};

const ENTITY: &str = "Appointment";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route("/api/appointments/today", get(today_appointments))
        .route("/api/appointments/stats", get(appointment_stats))
        .route(
            "/api/appointments/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
}

pub async fn list_appointments(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    if let Some(term) = query.search_term() {
        let appointments = state.appointments.search(term, query.limit).await?;
        return Ok(list_envelope(appointments));
    }

    let page = query.page();
    let appointments = state.appointments.find_all(page).await?;
    Ok(page_envelope(appointments, page))
}

/// Appointments on the server's current calendar day
pub async fn today_appointments(
    State(state): State<AppState>,
) -> HospitalResult<impl IntoResponse> {
    let today = Local::now().date_naive();
    let appointments = state.appointments.on(today).await?;

    Ok(Json(json!({
        "success": true,
        "date": today,
        "count": appointments.len(),
        "data": appointments,
    })))
}

pub async fn appointment_stats(State(state): State<AppState>) -> impl IntoResponse {
    data_envelope(state.stats.appointment_stats().await)
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    let appointment = state
        .appointments
        .find_by_id(id)
        .await?
        .ok_or(HospitalError::NotFound { entity: ENTITY })?;

    Ok(data_envelope(appointment))
}

pub async fn create_appointment(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<AppointmentPayload>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    let appointment = state.appointments.create(&payload).await?;
    Ok((
        StatusCode::CREATED,
        write_envelope("Appointment created successfully", appointment),
    ))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<AppointmentPayload>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    let appointment = state.appointments.update(id, &payload).await?;
    Ok(write_envelope("Appointment updated successfully", appointment))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    state.appointments.delete(id).await?;
    Ok(message_envelope("Appointment deleted successfully"))
}
