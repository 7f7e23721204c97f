//! Patient endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;

use super::{
    data_envelope, list_envelope, message_envelope, page_envelope, parse_id, write_envelope,
};
use crate::{
    error::{HospitalError, HospitalResult},
    models::{ListQuery, PatientPayload},
    state::AppState,
};

const ENTITY: &str = "Patient";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/patients", get(list_patients).post(create_patient))
        .route("/api/patients/stats", get(patient_stats))
        .route(
            "/api/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/api/patients/:id/appointments", get(patient_appointments))
}

/// List or search patients
pub async fn list_patients(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    if let Some(term) = query.search_term() {
        let patients = state.patients.search(term, query.limit).await?;
        return Ok(list_envelope(patients));
    }

    let page = query.page();
    let patients = state.patients.find_all(page).await?;
    Ok(page_envelope(patients, page))
}

pub async fn patient_stats(State(state): State<AppState>) -> impl IntoResponse {
    data_envelope(state.stats.patient_stats().await)
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    let patient = state
        .patients
        .find_by_id(id)
        .await?
        .ok_or(HospitalError::NotFound { entity: ENTITY })?;

    Ok(data_envelope(patient))
}

pub async fn patient_appointments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    let appointments = state.patients.appointments(id).await?;
    Ok(list_envelope(appointments))
}

pub async fn create_patient(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<PatientPayload>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    let patient = state.patients.create(&payload).await?;
    Ok((
        StatusCode::CREATED,
        write_envelope("Patient created successfully", patient),
    ))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<PatientPayload>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    let patient = state.patients.update(id, &payload).await?;
    Ok(write_envelope("Patient updated successfully", patient))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    state.patients.delete(id).await?;
    Ok(message_envelope("Patient deleted successfully"))
}
