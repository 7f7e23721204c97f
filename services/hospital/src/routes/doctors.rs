//! Doctor endpoints

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
    models::{DoctorPayload, ListQuery},
    state::AppState,
};

const ENTITY: &str = "Doctor";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/doctors", get(list_doctors).post(create_doctor))
        .route("/api/doctors/stats", get(doctor_stats))
        .route(
            "/api/doctors/:id",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
}

pub async fn list_doctors(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    if let Some(term) = query.search_term() {
        let doctors = state.doctors.search(term, query.limit).await?;
        return Ok(list_envelope(doctors));
    }

    let page = query.page();
    let doctors = state.doctors.find_all(page).await?;
    Ok(page_envelope(doctors, page))
}

pub async fn doctor_stats(State(state): State<AppState>) -> impl IntoResponse {
    data_envelope(state.stats.doctor_stats().await)
}

pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    let doctor = state
        .doctors
        .find_by_id(id)
        .await?
        .ok_or(HospitalError::NotFound { entity: ENTITY })?;

    Ok(data_envelope(doctor))
}

pub async fn create_doctor(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<DoctorPayload>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    let doctor = state.doctors.create(&payload).await?;
    Ok((
        StatusCode::CREATED,
        write_envelope("Doctor created successfully", doctor),
    ))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<DoctorPayload>, HospitalError>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    let doctor = state.doctors.update(id, &payload).await?;
    Ok(write_envelope("Doctor updated successfully", doctor))
}

pub async fn delete_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HospitalResult<impl IntoResponse> {
    let id = parse_id(&id, ENTITY)?;
    state.doctors.delete(id).await?;
    Ok(message_envelope("Doctor deleted successfully"))
}
