//! Patient repository

use std::sync::Arc;
use tracing::info;

use super::{email_conflict, store_failure};
use crate::{
    error::{HospitalError, HospitalResult},
    models::{AppointmentView, Page, Patient, PatientPayload},
    store::{AppointmentStore, PatientStore},
};

const ENTITY: &str = "Patient";

/// Patient repository for validated reads and writes
#[derive(Clone)]
pub struct PatientRepository {
    store: Arc<dyn PatientStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl PatientRepository {
    pub fn new(store: Arc<dyn PatientStore>, appointments: Arc<dyn AppointmentStore>) -> Self {
        Self {
            store,
            appointments,
        }
    }

    /// List patients, newest first
    pub async fn find_all(&self, page: Page) -> HospitalResult<Vec<Patient>> {
        self.store
            .list_patients(page)
            .await
            .map_err(store_failure("list patients"))
    }

    /// Find a patient by id; non-positive ids never match
    pub async fn find_by_id(&self, id: i64) -> HospitalResult<Option<Patient>> {
        if id <= 0 {
            return Ok(None);
        }
        self.store
            .find_patient(id)
            .await
            .map_err(store_failure("find patient"))
    }

    pub async fn find_by_email(&self, email: &str) -> HospitalResult<Option<Patient>> {
        self.store
            .find_patient_by_email(&email.trim().to_lowercase())
            .await
            .map_err(store_failure("find patient by email"))
    }

    /// Search by name, email or phone
    pub async fn search(&self, term: &str, limit: Option<i64>) -> HospitalResult<Vec<Patient>> {
        self.store
            .search_patients(term.trim(), Page::clamp_limit(limit))
            .await
            .map_err(store_failure("search patients"))
    }

    /// Validate and insert a patient
    pub async fn create(&self, payload: &PatientPayload) -> HospitalResult<Patient> {
        let patient = payload.validate()?;

        if self.find_by_email(&patient.email).await?.is_some() {
            return Err(HospitalError::DuplicateEmail { entity: ENTITY });
        }

        let id = self
            .store
            .insert_patient(&patient)
            .await
            .map_err(email_conflict(ENTITY, "insert patient"))?;
        info!(patient_id = id, "Created patient");

        self.reload(id).await
    }

    /// Validate and replace every mutable field of a patient
    pub async fn update(&self, id: i64, payload: &PatientPayload) -> HospitalResult<Patient> {
        let patient = payload.validate()?;

        if self.find_by_id(id).await?.is_none() {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        if let Some(other) = self.find_by_email(&patient.email).await? {
            if other.id != id {
                return Err(HospitalError::DuplicateEmail { entity: ENTITY });
            }
        }

        let updated = self
            .store
            .update_patient(id, &patient)
            .await
            .map_err(email_conflict(ENTITY, "update patient"))?;
        if !updated {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        info!(patient_id = id, "Updated patient");

        self.reload(id).await
    }

    /// Delete a patient together with its appointments
    pub async fn delete(&self, id: i64) -> HospitalResult<()> {
        let deleted = id > 0
            && self
                .store
                .delete_patient(id)
                .await
                .map_err(store_failure("delete patient"))?;

        if !deleted {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        info!(patient_id = id, "Deleted patient");
        Ok(())
    }

    /// Appointment history of one patient, latest first
    pub async fn appointments(&self, id: i64) -> HospitalResult<Vec<AppointmentView>> {
        if self.find_by_id(id).await?.is_none() {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        self.appointments
            .appointments_for_patient(id)
            .await
            .map_err(store_failure("list patient appointments"))
    }

    async fn reload(&self, id: i64) -> HospitalResult<Patient> {
        self.find_by_id(id)
            .await?
            .ok_or(HospitalError::NotFound { entity: ENTITY })
    }
}
