//! Doctor repository

use std::sync::Arc;
use tracing::info;

use super::{email_conflict, store_failure};
use crate::{
    error::{HospitalError, HospitalResult},
    models::{Doctor, DoctorPayload, Page},
    store::DoctorStore,
};

const ENTITY: &str = "Doctor";

/// Doctor repository for validated reads and writes
#[derive(Clone)]
pub struct DoctorRepository {
    store: Arc<dyn DoctorStore>,
}

impl DoctorRepository {
    pub fn new(store: Arc<dyn DoctorStore>) -> Self {
        Self { store }
    }

    /// List doctors alphabetically
    pub async fn find_all(&self, page: Page) -> HospitalResult<Vec<Doctor>> {
        self.store
            .list_doctors(page)
            .await
            .map_err(store_failure("list doctors"))
    }

    pub async fn find_by_id(&self, id: i64) -> HospitalResult<Option<Doctor>> {
        if id <= 0 {
            return Ok(None);
        }
        self.store
            .find_doctor(id)
            .await
            .map_err(store_failure("find doctor"))
    }

    pub async fn find_by_email(&self, email: &str) -> HospitalResult<Option<Doctor>> {
        self.store
            .find_doctor_by_email(&email.trim().to_lowercase())
            .await
            .map_err(store_failure("find doctor by email"))
    }

    pub async fn search(&self, term: &str, limit: Option<i64>) -> HospitalResult<Vec<Doctor>> {
        self.store
            .search_doctors(term.trim(), Page::clamp_limit(limit))
            .await
            .map_err(store_failure("search doctors"))
    }

    pub async fn create(&self, payload: &DoctorPayload) -> HospitalResult<Doctor> {
        let doctor = payload.validate()?;

        if self.find_by_email(&doctor.email).await?.is_some() {
            return Err(HospitalError::DuplicateEmail { entity: ENTITY });
        }

        let id = self
            .store
            .insert_doctor(&doctor)
            .await
            .map_err(email_conflict(ENTITY, "insert doctor"))?;
        info!(doctor_id = id, specialization = %doctor.specialization, "Created doctor");

        self.reload(id).await
    }

    pub async fn update(&self, id: i64, payload: &DoctorPayload) -> HospitalResult<Doctor> {
        let doctor = payload.validate()?;

        if self.find_by_id(id).await?.is_none() {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        if let Some(other) = self.find_by_email(&doctor.email).await? {
            if other.id != id {
                return Err(HospitalError::DuplicateEmail { entity: ENTITY });
            }
        }

        let updated = self
            .store
            .update_doctor(id, &doctor)
            .await
            .map_err(email_conflict(ENTITY, "update doctor"))?;
        if !updated {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        info!(doctor_id = id, "Updated doctor");

        self.reload(id).await
    }

    /// Delete a doctor together with its appointments
    pub async fn delete(&self, id: i64) -> HospitalResult<()> {
        let deleted = id > 0
            && self
                .store
                .delete_doctor(id)
                .await
                .map_err(store_failure("delete doctor"))?;

        if !deleted {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        info!(doctor_id = id, "Deleted doctor");
        Ok(())
    }

    async fn reload(&self, id: i64) -> HospitalResult<Doctor> {
        self.find_by_id(id)
            .await?
            .ok_or(HospitalError::NotFound { entity: ENTITY })
    }
}
