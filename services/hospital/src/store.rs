//! Datastore ports
//!
//! Repositories talk to the database only through these traits. The
//! PostgreSQL adapter lives in [`postgres`]; tests run against the
//! in-memory adapter in `memory`. Method names are unique across the traits
//! so a single adapter type can implement all of them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::error::DatabaseResult;

use crate::{
    booking::Slot,
    models::{
        AppointmentCounts, AppointmentView, Doctor, DoctorCounts, NewAppointment, NewDoctor,
        NewPatient, Page, Patient, PatientCounts,
    },
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Row-level access to patients
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Newest first
    async fn list_patients(&self, page: Page) -> DatabaseResult<Vec<Patient>>;

    async fn find_patient(&self, id: i64) -> DatabaseResult<Option<Patient>>;

    async fn find_patient_by_email(&self, email: &str) -> DatabaseResult<Option<Patient>>;

    /// Case-insensitive substring match on name, email or phone, by name
    async fn search_patients(&self, term: &str, limit: i64) -> DatabaseResult<Vec<Patient>>;

    /// Returns the assigned id
    async fn insert_patient(&self, patient: &NewPatient) -> DatabaseResult<i64>;

    /// Overwrite every mutable field; false when the id does not exist
    async fn update_patient(&self, id: i64, patient: &NewPatient) -> DatabaseResult<bool>;

    /// Removes the patient and, by cascade, its appointments
    async fn delete_patient(&self, id: i64) -> DatabaseResult<bool>;

    async fn patient_counts(&self, created_since: DateTime<Utc>) -> DatabaseResult<PatientCounts>;
}

/// Row-level access to doctors
#[async_trait]
pub trait DoctorStore: Send + Sync {
    /// Alphabetical by name
    async fn list_doctors(&self, page: Page) -> DatabaseResult<Vec<Doctor>>;

    async fn find_doctor(&self, id: i64) -> DatabaseResult<Option<Doctor>>;

    async fn find_doctor_by_email(&self, email: &str) -> DatabaseResult<Option<Doctor>>;

    async fn search_doctors(&self, term: &str, limit: i64) -> DatabaseResult<Vec<Doctor>>;

    async fn insert_doctor(&self, doctor: &NewDoctor) -> DatabaseResult<i64>;

    async fn update_doctor(&self, id: i64, doctor: &NewDoctor) -> DatabaseResult<bool>;

    async fn delete_doctor(&self, id: i64) -> DatabaseResult<bool>;

    async fn doctor_counts(&self) -> DatabaseResult<DoctorCounts>;
}

/// Row-level access to appointments; reads return the joined view
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Latest date and time first
    async fn list_appointments(&self, page: Page) -> DatabaseResult<Vec<AppointmentView>>;

    async fn find_appointment(&self, id: i64) -> DatabaseResult<Option<AppointmentView>>;

    /// Case-insensitive substring match on patient or doctor name
    async fn search_appointments(
        &self,
        term: &str,
        limit: i64,
    ) -> DatabaseResult<Vec<AppointmentView>>;

    /// Latest date and time first
    async fn appointments_for_patient(
        &self,
        patient_id: i64,
    ) -> DatabaseResult<Vec<AppointmentView>>;

    /// Earliest time first
    async fn appointments_on(&self, date: NaiveDate) -> DatabaseResult<Vec<AppointmentView>>;

    /// Non-cancelled appointments holding `slot`, ignoring `exclude`
    async fn count_active_in_slot(&self, slot: &Slot, exclude: Option<i64>)
    -> DatabaseResult<i64>;

    async fn insert_appointment(&self, appointment: &NewAppointment) -> DatabaseResult<i64>;

    async fn update_appointment(
        &self,
        id: i64,
        appointment: &NewAppointment,
    ) -> DatabaseResult<bool>;

    async fn delete_appointment(&self, id: i64) -> DatabaseResult<bool>;

    async fn appointment_counts(&self, today: NaiveDate) -> DatabaseResult<AppointmentCounts>;
}

/// Liveness probe for the backing datastore
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> DatabaseResult<bool>;
}

/// Build a `LIKE` pattern matching `term` anywhere, with wildcards escaped
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
