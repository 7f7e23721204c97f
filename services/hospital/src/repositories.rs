//! Repositories: validated CRUD over the datastore ports

use common::error::DatabaseError;

use crate::error::HospitalError;

pub mod appointment;
pub mod doctor;
pub mod patient;

pub use appointment::AppointmentRepository;
pub use doctor::DoctorRepository;
pub use patient::PatientRepository;

/// Log a datastore failure with the operation that hit it and wrap it
pub(crate) fn store_failure(operation: &'static str) -> impl FnOnce(DatabaseError) -> HospitalError {
    move |e| {
        tracing::error!(operation, "Datastore operation failed: {}", e);
        HospitalError::Store(e)
    }
}

/// Map a unique-email violation onto [`HospitalError::DuplicateEmail`]
pub(crate) fn email_conflict(
    entity: &'static str,
    operation: &'static str,
) -> impl FnOnce(DatabaseError) -> HospitalError {
    move |e| match e {
        DatabaseError::UniqueViolation { .. } => HospitalError::DuplicateEmail { entity },
        other => store_failure(operation)(other),
    }
}
