//! Appointment repository: CRUD guarded by the booking rule

use chrono::{Local, NaiveDate};
use common::error::DatabaseError;
use std::sync::Arc;
use tracing::{debug, info};

use super::store_failure;
use crate::{
    booking::BookingChecker,
    error::{HospitalError, HospitalResult},
    models::{AppointmentPayload, AppointmentView, NewAppointment, Page},
    store::{AppointmentStore, DoctorStore, PatientStore},
    validation::ValidationErrors,
};

const ENTITY: &str = "Appointment";

/// Map write failures: a live-slot violation is a lost booking race, a
/// foreign key violation is a reference that vanished after it was checked
fn write_failure(operation: &'static str) -> impl FnOnce(DatabaseError) -> HospitalError {
    move |e| match e {
        DatabaseError::UniqueViolation { .. } => HospitalError::SchedulingConflict,
        DatabaseError::ForeignKeyViolation { constraint } if constraint.contains("doctor") => {
            ValidationErrors::single("doctor_id", "Doctor not found").into()
        }
        DatabaseError::ForeignKeyViolation { .. } => {
            ValidationErrors::single("patient_id", "Patient not found").into()
        }
        other => store_failure(operation)(other),
    }
}

/// Appointment repository
#[derive(Clone)]
pub struct AppointmentRepository {
    store: Arc<dyn AppointmentStore>,
    patients: Arc<dyn PatientStore>,
    doctors: Arc<dyn DoctorStore>,
    booking: BookingChecker,
}

impl AppointmentRepository {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        patients: Arc<dyn PatientStore>,
        doctors: Arc<dyn DoctorStore>,
    ) -> Self {
        Self {
            booking: BookingChecker::new(store.clone()),
            store,
            patients,
            doctors,
        }
    }

    /// List appointments, latest date and time first
    pub async fn find_all(&self, page: Page) -> HospitalResult<Vec<AppointmentView>> {
        self.store
            .list_appointments(page)
            .await
            .map_err(store_failure("list appointments"))
    }

    pub async fn find_by_id(&self, id: i64) -> HospitalResult<Option<AppointmentView>> {
        if id <= 0 {
            return Ok(None);
        }
        self.store
            .find_appointment(id)
            .await
            .map_err(store_failure("find appointment"))
    }

    /// Search by patient or doctor name
    pub async fn search(
        &self,
        term: &str,
        limit: Option<i64>,
    ) -> HospitalResult<Vec<AppointmentView>> {
        self.store
            .search_appointments(term.trim(), Page::clamp_limit(limit))
            .await
            .map_err(store_failure("search appointments"))
    }

    /// Appointments on the server's current calendar day
    pub async fn today(&self) -> HospitalResult<Vec<AppointmentView>> {
        self.on(Local::now().date_naive()).await
    }

    /// Appointments on `date`, earliest first
    pub async fn on(&self, date: NaiveDate) -> HospitalResult<Vec<AppointmentView>> {
        self.store
            .appointments_on(date)
            .await
            .map_err(store_failure("list appointments by date"))
    }

    /// Book an appointment
    ///
    /// A live booking is refused with [`HospitalError::SchedulingConflict`]
    /// when the doctor already holds the slot. Cancelled bookings never
    /// conflict.
    pub async fn create(&self, payload: &AppointmentPayload) -> HospitalResult<AppointmentView> {
        let appointment = payload.validate()?;
        self.resolve_references(&appointment).await?;

        let slot = appointment.slot();
        if appointment.status.occupies_slot() {
            self.booking.ensure_available(&slot, None).await?;
        }

        let id = self
            .store
            .insert_appointment(&appointment)
            .await
            .map_err(write_failure("insert appointment"))?;
        info!(appointment_id = id, %slot, status = %appointment.status, "Booked appointment");

        self.reload(id).await
    }

    /// Replace every mutable field of an appointment
    ///
    /// The slot is re-checked only when the booking would newly occupy it:
    /// the doctor, date or time changed, or a cancelled booking is revived.
    /// The appointment's own id is excluded from the check.
    pub async fn update(
        &self,
        id: i64,
        payload: &AppointmentPayload,
    ) -> HospitalResult<AppointmentView> {
        let appointment = payload.validate()?;

        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(HospitalError::NotFound { entity: ENTITY })?
            .appointment;
        self.resolve_references(&appointment).await?;

        let slot = appointment.slot();
        let moved = existing.slot() != slot;
        let revived = !existing.status.occupies_slot() && appointment.status.occupies_slot();
        if appointment.status.occupies_slot() && (moved || revived) {
            self.booking.ensure_available(&slot, Some(id)).await?;
        } else {
            debug!(appointment_id = id, "Slot unchanged, skipping availability check");
        }

        let updated = self
            .store
            .update_appointment(id, &appointment)
            .await
            .map_err(write_failure("update appointment"))?;
        if !updated {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        info!(appointment_id = id, %slot, status = %appointment.status, "Updated appointment");

        self.reload(id).await
    }

    pub async fn delete(&self, id: i64) -> HospitalResult<()> {
        let deleted = id > 0
            && self
                .store
                .delete_appointment(id)
                .await
                .map_err(store_failure("delete appointment"))?;

        if !deleted {
            return Err(HospitalError::NotFound { entity: ENTITY });
        }
        info!(appointment_id = id, "Deleted appointment");
        Ok(())
    }

    /// Both references must name existing rows
    async fn resolve_references(&self, appointment: &NewAppointment) -> HospitalResult<()> {
        let mut errors = ValidationErrors::new();

        let patient = self
            .patients
            .find_patient(appointment.patient_id)
            .await
            .map_err(store_failure("resolve patient"))?;
        if patient.is_none() {
            errors.add("patient_id", "Patient not found");
        }

        let doctor = self
            .doctors
            .find_doctor(appointment.doctor_id)
            .await
            .map_err(store_failure("resolve doctor"))?;
        if doctor.is_none() {
            errors.add("doctor_id", "Doctor not found");
        }

        errors.finish(|| ()).map_err(HospitalError::from)
    }

    async fn reload(&self, id: i64) -> HospitalResult<AppointmentView> {
        self.find_by_id(id)
            .await?
            .ok_or(HospitalError::NotFound { entity: ENTITY })
    }
}
