//! In-memory datastore used by the test suites
//!
//! Mirrors the relational schema closely enough for repository tests: email
//! uniqueness, foreign keys with cascading deletes, joined views. The live
//! slot index is deliberately absent so tests can build the anomalies the
//! repositories must tolerate.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::{
    collections::BTreeMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use super::{AppointmentStore, DoctorStore, HealthProbe, PatientStore};
use crate::{
    booking::Slot,
    models::{
        Appointment, AppointmentCounts, AppointmentStatus, AppointmentView, Doctor, DoctorCounts,
        NewAppointment, NewDoctor, NewPatient, Page, Patient, PatientCounts,
    },
};

#[derive(Default)]
struct State {
    next_id: i64,
    patients: BTreeMap<i64, Patient>,
    doctors: BTreeMap<i64, Doctor>,
    appointments: BTreeMap<i64, Appointment>,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn view(&self, appointment: &Appointment) -> Option<AppointmentView> {
        let patient = self.patients.get(&appointment.patient_id)?;
        let doctor = self.doctors.get(&appointment.doctor_id)?;
        Some(AppointmentView {
            appointment: appointment.clone(),
            patient_name: patient.name.clone(),
            doctor_name: doctor.name.clone(),
            doctor_specialization: doctor.specialization.clone(),
        })
    }

    fn views(&self, keep: impl Fn(&Appointment) -> bool) -> Vec<AppointmentView> {
        self.appointments
            .values()
            .filter(|appointment| keep(appointment))
            .filter_map(|appointment| self.view(appointment))
            .collect()
    }

    fn check_references(&self, appointment: &NewAppointment) -> DatabaseResult<()> {
        if !self.patients.contains_key(&appointment.patient_id) {
            return Err(DatabaseError::ForeignKeyViolation {
                constraint: "appointments_patient_id_fkey".to_string(),
            });
        }
        if !self.doctors.contains_key(&appointment.doctor_id) {
            return Err(DatabaseError::ForeignKeyViolation {
                constraint: "appointments_doctor_id_fkey".to_string(),
            });
        }
        Ok(())
    }
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
}

fn newest_slot_first(views: &mut [AppointmentView]) {
    views.sort_by(|a, b| {
        let a = &a.appointment;
        let b = &b.appointment;
        (b.appointment_date, b.appointment_time, b.id).cmp(&(
            a.appointment_date,
            a.appointment_time,
            a.id,
        ))
    });
}

fn window<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(usize::try_from(page.offset).unwrap_or_default())
        .take(usize::try_from(page.limit).unwrap_or_default())
        .collect()
}

/// Datastore held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation fails like an unreachable database
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn state(&self) -> DatabaseResult<MutexGuard<'_, State>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query(sqlx::Error::PoolTimedOut));
        }
        Ok(self.state.lock().expect("memory store lock poisoned"))
    }

    pub async fn seed_patient(&self, name: &str, email: &str) -> i64 {
        self.insert_patient(&NewPatient {
            name: name.to_string(),
            age: 40,
            phone: None,
            email: email.to_string(),
            address: None,
        })
        .await
        .expect("seed patient")
    }

    pub async fn seed_doctor(&self, name: &str, specialization: &str, email: &str) -> i64 {
        self.insert_doctor(&NewDoctor {
            name: name.to_string(),
            specialization: specialization.to_string(),
            phone: None,
            email: email.to_string(),
        })
        .await
        .expect("seed doctor")
    }

    /// Rewrite a patient's creation time
    pub fn backdate_patient(&self, id: i64, created_at: DateTime<Utc>) {
        let mut state = self.state.lock().expect("memory store lock poisoned");
        if let Some(patient) = state.patients.get_mut(&id) {
            patient.created_at = created_at;
        }
    }

    pub fn patient_count(&self) -> usize {
        self.state.lock().expect("memory store lock poisoned").patients.len()
    }

    pub fn appointment_count(&self) -> usize {
        self.state
            .lock()
            .expect("memory store lock poisoned")
            .appointments
            .len()
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn list_patients(&self, page: Page) -> DatabaseResult<Vec<Patient>> {
        let state = self.state()?;
        let mut patients: Vec<Patient> = state.patients.values().cloned().collect();
        patients.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(window(patients, page))
    }

    async fn find_patient(&self, id: i64) -> DatabaseResult<Option<Patient>> {
        Ok(self.state()?.patients.get(&id).cloned())
    }

    async fn find_patient_by_email(&self, email: &str) -> DatabaseResult<Option<Patient>> {
        Ok(self
            .state()?
            .patients
            .values()
            .find(|patient| patient.email == email)
            .cloned())
    }

    async fn search_patients(&self, term: &str, limit: i64) -> DatabaseResult<Vec<Patient>> {
        let state = self.state()?;
        let mut patients: Vec<Patient> = state
            .patients
            .values()
            .filter(|p| {
                contains(Some(p.name.as_str()), term)
                    || contains(Some(p.email.as_str()), term)
                    || contains(p.phone.as_deref(), term)
            })
            .cloned()
            .collect();
        patients.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(window(patients, Page { limit, offset: 0 }))
    }

    async fn insert_patient(&self, patient: &NewPatient) -> DatabaseResult<i64> {
        let mut state = self.state()?;
        if state.patients.values().any(|p| p.email == patient.email) {
            return Err(DatabaseError::UniqueViolation {
                constraint: "patients_email_key".to_string(),
            });
        }
        let id = state.allocate_id();
        let now = Utc::now();
        state.patients.insert(
            id,
            Patient {
                id,
                name: patient.name.clone(),
                age: patient.age,
                phone: patient.phone.clone(),
                email: patient.email.clone(),
                address: patient.address.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_patient(&self, id: i64, patient: &NewPatient) -> DatabaseResult<bool> {
        let mut state = self.state()?;
        if state
            .patients
            .values()
            .any(|p| p.id != id && p.email == patient.email)
        {
            return Err(DatabaseError::UniqueViolation {
                constraint: "patients_email_key".to_string(),
            });
        }
        let Some(existing) = state.patients.get_mut(&id) else {
            return Ok(false);
        };
        existing.name = patient.name.clone();
        existing.age = patient.age;
        existing.phone = patient.phone.clone();
        existing.email = patient.email.clone();
        existing.address = patient.address.clone();
        existing.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_patient(&self, id: i64) -> DatabaseResult<bool> {
        let mut state = self.state()?;
        let removed = state.patients.remove(&id).is_some();
        state.appointments.retain(|_, a| a.patient_id != id);
        Ok(removed)
    }

    async fn patient_counts(&self, created_since: DateTime<Utc>) -> DatabaseResult<PatientCounts> {
        let state = self.state()?;
        let total = state.patients.len();
        let age_sum: i64 = state.patients.values().map(|p| i64::from(p.age)).sum();
        let average_age = (total > 0).then(|| age_sum as f64 / total as f64);
        let created_since = state
            .patients
            .values()
            .filter(|p| p.created_at >= created_since)
            .count();

        Ok(PatientCounts {
            total: total as i64,
            average_age,
            created_since: created_since as i64,
        })
    }
}

#[async_trait]
impl DoctorStore for MemoryStore {
    async fn list_doctors(&self, page: Page) -> DatabaseResult<Vec<Doctor>> {
        let state = self.state()?;
        let mut doctors: Vec<Doctor> = state.doctors.values().cloned().collect();
        doctors.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(window(doctors, page))
    }

    async fn find_doctor(&self, id: i64) -> DatabaseResult<Option<Doctor>> {
        Ok(self.state()?.doctors.get(&id).cloned())
    }

    async fn find_doctor_by_email(&self, email: &str) -> DatabaseResult<Option<Doctor>> {
        Ok(self
            .state()?
            .doctors
            .values()
            .find(|doctor| doctor.email == email)
            .cloned())
    }

    async fn search_doctors(&self, term: &str, limit: i64) -> DatabaseResult<Vec<Doctor>> {
        let state = self.state()?;
        let mut doctors: Vec<Doctor> = state
            .doctors
            .values()
            .filter(|d| {
                contains(Some(d.name.as_str()), term)
                    || contains(Some(d.email.as_str()), term)
                    || contains(d.phone.as_deref(), term)
            })
            .cloned()
            .collect();
        doctors.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(window(doctors, Page { limit, offset: 0 }))
    }

    async fn insert_doctor(&self, doctor: &NewDoctor) -> DatabaseResult<i64> {
        let mut state = self.state()?;
        if state.doctors.values().any(|d| d.email == doctor.email) {
            return Err(DatabaseError::UniqueViolation {
                constraint: "doctors_email_key".to_string(),
            });
        }
        let id = state.allocate_id();
        let now = Utc::now();
        state.doctors.insert(
            id,
            Doctor {
                id,
                name: doctor.name.clone(),
                specialization: doctor.specialization.clone(),
                phone: doctor.phone.clone(),
                email: doctor.email.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_doctor(&self, id: i64, doctor: &NewDoctor) -> DatabaseResult<bool> {
        let mut state = self.state()?;
        if state
            .doctors
            .values()
            .any(|d| d.id != id && d.email == doctor.email)
        {
            return Err(DatabaseError::UniqueViolation {
                constraint: "doctors_email_key".to_string(),
            });
        }
        let Some(existing) = state.doctors.get_mut(&id) else {
            return Ok(false);
        };
        existing.name = doctor.name.clone();
        existing.specialization = doctor.specialization.clone();
        existing.phone = doctor.phone.clone();
        existing.email = doctor.email.clone();
        existing.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_doctor(&self, id: i64) -> DatabaseResult<bool> {
        let mut state = self.state()?;
        let removed = state.doctors.remove(&id).is_some();
        state.appointments.retain(|_, a| a.doctor_id != id);
        Ok(removed)
    }

    async fn doctor_counts(&self) -> DatabaseResult<DoctorCounts> {
        let state = self.state()?;
        let mut specializations: Vec<&str> = state
            .doctors
            .values()
            .map(|d| d.specialization.as_str())
            .collect();
        specializations.sort_unstable();
        specializations.dedup();

        Ok(DoctorCounts {
            total: state.doctors.len() as i64,
            specializations: specializations.len() as i64,
        })
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn list_appointments(&self, page: Page) -> DatabaseResult<Vec<AppointmentView>> {
        let mut views = self.state()?.views(|_| true);
        newest_slot_first(&mut views);
        Ok(window(views, page))
    }

    async fn find_appointment(&self, id: i64) -> DatabaseResult<Option<AppointmentView>> {
        let state = self.state()?;
        Ok(state.appointments.get(&id).and_then(|a| state.view(a)))
    }

    async fn search_appointments(
        &self,
        term: &str,
        limit: i64,
    ) -> DatabaseResult<Vec<AppointmentView>> {
        let mut views: Vec<AppointmentView> = self
            .state()?
            .views(|_| true)
            .into_iter()
            .filter(|v| {
                contains(Some(v.patient_name.as_str()), term)
                    || contains(Some(v.doctor_name.as_str()), term)
            })
            .collect();
        newest_slot_first(&mut views);
        Ok(window(views, Page { limit, offset: 0 }))
    }

    async fn appointments_for_patient(
        &self,
        patient_id: i64,
    ) -> DatabaseResult<Vec<AppointmentView>> {
        let mut views = self.state()?.views(|a| a.patient_id == patient_id);
        newest_slot_first(&mut views);
        Ok(views)
    }

    async fn appointments_on(&self, date: NaiveDate) -> DatabaseResult<Vec<AppointmentView>> {
        let mut views = self.state()?.views(|a| a.appointment_date == date);
        views.sort_by_key(|v| (v.appointment.appointment_time, v.appointment.id));
        Ok(views)
    }

    async fn count_active_in_slot(
        &self,
        slot: &Slot,
        exclude: Option<i64>,
    ) -> DatabaseResult<i64> {
        let count = self
            .state()?
            .appointments
            .values()
            .filter(|a| a.slot() == *slot)
            .filter(|a| a.status.occupies_slot())
            .filter(|a| Some(a.id) != exclude)
            .count();
        Ok(count as i64)
    }

    async fn insert_appointment(&self, appointment: &NewAppointment) -> DatabaseResult<i64> {
        let mut state = self.state()?;
        state.check_references(appointment)?;
        let id = state.allocate_id();
        let now = Utc::now();
        state.appointments.insert(
            id,
            Appointment {
                id,
                patient_id: appointment.patient_id,
                doctor_id: appointment.doctor_id,
                appointment_date: appointment.appointment_date,
                appointment_time: appointment.appointment_time,
                status: appointment.status,
                notes: appointment.notes.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_appointment(
        &self,
        id: i64,
        appointment: &NewAppointment,
    ) -> DatabaseResult<bool> {
        let mut state = self.state()?;
        state.check_references(appointment)?;
        let Some(existing) = state.appointments.get_mut(&id) else {
            return Ok(false);
        };
        existing.patient_id = appointment.patient_id;
        existing.doctor_id = appointment.doctor_id;
        existing.appointment_date = appointment.appointment_date;
        existing.appointment_time = appointment.appointment_time;
        existing.status = appointment.status;
        existing.notes = appointment.notes.clone();
        existing.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_appointment(&self, id: i64) -> DatabaseResult<bool> {
        Ok(self.state()?.appointments.remove(&id).is_some())
    }

    async fn appointment_counts(&self, today: NaiveDate) -> DatabaseResult<AppointmentCounts> {
        let state = self.state()?;
        let on_today = |a: &&Appointment| a.appointment_date == today;

        let mut by_status = BTreeMap::<AppointmentStatus, i64>::new();
        for appointment in state.appointments.values() {
            *by_status.entry(appointment.status).or_default() += 1;
        }

        Ok(AppointmentCounts {
            total: state.appointments.len() as i64,
            today: state.appointments.values().filter(on_today).count() as i64,
            completed_today: state
                .appointments
                .values()
                .filter(on_today)
                .filter(|a| a.status == AppointmentStatus::Completed)
                .count() as i64,
            by_status: by_status.into_iter().collect(),
        })
    }
}

#[async_trait]
impl HealthProbe for MemoryStore {
    async fn ping(&self) -> DatabaseResult<bool> {
        Ok(!self.failing.load(Ordering::SeqCst))
    }
}
