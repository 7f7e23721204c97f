//! Dashboard rollups
//!
//! Every method here degrades to the zeroed shape when the datastore
//! fails; the failure is logged and never reaches the caller.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::{
    models::{AppointmentStats, DoctorStats, PatientStats},
    store::{AppointmentStore, DoctorStore, PatientStore},
};

/// Window for the "new this week" patient count
pub const NEW_PATIENT_WINDOW_DAYS: i64 = 7;

#[derive(Clone)]
pub struct StatsAggregator {
    patients: Arc<dyn PatientStore>,
    doctors: Arc<dyn DoctorStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl StatsAggregator {
    pub fn new(
        patients: Arc<dyn PatientStore>,
        doctors: Arc<dyn DoctorStore>,
        appointments: Arc<dyn AppointmentStore>,
    ) -> Self {
        Self {
            patients,
            doctors,
            appointments,
        }
    }

    pub async fn patient_stats(&self) -> PatientStats {
        self.patient_stats_at(Utc::now()).await
    }

    /// Patient rollup with the rolling window ending at `now`
    pub async fn patient_stats_at(&self, now: DateTime<Utc>) -> PatientStats {
        let since = now - Duration::days(NEW_PATIENT_WINDOW_DAYS);
        match self.patients.patient_counts(since).await {
            Ok(counts) => counts.into(),
            Err(e) => {
                warn!("Failed to compute patient stats, returning defaults: {}", e);
                PatientStats::default()
            }
        }
    }

    pub async fn doctor_stats(&self) -> DoctorStats {
        match self.doctors.doctor_counts().await {
            Ok(counts) => counts.into(),
            Err(e) => {
                warn!("Failed to compute doctor stats, returning defaults: {}", e);
                DoctorStats::default()
            }
        }
    }

    /// Appointment rollup for the server's current calendar day
    pub async fn appointment_stats(&self) -> AppointmentStats {
        self.appointment_stats_on(Local::now().date_naive()).await
    }

    pub async fn appointment_stats_on(&self, today: NaiveDate) -> AppointmentStats {
        match self.appointments.appointment_counts(today).await {
            Ok(counts) => counts.into(),
            Err(e) => {
                warn!(%today, "Failed to compute appointment stats, returning defaults: {}", e);
                AppointmentStats::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{AppointmentStatus, NewAppointment, NewPatient},
        store::memory::MemoryStore,
    };
    use chrono::NaiveTime;
    use std::collections::BTreeMap;

    fn aggregator(store: &Arc<MemoryStore>) -> StatsAggregator {
        StatsAggregator::new(store.clone(), store.clone(), store.clone())
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    async fn book(
        store: &MemoryStore,
        patient: i64,
        doctor: i64,
        date: NaiveDate,
        hour: u32,
        status: AppointmentStatus,
    ) {
        store
            .insert_appointment(&NewAppointment {
                patient_id: patient,
                doctor_id: doctor,
                appointment_date: date,
                appointment_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                status,
                notes: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_store_yields_zeroes() {
        let store = Arc::new(MemoryStore::new());
        let stats = aggregator(&store);

        assert_eq!(stats.patient_stats().await, PatientStats::default());
        assert_eq!(stats.doctor_stats().await, DoctorStats::default());
        assert_eq!(stats.appointment_stats_on(day()).await, AppointmentStats::default());
    }

    #[tokio::test]
    async fn patient_rollup_rounds_average_and_windows_new_patients() {
        let store = Arc::new(MemoryStore::new());
        store.seed_patient("Jane Doe", "jane@example.com").await;
        let old = store.seed_patient("John Roe", "john@example.com").await;
        store
            .update_patient(
                old,
                &NewPatient {
                    name: "John Roe".to_string(),
                    age: 41,
                    phone: None,
                    email: "john@example.com".to_string(),
                    address: None,
                },
            )
            .await
            .unwrap();
        let now = Utc::now();
        store.backdate_patient(old, now - Duration::days(30));

        let stats = aggregator(&store).patient_stats_at(now).await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.average_age, 41); // 40.5 rounds up
        assert_eq!(stats.new_this_week, 1);
    }

    #[tokio::test]
    async fn doctor_rollup_counts_distinct_specializations() {
        let store = Arc::new(MemoryStore::new());
        store.seed_doctor("Meredith Grey", "Surgery", "grey@example.com").await;
        store.seed_doctor("Derek Shepherd", "Surgery", "shepherd@example.com").await;
        store.seed_doctor("Gregory House", "Diagnostics", "house@example.com").await;

        let stats = aggregator(&store).doctor_stats().await;
        assert_eq!(stats, DoctorStats { total: 3, specializations: 2 });
    }

    #[tokio::test]
    async fn appointment_rollup_counts_today_and_statuses() {
        let store = Arc::new(MemoryStore::new());
        let patient = store.seed_patient("Jane Doe", "jane@example.com").await;
        let doctor = store.seed_doctor("Meredith Grey", "Surgery", "grey@example.com").await;
        let tomorrow = day().succ_opt().unwrap();

        book(&store, patient, doctor, day(), 9, AppointmentStatus::Completed).await;
        book(&store, patient, doctor, day(), 10, AppointmentStatus::Scheduled).await;
        book(&store, patient, doctor, tomorrow, 9, AppointmentStatus::Scheduled).await;
        book(&store, patient, doctor, tomorrow, 10, AppointmentStatus::Completed).await;

        let stats = aggregator(&store).appointment_stats_on(day()).await;
        assert_eq!(stats.total, 4);
        assert_eq!(stats.today, 2);
        assert_eq!(stats.completed_today, 1);
        assert_eq!(
            stats.status_distribution,
            BTreeMap::from([
                (AppointmentStatus::Scheduled, 2),
                (AppointmentStatus::Completed, 2),
            ])
        );
        assert!(!stats.status_distribution.contains_key(&AppointmentStatus::Cancelled));
    }

    #[tokio::test]
    async fn store_failure_falls_back_to_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.seed_patient("Jane Doe", "jane@example.com").await;
        store.set_failing(true);
        let stats = aggregator(&store);

        assert_eq!(stats.patient_stats().await, PatientStats::default());
        assert_eq!(stats.doctor_stats().await, DoctorStats::default());
        assert_eq!(stats.appointment_stats().await, AppointmentStats::default());
    }
}
