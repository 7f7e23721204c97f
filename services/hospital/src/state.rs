//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    config::ServerConfig,
    rate_limiter::RateLimiter,
    repositories::{AppointmentRepository, DoctorRepository, PatientRepository},
    stats::StatsAggregator,
    store::{AppointmentStore, DoctorStore, HealthProbe, PatientStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub patients: PatientRepository,
    pub doctors: DoctorRepository,
    pub appointments: AppointmentRepository,
    pub stats: StatsAggregator,
    pub health: Arc<dyn HealthProbe>,
    pub environment: String,
    pub rate_limiter: RateLimiter,
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Wire every repository to one datastore implementing all ports
    pub fn from_store<S>(store: Arc<S>, config: &ServerConfig) -> Self
    where
        S: PatientStore + DoctorStore + AppointmentStore + HealthProbe + 'static,
    {
        let patients: Arc<dyn PatientStore> = store.clone();
        let doctors: Arc<dyn DoctorStore> = store.clone();
        let appointments: Arc<dyn AppointmentStore> = store.clone();

        Self {
            patients: PatientRepository::new(patients.clone(), appointments.clone()),
            doctors: DoctorRepository::new(doctors.clone()),
            appointments: AppointmentRepository::new(
                appointments.clone(),
                patients.clone(),
                doctors.clone(),
            ),
            stats: StatsAggregator::new(patients, doctors, appointments),
            health: store,
            environment: config.environment.clone(),
            rate_limiter: RateLimiter::new(config.rate_limit()),
            allowed_origins: config.allowed_origins(),
        }
    }
}
