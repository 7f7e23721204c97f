//! Domain records, request payloads and read views

use serde::{Deserialize, Serialize};

pub mod appointment;
pub mod doctor;
pub mod patient;
pub mod stats;

pub use appointment::{
    Appointment, AppointmentPayload, AppointmentStatus, AppointmentView, NewAppointment,
};
pub use doctor::{Doctor, DoctorPayload, NewDoctor};
pub use patient::{NewPatient, Patient, PatientPayload};
pub use stats::{
    AppointmentCounts, AppointmentStats, DoctorCounts, DoctorStats, PatientCounts, PatientStats,
};

/// A bounded window over an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    /// Clamp caller-supplied bounds: limit into `[1, 100]` (default 50),
    /// offset to at least 0 (default 0)
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: Self::clamp_limit(limit),
            offset: offset.unwrap_or(0).max(0),
        }
    }

    pub fn clamp_limit(limit: Option<i64>) -> i64 {
        limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Query parameters accepted by every list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }

    /// The trimmed search term, if one was given
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}
