//! Appointment model, its status lifecycle and the joined read view

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::{
    booking::Slot,
    validation::{
        NOTES_MAX, ValidationErrors, non_blank, parse_date, parse_time, validate_max_len,
        validate_reference,
    },
};

/// Appointment lifecycle status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [Self; 3] = [Self::Scheduled, Self::Completed, Self::Cancelled];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether an appointment in this status holds its slot
    pub fn occupies_slot(self) -> bool {
        self != Self::Cancelled
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown appointment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// Appointment entity as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn slot(&self) -> Slot {
        Slot::new(self.doctor_id, self.appointment_date, self.appointment_time)
    }
}

/// Appointment joined with the display fields of its patient and doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_specialization: String,
}

/// Validated appointment fields, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn slot(&self) -> Slot {
        Slot::new(self.doctor_id, self.appointment_date, self.appointment_time)
    }
}

/// Appointment creation or replacement payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentPayload {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentPayload {
    pub fn validate(&self) -> Result<NewAppointment, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let patient_id = self.patient_id.unwrap_or_default();
        errors.check("patient_id", validate_reference(patient_id, "Patient ID"));

        let doctor_id = self.doctor_id.unwrap_or_default();
        errors.check("doctor_id", validate_reference(doctor_id, "Doctor ID"));

        let appointment_date = parse_date(self.appointment_date.as_deref().unwrap_or_default())
            .map_err(|message| errors.add("appointment_date", message))
            .ok();

        let appointment_time = parse_time(self.appointment_time.as_deref().unwrap_or_default())
            .map_err(|message| errors.add("appointment_time", message))
            .ok();

        let status = match non_blank(self.status.as_deref()) {
            Some(raw) => raw
                .parse::<AppointmentStatus>()
                .map_err(|_| errors.add("status", "Status must be valid"))
                .unwrap_or_default(),
            None => AppointmentStatus::default(),
        };

        let notes = non_blank(self.notes.as_deref());
        if let Some(notes) = &notes {
            errors.check("notes", validate_max_len(notes, NOTES_MAX, "Notes"));
        }

        match (appointment_date, appointment_time) {
            (Some(appointment_date), Some(appointment_time)) if errors.is_empty() => {
                Ok(NewAppointment {
                    patient_id,
                    doctor_id,
                    appointment_date,
                    appointment_time,
                    status,
                    notes,
                })
            }
            _ => Err(errors),
        }
    }
}
