//! Booking consistency: a doctor may hold at most one live appointment per
//! slot.
//!
//! The check and the write that follows it are separate round trips, so two
//! concurrent bookings can both pass the check. The PostgreSQL schema closes
//! that window with a partial unique index on live slots; the store reports a
//! violation of it as a unique-constraint error, which the appointment
//! repository translates into the same [`HospitalError::SchedulingConflict`].

use chrono::{NaiveDate, NaiveTime};
use std::{fmt, sync::Arc};
use tracing::{info, warn};

use crate::{
    error::{HospitalError, HospitalResult},
    store::AppointmentStore,
};
use common::error::DatabaseResult;

/// The (doctor, date, time) tuple a booking occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Slot {
    pub fn new(doctor_id: i64, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            doctor_id,
            date,
            time,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "doctor {} on {} at {}",
            self.doctor_id,
            self.date,
            self.time.format("%H:%M")
        )
    }
}

/// Decides whether a slot is free for a doctor
#[derive(Clone)]
pub struct BookingChecker {
    store: Arc<dyn AppointmentStore>,
}

impl BookingChecker {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// True when a non-cancelled appointment other than `exclude` already
    /// holds `slot`
    pub async fn check_conflict(&self, slot: &Slot, exclude: Option<i64>) -> DatabaseResult<bool> {
        let count = self.store.count_active_in_slot(slot, exclude).await?;
        Ok(count > 0)
    }

    /// Fail with [`HospitalError::SchedulingConflict`] if `slot` is taken
    pub async fn ensure_available(&self, slot: &Slot, exclude: Option<i64>) -> HospitalResult<()> {
        let conflict = self.check_conflict(slot, exclude).await.map_err(|e| {
            tracing::error!(%slot, ?exclude, "Failed to check slot availability: {}", e);
            HospitalError::Store(e)
        })?;

        if conflict {
            warn!(%slot, ?exclude, "Rejected double booking");
            return Err(HospitalError::SchedulingConflict);
        }

        info!(%slot, "Slot is available");
        Ok(())
    }
}
