//! Dashboard rollups and the raw counts they are computed from

use serde::Serialize;
use std::collections::BTreeMap;

use super::AppointmentStatus;

/// Raw patient counts as returned by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientCounts {
    pub total: i64,
    /// `None` when there are no patients
    pub average_age: Option<f64>,
    pub created_since: i64,
}

/// Raw doctor counts as returned by the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorCounts {
    pub total: i64,
    pub specializations: i64,
}

/// Raw appointment counts as returned by the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentCounts {
    pub total: i64,
    pub today: i64,
    pub completed_today: i64,
    /// One entry per status that has at least one appointment
    pub by_status: Vec<(AppointmentStatus, i64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total: i64,
    pub average_age: i64,
    pub new_this_week: i64,
}

impl From<PatientCounts> for PatientStats {
    fn from(counts: PatientCounts) -> Self {
        let average_age = counts
            .average_age
            .filter(|average| average.is_finite())
            .map(|average| average.round() as i64)
            .unwrap_or(0);

        Self {
            total: counts.total,
            average_age,
            new_this_week: counts.created_since,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoctorStats {
    pub total: i64,
    pub specializations: i64,
}

impl From<DoctorCounts> for DoctorStats {
    fn from(counts: DoctorCounts) -> Self {
        Self {
            total: counts.total,
            specializations: counts.specializations,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total: i64,
    pub today: i64,
    pub completed_today: i64,
    pub status_distribution: BTreeMap<AppointmentStatus, i64>,
}

impl From<AppointmentCounts> for AppointmentStats {
    fn from(counts: AppointmentCounts) -> Self {
        let status_distribution = counts
            .by_status
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .collect();

        Self {
            total: counts.total,
            today: counts.today,
            completed_today: counts.completed_today,
            status_distribution,
        }
    }
}
