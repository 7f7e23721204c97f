//! Sample data for development databases

use chrono::{Duration, Local, NaiveTime};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info};

use crate::models::AppointmentStatus;

const DOCTORS: [(&str, &str, &str, &str); 4] = [
    ("Dr. Sarah Johnson", "Cardiology", "+1-555-0101", "sarah.johnson@hospital.com"),
    ("Dr. Michael Chen", "Neurology", "+1-555-0102", "michael.chen@hospital.com"),
    ("Dr. Emily Rodriguez", "Pediatrics", "+1-555-0103", "emily.rodriguez@hospital.com"),
    ("Dr. James Wilson", "Orthopedics", "+1-555-0104", "james.wilson@hospital.com"),
];

const PATIENTS: [(&str, i32, &str, &str, &str); 4] = [
    ("John Smith", 45, "+1-555-1001", "john.smith@email.com", "123 Main St, Springfield"),
    ("Maria Garcia", 32, "+1-555-1002", "maria.garcia@email.com", "456 Oak Ave, Springfield"),
    ("Robert Brown", 67, "+1-555-1003", "robert.brown@email.com", "789 Pine Rd, Springfield"),
    ("Linda Davis", 28, "+1-555-1004", "linda.davis@email.com", "321 Elm St, Springfield"),
];

/// (patient index, doctor index, day offset from today, hour, status, notes)
const APPOINTMENTS: [(usize, usize, i64, u32, AppointmentStatus, &str); 5] = [
    (0, 0, 0, 9, AppointmentStatus::Scheduled, "Routine cardiac checkup"),
    (1, 2, 0, 10, AppointmentStatus::Completed, "Child vaccination follow-up"),
    (2, 3, 1, 14, AppointmentStatus::Scheduled, "Knee pain assessment"),
    (3, 1, 2, 11, AppointmentStatus::Scheduled, "Migraine consultation"),
    (0, 0, -7, 15, AppointmentStatus::Cancelled, "Rescheduled by patient"),
];

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub doctors: usize,
    pub patients: usize,
    pub appointments: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.doctors == 0 && self.patients == 0 && self.appointments == 0
    }
}

/// Insert the sample data set in a single transaction
///
/// Does nothing when patients already exist. Any failure rolls the whole
/// batch back.
pub async fn seed(pool: &PgPool) -> DatabaseResult<SeedReport> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        info!(existing, "Patients already present, skipping seed");
        return Ok(SeedReport::default());
    }

    let mut tx = pool.begin().await?;
    match insert_sample_data(&mut tx).await {
        Ok(report) => {
            tx.commit().await?;
            info!(?report, "Sample data inserted");
            Ok(report)
        }
        Err(e) => {
            error!("Seeding failed, rolling back: {}", e);
            Err(after_rollback(e, tx.rollback().await))
        }
    }
}

/// Keep the insert error; a rollback failure is only logged
fn after_rollback(
    original: DatabaseError,
    rollback: Result<(), sqlx::Error>,
) -> DatabaseError {
    if let Err(e) = rollback {
        error!("Rollback after failed seed also failed: {}", e);
    }
    original
}

async fn insert_sample_data(tx: &mut Transaction<'_, Postgres>) -> DatabaseResult<SeedReport> {
    let mut doctor_ids = Vec::with_capacity(DOCTORS.len());
    for (name, specialization, phone, email) in DOCTORS {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO doctors (name, specialization, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(specialization)
        .bind(phone)
        .bind(email)
        .fetch_one(&mut **tx)
        .await?;
        doctor_ids.push(id);
    }

    let mut patient_ids = Vec::with_capacity(PATIENTS.len());
    for (name, age, phone, email, address) in PATIENTS {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO patients (name, age, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(age)
        .bind(phone)
        .bind(email)
        .bind(address)
        .fetch_one(&mut **tx)
        .await?;
        patient_ids.push(id);
    }

    let today = Local::now().date_naive();
    for (patient, doctor, day_offset, hour, status, notes) in APPOINTMENTS {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default();
        sqlx::query(
            r#"
            INSERT INTO appointments
                (patient_id, doctor_id, appointment_date, appointment_time, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(patient_ids[patient])
        .bind(doctor_ids[doctor])
        .bind(today + Duration::days(day_offset))
        .bind(time)
        .bind(status.as_str())
        .bind(notes)
        .execute(&mut **tx)
        .await?;
    }

    Ok(SeedReport {
        doctors: doctor_ids.len(),
        patients: patient_ids.len(),
        appointments: APPOINTMENTS.len(),
    })
}
