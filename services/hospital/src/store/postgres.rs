//! PostgreSQL adapter for the datastore ports

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    database::health_check,
    error::{DatabaseError, DatabaseResult},
};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{AppointmentStore, DoctorStore, HealthProbe, PatientStore, contains_pattern};
use crate::{
    booking::Slot,
    models::{
        Appointment, AppointmentCounts, AppointmentStatus, AppointmentView, Doctor, DoctorCounts,
        NewAppointment, NewDoctor, NewPatient, Page, Patient, PatientCounts,
    },
};

/// Datastore backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn patient_from_row(row: &PgRow) -> Result<Patient, sqlx::Error> {
    Ok(Patient {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        age: row.try_get("age")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn doctor_from_row(row: &PgRow) -> Result<Doctor, sqlx::Error> {
    Ok(Doctor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        specialization: row.try_get("specialization")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn status_from_row(row: &PgRow) -> Result<AppointmentStatus, sqlx::Error> {
    let raw: String = row.try_get("status")?;
    raw.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn appointment_view_from_row(row: &PgRow) -> Result<AppointmentView, sqlx::Error> {
    Ok(AppointmentView {
        appointment: Appointment {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            doctor_id: row.try_get("doctor_id")?,
            appointment_date: row.try_get("appointment_date")?,
            appointment_time: row.try_get("appointment_time")?,
            status: status_from_row(row)?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        },
        patient_name: row.try_get("patient_name")?,
        doctor_name: row.try_get("doctor_name")?,
        doctor_specialization: row.try_get("doctor_specialization")?,
    })
}

fn collect<T>(
    rows: Vec<PgRow>,
    map: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> DatabaseResult<Vec<T>> {
    rows.iter()
        .map(|row| map(row).map_err(DatabaseError::Query))
        .collect()
}

fn optional<T>(
    row: Option<PgRow>,
    map: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> DatabaseResult<Option<T>> {
    row.as_ref()
        .map(map)
        .transpose()
        .map_err(DatabaseError::Query)
}

#[async_trait]
impl PatientStore for PgStore {
    async fn list_patients(&self, page: Page) -> DatabaseResult<Vec<Patient>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, age, phone, email, address, created_at, updated_at
            FROM patients
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, patient_from_row)
    }

    async fn find_patient(&self, id: i64) -> DatabaseResult<Option<Patient>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, age, phone, email, address, created_at, updated_at
            FROM patients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        optional(row, patient_from_row)
    }

    async fn find_patient_by_email(&self, email: &str) -> DatabaseResult<Option<Patient>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, age, phone, email, address, created_at, updated_at
            FROM patients
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        optional(row, patient_from_row)
    }

    async fn search_patients(&self, term: &str, limit: i64) -> DatabaseResult<Vec<Patient>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, age, phone, email, address, created_at, updated_at
            FROM patients
            WHERE name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1
            ORDER BY name, id
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, patient_from_row)
    }

    async fn insert_patient(&self, patient: &NewPatient) -> DatabaseResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO patients (name, age, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&patient.name)
        .bind(patient.age)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(&patient.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_patient(&self, id: i64, patient: &NewPatient) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE patients
            SET name = $1, age = $2, phone = $3, email = $4, address = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&patient.name)
        .bind(patient.age)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(&patient.address)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_patient(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn patient_counts(&self, created_since: DateTime<Utc>) -> DatabaseResult<PatientCounts> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   AVG(age)::FLOAT8 AS average_age,
                   COUNT(*) FILTER (WHERE created_at >= $1) AS created_since
            FROM patients
            "#,
        )
        .bind(created_since)
        .fetch_one(&self.pool)
        .await?;

        Ok(PatientCounts {
            total: row.try_get("total")?,
            average_age: row.try_get("average_age")?,
            created_since: row.try_get("created_since")?,
        })
    }
}

#[async_trait]
impl DoctorStore for PgStore {
    async fn list_doctors(&self, page: Page) -> DatabaseResult<Vec<Doctor>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, specialization, phone, email, created_at, updated_at
            FROM doctors
            ORDER BY name, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, doctor_from_row)
    }

    async fn find_doctor(&self, id: i64) -> DatabaseResult<Option<Doctor>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, specialization, phone, email, created_at, updated_at
            FROM doctors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        optional(row, doctor_from_row)
    }

    async fn find_doctor_by_email(&self, email: &str) -> DatabaseResult<Option<Doctor>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, specialization, phone, email, created_at, updated_at
            FROM doctors
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        optional(row, doctor_from_row)
    }

    async fn search_doctors(&self, term: &str, limit: i64) -> DatabaseResult<Vec<Doctor>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, specialization, phone, email, created_at, updated_at
            FROM doctors
            WHERE name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1
            ORDER BY name, id
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, doctor_from_row)
    }

    async fn insert_doctor(&self, doctor: &NewDoctor) -> DatabaseResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO doctors (name, specialization, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&doctor.name)
        .bind(&doctor.specialization)
        .bind(&doctor.phone)
        .bind(&doctor.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_doctor(&self, id: i64, doctor: &NewDoctor) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE doctors
            SET name = $1, specialization = $2, phone = $3, email = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&doctor.name)
        .bind(&doctor.specialization)
        .bind(&doctor.phone)
        .bind(&doctor.email)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_doctor(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn doctor_counts(&self) -> DatabaseResult<DoctorCounts> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total, COUNT(DISTINCT specialization) AS specializations
            FROM doctors
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DoctorCounts {
            total: row.try_get("total")?,
            specializations: row.try_get("specializations")?,
        })
    }
}

#[async_trait]
impl AppointmentStore for PgStore {
    async fn list_appointments(&self, page: Page) -> DatabaseResult<Vec<AppointmentView>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.patient_id, a.doctor_id, a.appointment_date, a.appointment_time,
                   a.status, a.notes, a.created_at, a.updated_at,
                   p.name AS patient_name, d.name AS doctor_name,
                   d.specialization AS doctor_specialization
            FROM appointments a
            JOIN patients p ON a.patient_id = p.id
            JOIN doctors d ON a.doctor_id = d.id
            ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, appointment_view_from_row)
    }

    async fn find_appointment(&self, id: i64) -> DatabaseResult<Option<AppointmentView>> {
        let row = sqlx::query(
            r#"
            SELECT a.id, a.patient_id, a.doctor_id, a.appointment_date, a.appointment_time,
                   a.status, a.notes, a.created_at, a.updated_at,
                   p.name AS patient_name, d.name AS doctor_name,
                   d.specialization AS doctor_specialization
            FROM appointments a
            JOIN patients p ON a.patient_id = p.id
            JOIN doctors d ON a.doctor_id = d.id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        optional(row, appointment_view_from_row)
    }

    async fn search_appointments(
        &self,
        term: &str,
        limit: i64,
    ) -> DatabaseResult<Vec<AppointmentView>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.patient_id, a.doctor_id, a.appointment_date, a.appointment_time,
                   a.status, a.notes, a.created_at, a.updated_at,
                   p.name AS patient_name, d.name AS doctor_name,
                   d.specialization AS doctor_specialization
            FROM appointments a
            JOIN patients p ON a.patient_id = p.id
            JOIN doctors d ON a.doctor_id = d.id
            WHERE p.name ILIKE $1 OR d.name ILIKE $1
            ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.id DESC
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, appointment_view_from_row)
    }

    async fn appointments_for_patient(
        &self,
        patient_id: i64,
    ) -> DatabaseResult<Vec<AppointmentView>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.patient_id, a.doctor_id, a.appointment_date, a.appointment_time,
                   a.status, a.notes, a.created_at, a.updated_at,
                   p.name AS patient_name, d.name AS doctor_name,
                   d.specialization AS doctor_specialization
            FROM appointments a
            JOIN patients p ON a.patient_id = p.id
            JOIN doctors d ON a.doctor_id = d.id
            WHERE a.patient_id = $1
            ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.id DESC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, appointment_view_from_row)
    }

    async fn appointments_on(&self, date: NaiveDate) -> DatabaseResult<Vec<AppointmentView>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.patient_id, a.doctor_id, a.appointment_date, a.appointment_time,
                   a.status, a.notes, a.created_at, a.updated_at,
                   p.name AS patient_name, d.name AS doctor_name,
                   d.specialization AS doctor_specialization
            FROM appointments a
            JOIN patients p ON a.patient_id = p.id
            JOIN doctors d ON a.doctor_id = d.id
            WHERE a.appointment_date = $1
            ORDER BY a.appointment_time, a.id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, appointment_view_from_row)
    }

    async fn count_active_in_slot(
        &self,
        slot: &Slot,
        exclude: Option<i64>,
    ) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM appointments
            WHERE doctor_id = $1
              AND appointment_date = $2
              AND appointment_time = $3
              AND status <> 'Cancelled'
              AND ($4::BIGINT IS NULL OR id <> $4)
            "#,
        )
        .bind(slot.doctor_id)
        .bind(slot.date)
        .bind(slot.time)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert_appointment(&self, appointment: &NewAppointment) -> DatabaseResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO appointments
                (patient_id, doctor_id, appointment_date, appointment_time, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(appointment.patient_id)
        .bind(appointment.doctor_id)
        .bind(appointment.appointment_date)
        .bind(appointment.appointment_time)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_appointment(
        &self,
        id: i64,
        appointment: &NewAppointment,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET patient_id = $1, doctor_id = $2, appointment_date = $3, appointment_time = $4,
                status = $5, notes = $6, updated_at = NOW()
            WHERE id = $7
            "#,
        )
        .bind(appointment.patient_id)
        .bind(appointment.doctor_id)
        .bind(appointment.appointment_date)
        .bind(appointment.appointment_time)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_appointment(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn appointment_counts(&self, today: NaiveDate) -> DatabaseResult<AppointmentCounts> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE appointment_date = $1) AS today,
                   COUNT(*) FILTER (WHERE appointment_date = $1 AND status = 'Completed')
                       AS completed_today
            FROM appointments
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let status_rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM appointments
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let by_status = status_rows
            .iter()
            .map(|row| -> Result<(AppointmentStatus, i64), sqlx::Error> {
                Ok((status_from_row(row)?, row.try_get("count")?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AppointmentCounts {
            total: row.try_get("total")?,
            today: row.try_get("today")?,
            completed_today: row.try_get("completed_today")?,
            by_status,
        })
    }
}

#[async_trait]
impl HealthProbe for PgStore {
    async fn ping(&self) -> DatabaseResult<bool> {
        health_check(&self.pool).await
    }
}
