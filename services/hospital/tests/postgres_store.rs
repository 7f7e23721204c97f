//! Integration tests for the PostgreSQL store
//!
//! These tests talk to a live PostgreSQL server and only run when
//! `DATABASE_URL` is set in the environment; otherwise they return early.
//! Each test migrates a fresh `hospital_store_test` schema.

use chrono::{NaiveDate, NaiveTime};
use common::error::DatabaseError;
use hospital::{
    config::ServerConfig,
    database::{run_migrations, table_counts},
    error::HospitalError,
    models::{
        AppointmentPayload, AppointmentStatus, DoctorPayload, DoctorStats, NewAppointment,
        PatientPayload, PatientStats,
    },
    seed::seed,
    state::AppState,
    store::{AppointmentStore, PgStore},
};
use serial_test::serial;
use sqlx::{Executor, PgPool, postgres::PgPoolOptions};
use std::sync::Arc;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const SCHEMA: &str = "hospital_store_test";

fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Recreate the test schema and return a migrated pool scoped to it
async fn fresh_pool(url: &str) -> Result<PgPool, Box<dyn std::error::Error>> {
    let admin = PgPool::connect(url).await?;
    admin
        .execute(format!("DROP SCHEMA IF EXISTS {SCHEMA} CASCADE").as_str())
        .await?;
    admin.execute(format!("CREATE SCHEMA {SCHEMA}").as_str()).await?;
    admin.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute(format!("SET search_path TO {SCHEMA}").as_str())
                    .await?;
                Ok(())
            })
        })
        .connect(url)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

fn state(pool: &PgPool) -> (Arc<PgStore>, AppState) {
    let store = Arc::new(PgStore::new(pool.clone()));
    let state = AppState::from_store(store.clone(), &ServerConfig::default());
    (store, state)
}

fn patient(name: &str, email: &str) -> PatientPayload {
    PatientPayload {
        name: Some(name.to_string()),
        age: Some(42),
        phone: None,
        email: Some(email.to_string()),
        address: None,
    }
}

fn doctor(name: &str, email: &str) -> DoctorPayload {
    DoctorPayload {
        name: Some(name.to_string()),
        specialization: Some("Cardiology".to_string()),
        phone: None,
        email: Some(email.to_string()),
    }
}

fn booking(patient: i64, doctor: i64, date: &str, time: &str, status: &str) -> AppointmentPayload {
    AppointmentPayload {
        patient_id: Some(patient),
        doctor_id: Some(doctor),
        appointment_date: Some(date.to_string()),
        appointment_time: Some(time.to_string()),
        status: Some(status.to_string()),
        notes: None,
    }
}

#[tokio::test]
#[serial]
async fn cancel_then_rebook_against_postgres() -> TestResult {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let pool = fresh_pool(&url).await?;
    let (_, state) = state(&pool);

    let p = state.patients.create(&patient("Jane Doe", "jane@example.com")).await?;
    let d = state.doctors.create(&doctor("Meredith Grey", "grey@example.com")).await?;
    let request = booking(p.id, d.id, "2030-01-15", "09:00", "Scheduled");

    let first = state.appointments.create(&request).await?;
    assert_eq!(first.doctor_name, "Meredith Grey");
    assert_eq!(
        first.appointment.appointment_time,
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    );

    assert!(matches!(
        state.appointments.create(&request).await,
        Err(HospitalError::SchedulingConflict)
    ));

    let cancel = booking(p.id, d.id, "2030-01-15", "09:00", "Cancelled");
    state.appointments.update(first.appointment.id, &cancel).await?;

    let rebooked = state.appointments.create(&request).await?;
    assert_ne!(rebooked.appointment.id, first.appointment.id);
    assert_eq!(table_counts(&pool).await?.appointments, 2);

    pool.close().await;
    Ok(())
}

#[tokio::test]
#[serial]
async fn active_slot_index_rejects_a_raw_double_booking() -> TestResult {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let pool = fresh_pool(&url).await?;
    let (store, state) = state(&pool);

    let p = state.patients.create(&patient("Jane Doe", "jane@example.com")).await?;
    let d = state.doctors.create(&doctor("Meredith Grey", "grey@example.com")).await?;
    let appointment = NewAppointment {
        patient_id: p.id,
        doctor_id: d.id,
        appointment_date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        status: AppointmentStatus::Scheduled,
        notes: None,
    };

    store.insert_appointment(&appointment).await?;
    match store.insert_appointment(&appointment).await {
        Err(DatabaseError::UniqueViolation { constraint }) => {
            assert_eq!(constraint, "appointments_active_slot_idx");
        }
        other => panic!("expected a unique violation, got {other:?}"),
    }

    // A cancelled row does not hold the slot
    let cancelled = NewAppointment {
        status: AppointmentStatus::Cancelled,
        ..appointment
    };
    store.insert_appointment(&cancelled).await?;

    pool.close().await;
    Ok(())
}

#[tokio::test]
#[serial]
async fn search_treats_wildcards_literally() -> TestResult {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let pool = fresh_pool(&url).await?;
    let (_, state) = state(&pool);

    state.patients.create(&patient("Ann Fifty%", "ann@example.com")).await?;
    state.patients.create(&patient("Bob Smith", "bob@example.com")).await?;

    let percent = state.patients.search("%", None).await?;
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].name, "Ann Fifty%");

    assert!(state.patients.search("_", None).await?.is_empty());
    assert_eq!(state.patients.search("SMITH", None).await?.len(), 1);

    pool.close().await;
    Ok(())
}

#[tokio::test]
#[serial]
async fn stats_over_empty_tables_are_zero() -> TestResult {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let pool = fresh_pool(&url).await?;
    let (_, state) = state(&pool);

    assert_eq!(state.stats.patient_stats().await, PatientStats::default());
    assert_eq!(state.stats.doctor_stats().await, DoctorStats::default());
    let appointments = state.stats.appointment_stats().await;
    assert_eq!(appointments.total, 0);
    assert!(appointments.status_distribution.is_empty());

    pool.close().await;
    Ok(())
}

#[tokio::test]
#[serial]
async fn appointment_stats_count_today_and_statuses() -> TestResult {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let pool = fresh_pool(&url).await?;
    let (_, state) = state(&pool);

    let p = state.patients.create(&patient("Jane Doe", "jane@example.com")).await?;
    let d = state.doctors.create(&doctor("Meredith Grey", "grey@example.com")).await?;
    for (date, time, status) in [
        ("2030-01-15", "09:00", "Completed"),
        ("2030-01-15", "10:00", "Scheduled"),
        ("2030-01-16", "09:00", "Cancelled"),
    ] {
        state
            .appointments
            .create(&booking(p.id, d.id, date, time, status))
            .await?;
    }

    let today = NaiveDate::from_ymd_opt(2030, 1, 15).unwrap();
    let stats = state.stats.appointment_stats_on(today).await;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.today, 2);
    assert_eq!(stats.completed_today, 1);
    assert_eq!(stats.status_distribution.len(), 3);
    assert_eq!(stats.status_distribution[&AppointmentStatus::Cancelled], 1);

    let patients = state.stats.patient_stats().await;
    assert_eq!(patients.total, 1);
    assert_eq!(patients.average_age, 42);
    assert_eq!(patients.new_this_week, 1);

    pool.close().await;
    Ok(())
}

#[tokio::test]
#[serial]
async fn deleting_a_doctor_cascades_to_appointments() -> TestResult {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let pool = fresh_pool(&url).await?;
    let (_, state) = state(&pool);

    let p = state.patients.create(&patient("Jane Doe", "jane@example.com")).await?;
    let grey = state.doctors.create(&doctor("Meredith Grey", "grey@example.com")).await?;
    let house = state.doctors.create(&doctor("Gregory House", "house@example.com")).await?;
    state
        .appointments
        .create(&booking(p.id, grey.id, "2030-01-15", "09:00", "Scheduled"))
        .await?;
    state
        .appointments
        .create(&booking(p.id, house.id, "2030-01-15", "09:00", "Scheduled"))
        .await?;

    state.doctors.delete(grey.id).await?;

    let remaining = state.patients.appointments(p.id).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].doctor_name, "Gregory House");
    assert!(matches!(
        state.doctors.delete(grey.id).await,
        Err(HospitalError::NotFound { .. })
    ));

    pool.close().await;
    Ok(())
}

#[tokio::test]
#[serial]
async fn seeding_runs_once() -> TestResult {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let pool = fresh_pool(&url).await?;

    let report = seed(&pool).await?;
    assert_eq!((report.doctors, report.patients, report.appointments), (4, 4, 5));

    assert!(seed(&pool).await?.is_empty());
    let counts = table_counts(&pool).await?;
    assert_eq!((counts.doctors, counts.patients, counts.appointments), (4, 4, 5));

    pool.close().await;
    Ok(())
}

#[tokio::test]
#[serial]
async fn failed_seed_leaves_no_partial_rows() -> TestResult {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let pool = fresh_pool(&url).await?;
    let (_, state) = state(&pool);

    state
        .doctors
        .create(&doctor("Sarah Johnson", "sarah.johnson@hospital.com"))
        .await?;

    let err = seed(&pool).await.unwrap_err();
    assert_eq!(err.constraint(), Some("doctors_email_key"));

    let counts = table_counts(&pool).await?;
    assert_eq!((counts.doctors, counts.patients, counts.appointments), (1, 0, 0));

    pool.close().await;
    Ok(())
}
