//! Schema management for the hospital tables

use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::{info, warn};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply any pending embedded migrations
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    info!("Database migrations applied");
    Ok(())
}

/// Row counts of the three tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub patients: i64,
    pub doctors: i64,
    pub appointments: i64,
}

pub async fn table_counts(pool: &PgPool) -> DatabaseResult<TableCounts> {
    let (patients, doctors, appointments): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM patients),
            (SELECT COUNT(*) FROM doctors),
            (SELECT COUNT(*) FROM appointments)
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(TableCounts {
        patients,
        doctors,
        appointments,
    })
}

/// Drop every hospital table and the migration history
pub async fn drop_tables(pool: &PgPool) -> DatabaseResult<()> {
    warn!("Dropping hospital tables");
    sqlx::query(
        "DROP TABLE IF EXISTS appointments, doctors, patients, _sqlx_migrations CASCADE",
    )
    .execute(pool)
    .await?;
    info!("Hospital tables dropped");
    Ok(())
}
