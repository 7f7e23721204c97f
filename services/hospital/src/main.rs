use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, close_pool, health_check, init_pool};
use hospital::{
    cli::{Cli, Command},
    config::ServerConfig,
    database::{drop_tables, run_migrations, table_counts},
    routes,
    seed::seed,
    state::AppState,
    store::PgStore,
};
use sqlx::PgPool;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.selected();

    if command == (Command::Drop { confirm: false }) {
        warn!("Refusing to drop tables without --confirm");
        anyhow::bail!("use `hospital drop --confirm` to drop every hospital table");
    }

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    let outcome = run(command, &pool).await;
    close_pool(&pool).await;
    outcome
}

async fn run(command: Command, pool: &PgPool) -> Result<()> {
    match command {
        Command::Serve => serve(pool.clone()).await,
        Command::Migrate => {
            run_migrations(pool).await?;
            Ok(())
        }
        Command::Seed => {
            run_migrations(pool).await?;
            let report = seed(pool).await?;
            if report.is_empty() {
                info!("Database already contains data, nothing seeded");
            } else {
                info!(
                    doctors = report.doctors,
                    patients = report.patients,
                    appointments = report.appointments,
                    "Seeded sample data"
                );
            }
            Ok(())
        }
        Command::CheckDb => {
            if !health_check(pool).await? {
                anyhow::bail!("Failed to connect to database");
            }
            info!("Database connection successful");
            match table_counts(pool).await {
                Ok(counts) => info!(
                    patients = counts.patients,
                    doctors = counts.doctors,
                    appointments = counts.appointments,
                    "Table sizes"
                ),
                Err(e) => warn!("Tables not readable, run `hospital migrate`: {}", e),
            }
            Ok(())
        }
        Command::Drop { .. } => {
            drop_tables(pool).await?;
            Ok(())
        }
    }
}

async fn serve(pool: PgPool) -> Result<()> {
    let server_config = ServerConfig::load().context("invalid server configuration")?;
    info!(environment = %server_config.environment, "Starting hospital service");

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let app = routes::create_router(AppState::from_store(store, &server_config));

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Hospital service listening on {}", address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Hospital service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
