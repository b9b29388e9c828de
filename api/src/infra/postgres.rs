/// PostgreSQL integration
use crate::config::{DbConfig, IntegrationsConfig};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub async fn init_postgres(config: &IntegrationsConfig, db_config: &DbConfig) -> Option<PgPool> {
    if !config.enable_postgres {
        tracing::info!("PostgreSQL integration disabled");
        return None;
    }

    if config.database_url.is_empty() {
        tracing::warn!("PostgreSQL enabled but database_url is empty");
        return None;
    }

    tracing::info!(
        database_url = %config.database_url.split('@').last().unwrap_or("***"),
        max_connections = %config.pg_max_connections,
        connect_timeout_ms = %config.pg_connect_timeout_ms,
        idle_timeout_ms = %config.pg_idle_timeout_ms,
        "Initializing PostgreSQL connection pool"
    );

    let pool = match PgPoolOptions::new()
        .max_connections(config.pg_max_connections)
        .acquire_timeout(Duration::from_millis(config.pg_connect_timeout_ms))
        .idle_timeout(Duration::from_millis(config.pg_idle_timeout_ms))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize PostgreSQL connection pool");
            return None;
        }
    };

    tracing::info!("PostgreSQL connection pool initialized successfully");

    if db_config.run_migrations_on_start {
        if let Err(e) = run_migrations(&pool).await {
            // Tables may already exist; keep serving with what is there
            tracing::error!(error = %e, "Database migrations failed");
        }
    }

    Some(pool)
}

async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations complete");
    Ok(())
}

pub async fn check_postgres_health(pool: &PgPool) -> Result<(), String> {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("PostgreSQL health check failed: {}", e)),
    }
}
