use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use sea_orm_migration::MigratorTrait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Characters of the connection URL kept when it is logged.
const REDACTED_URL_PREFIX: usize = 30;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl DbConfig {
    /// Pool tuning from the loaded configuration, pointed at `url`.
    pub fn from_app_config(cfg: &AppConfig, url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }

    /// Single-connection pool, required for `sqlite::memory:` where every
    /// connection would otherwise see its own empty database.
    pub fn single_connection(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        }
    }
}

/// Shortens a connection URL so credentials further along are not logged.
pub fn redact_url(url: &str) -> String {
    if url.chars().count() <= REDACTED_URL_PREFIX {
        return url.to_string();
    }
    let prefix: String = url.chars().take(REDACTED_URL_PREFIX).collect();
    format!("{}...", prefix)
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns a `ServiceError` if the connection cannot be established
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(
        url = %redact_url(&config.url),
        max_connections = config.max_connections,
        "configuring database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("ayak_db.max_connections", config.max_connections as f64);

    let pool = Database::connect(opt).await.map_err(|e| {
        error!(error = %e, "database connection failed");
        counter!("ayak_db.connection_failures", 1);
        ServiceError::DatabaseError(e)
    })?;

    info!("database connection pool established");
    Ok(pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(
    cfg: &AppConfig,
    url: &str,
) -> Result<DbPool, ServiceError> {
    establish_connection_with_config(&DbConfig::from_app_config(cfg, url)).await
}

/// Runs the embedded migrations. Safe to repeat; applied steps are skipped.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("running database migrations");
    let start = Instant::now();

    let result = crate::migrator::Migrator::up(pool, None).await;

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!(?elapsed, "database migrations completed"),
        Err(e) => error!(?elapsed, error = %e, "database migrations failed"),
    }

    result.map_err(ServiceError::DatabaseError)
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let start = Instant::now();
    let result = pool.ping().await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => gauge!("ayak_db.connection_latency", elapsed.as_millis() as f64),
        Err(e) => {
            error!(?elapsed, error = %e, "database connection check failed");
            counter!("ayak_db.connection_failures", 1);
        }
    }

    result.map_err(ServiceError::DatabaseError)
}

/// Database access wrapper with built-in metrics and error handling
#[derive(Debug, Clone)]
pub struct DatabaseAccess {
    pool: Arc<DbPool>,
}

impl DatabaseAccess {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Runs `f` against the pool, timing it and counting failures per
    /// operation name.
    pub async fn execute<'a, F, Fut, T>(&'a self, operation: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&'a DbPool) -> Fut + Send,
        Fut: Future<Output = Result<T, DbErr>> + Send + 'a,
        T: Send,
    {
        let start = Instant::now();
        let result = f(&self.pool).await;
        let elapsed = start.elapsed();
        histogram!("ayak_db.operation.duration", elapsed, "operation" => operation.to_string());

        result.map_err(|e| db_error(operation, e))
    }
}

/// Maps a driver error to the service error taxonomy, logging and counting it.
/// Unique-key violations become `Conflict`, dangling references a 400.
pub fn db_error(operation: &str, err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            debug!(operation, detail = %detail, "unique constraint violated");
            return ServiceError::Conflict(format!(
                "{} conflicts with an existing record",
                operation
            ));
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            debug!(operation, detail = %detail, "foreign key constraint violated");
            return ServiceError::ValidationError(
                "referenced record does not exist".to_string(),
            );
        }
        _ => {}
    }
    error!(operation, error = %err, "database operation failed");
    counter!("ayak_db.operation.error", 1, "operation" => operation.to_string());
    ServiceError::DatabaseError(err)
}
