use crate::config::AppConfig;
use crate::errors::ServiceError;
use migrations::Migrator;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

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

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns a `ServiceError::DatabaseError` if the connection cannot be established
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    let max_connections = effective_max_connections(&config.url, config.max_connections);
    let min_connections = config.min_connections.min(max_connections);
    if max_connections < config.max_connections {
        warn!(
            requested = config.max_connections,
            max_connections, "SQLite allows a single writer; pool capped"
        );
    }
    debug!(
        max_connections,
        min_connections, "Configuring database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection failed: {}", e);
        ServiceError::db_error(e)
    })?;

    info!(
        backend = ?db_pool.get_database_backend(),
        "Database connection pool established"
    );
    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Runs all pending schema migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = Migrator::up(pool, None).await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => info!("Database migrations completed in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result.map_err(ServiceError::db_error)
}

/// Pings the database, used by the health endpoint
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    pool.ping().await.map_err(ServiceError::db_error)
}

/// Pool size actually used for `url`.
///
/// SQLite serialises writers at the file level. Deferred transactions on
/// separate connections fail with `SQLITE_BUSY` instead of waiting, so
/// SQLite pools are held to one connection and callers queue on acquire.
pub fn effective_max_connections(url: &str, requested: u32) -> u32 {
    if url.starts_with("sqlite:") {
        1
    } else {
        requested.max(1)
    }
}

/// Whether the backend takes `SELECT ... FOR UPDATE` row locks
pub fn supports_row_locks(pool: &impl ConnectionTrait) -> bool {
    !matches!(pool.get_database_backend(), DbBackend::Sqlite)
}

/// Closes the pool on shutdown
pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");
    pool.close().await.map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_sqlite_migrates_and_pings() {
        let pool = establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("connect");

        run_migrations(&pool).await.expect("migrate");
        check_connection(&pool).await.expect("ping");
        assert!(!supports_row_locks(&pool));
        close_pool(pool).await.expect("close");
    }

    #[test]
    fn sqlite_pools_hold_one_connection() {
        assert_eq!(effective_max_connections("sqlite::memory:", 6), 1);
        assert_eq!(effective_max_connections("sqlite:///tmp/a.db?mode=rwc", 10), 1);
        assert_eq!(effective_max_connections("postgres://localhost/atelier", 10), 10);
        assert_eq!(effective_max_connections("postgres://localhost/atelier", 0), 1);
    }

    #[tokio::test]
    async fn wide_sqlite_request_still_connects() {
        let pool = establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 6,
            min_connections: 4,
            ..Default::default()
        })
        .await
        .expect("connect");

        // a single connection keeps one in-memory database across calls
        run_migrations(&pool).await.expect("migrate");
        run_migrations(&pool).await.expect("second run is a no-op");
        close_pool(pool).await.expect("close");
    }

    #[test]
    fn db_config_follows_app_config() {
        let mut cfg = AppConfig::new(
            "postgres://localhost/atelier".into(),
            "x".repeat(64),
            "127.0.0.1".into(),
            8080,
            "development".into(),
        );
        cfg.db_max_connections = 4;
        cfg.db_acquire_timeout_secs = 3;

        let db_cfg = DbConfig::from(&cfg);
        assert_eq!(db_cfg.url, "postgres://localhost/atelier");
        assert_eq!(db_cfg.max_connections, 4);
        assert_eq!(db_cfg.acquire_timeout, Duration::from_secs(3));
    }
}
