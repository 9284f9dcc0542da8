use std::sync::Arc;
use std::time::Duration;

use dump_core::{ConfigError, ConfigProperties, DumpConfig};
use dump_data::{DataError, Dialect, Entity, MetricsSink, NoopMetrics};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, FromRow};

use crate::error::SqlxErrorExt;
use crate::repository::SqlxRepository;

/// Pool settings, read from the `database.*` section.
///
/// ```yaml
/// database:
///   url: "postgres://localhost/shop"
///   max_connections: 20
///   acquire_timeout: 5
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl ConfigProperties for DatabaseConfig {
    fn prefix() -> &'static str {
        "database"
    }

    fn from_config(config: &DumpConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let idle_timeout = match config.get::<Duration>(&Self::key("idle_timeout")) {
            Ok(timeout) => Some(timeout),
            Err(ConfigError::NotFound(_)) => defaults.idle_timeout,
            Err(e) => return Err(e),
        };
        Ok(Self {
            url: config.get(&Self::key("url"))?,
            max_connections: config.get_or(&Self::key("max_connections"), defaults.max_connections),
            min_connections: config.get_or(&Self::key("min_connections"), defaults.min_connections),
            acquire_timeout: config.get_or(&Self::key("acquire_timeout"), defaults.acquire_timeout),
            idle_timeout,
        })
    }
}

/// Shared database handle: the pool, its SQL dialect and the metrics sink
/// every repository reports to. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
    metrics: Arc<dyn MetricsSink>,
}

impl Database {
    /// Open a pool for `config.url`. The dialect follows the URL scheme.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataError> {
        sqlx::any::install_default_drivers();
        let dialect = Dialect::from_url(&config.url).unwrap_or_default();
        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect(&config.url)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        tracing::info!(
            dialect = ?dialect,
            max_connections = config.max_connections,
            "database pool ready"
        );
        Ok(Self::new(pool, dialect))
    }

    /// Wrap an existing pool. Metrics are discarded until
    /// [`with_metrics`](Self::with_metrics) is called.
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self {
            pool,
            dialect,
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn metrics(&self) -> &dyn MetricsSink {
        self.metrics.as_ref()
    }

    pub fn repository<T>(&self) -> SqlxRepository<T>
    where
        T: Entity + for<'r> FromRow<'r, AnyRow>,
    {
        SqlxRepository::new(self.clone())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect)
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}
