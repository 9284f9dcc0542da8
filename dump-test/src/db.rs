use std::sync::Arc;

use dump_data::{Dialect, Entity};
use dump_data_sqlx::{Database, SqlxRepository};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::FromRow;

use crate::metrics::RecordingMetrics;

/// A private in-memory SQLite database with a recording metrics sink.
///
/// The pool holds a single connection that is never recycled, so the
/// database lives as long as the `TestDb`.
pub struct TestDb {
    db: Database,
    metrics: Arc<RecordingMetrics>,
}

impl TestDb {
    pub async fn new() -> Self {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite pool");
        let metrics = Arc::new(RecordingMetrics::default());
        let db = Database::new(pool, Dialect::Sqlite).with_metrics(metrics.clone());
        Self { db, metrics }
    }

    /// Run `;`-separated statements, panicking on the first failure.
    pub async fn execute(&self, script: &str) {
        for statement in script.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(self.db.pool())
                .await
                .unwrap_or_else(|e| panic!("statement failed: {statement}: {e}"));
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn metrics(&self) -> &RecordingMetrics {
        &self.metrics
    }

    pub fn repository<T>(&self) -> SqlxRepository<T>
    where
        T: Entity + for<'r> FromRow<'r, AnyRow>,
    {
        self.db.repository()
    }
}
