//! Prometheus metrics sink for dump repositories.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dump_prometheus::{MetricsConfig, PrometheusMetrics};
//!
//! let metrics = Arc::new(PrometheusMetrics::new(&config.section::<MetricsConfig>()?)?);
//! let db = Database::connect(&db_config).await?.with_metrics(metrics.clone());
//! // later, from a /metrics handler:
//! let body = metrics.encode()?;
//! ```
//!
//! # Metrics
//!
//! - `orm_requests_total` - Counter with labels: model, method, outcome
//! - `orm_request_duration_seconds` - Histogram with labels: model, method

mod metrics;

pub use metrics::{MetricsConfig, PrometheusMetrics};
