use std::time::Duration;

use dump_core::{ConfigError, ConfigProperties, DumpConfig};
use dump_data::{MetricsSink, Operation, Outcome};
use prometheus::{
    exponential_buckets, histogram_opts, opts, Encoder, HistogramVec, IntCounterVec, Registry,
    TextEncoder,
};

/// Configuration for the repository metrics, read from `metrics.*`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub namespace: Option<String>,
    pub buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            // 1ms to ~8s
            buckets: exponential_buckets(0.001, 2.0, 14)
                .unwrap_or_else(|_| prometheus::DEFAULT_BUCKETS.to_vec()),
        }
    }
}

impl ConfigProperties for MetricsConfig {
    fn prefix() -> &'static str {
        "metrics"
    }

    fn from_config(config: &DumpConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            namespace: config.get_or(&Self::key("namespace"), defaults.namespace),
            buckets: config.get_or(&Self::key("buckets"), defaults.buckets),
        })
    }
}

/// A [`MetricsSink`] recording into its own registry.
pub struct PrometheusMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
}

impl PrometheusMetrics {
    pub fn new(config: &MetricsConfig) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let prefix = config
            .namespace
            .as_ref()
            .map(|s| format!("{s}_"))
            .unwrap_or_default();

        let requests_total = IntCounterVec::new(
            opts!(
                format!("{prefix}orm_requests_total"),
                "Total number of repository operations"
            ),
            &["model", "method", "outcome"],
        )?;

        let request_duration_seconds = HistogramVec::new(
            histogram_opts!(
                format!("{prefix}orm_request_duration_seconds"),
                "Repository operation duration in seconds",
                config.buckets.clone()
            ),
            &["model", "method"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Operations counted so far for `(model, method, outcome)`.
    pub fn count(&self, entity: &str, operation: Operation, outcome: Outcome) -> u64 {
        self.requests_total
            .with_label_values(&[entity, operation.as_str(), outcome.as_str()])
            .get()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record(&self, entity: &str, operation: Operation, outcome: Outcome, elapsed: Duration) {
        self.requests_total
            .with_label_values(&[entity, operation.as_str(), outcome.as_str()])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[entity, operation.as_str()])
            .observe(elapsed.as_secs_f64());
    }
}
