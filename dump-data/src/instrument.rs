//! Timing metrics and error logging around repository operations.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use crate::error::DataError;

/// Result of one repository operation, as reported to a [`MetricsSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    NotFound,
    Error,
}

impl Outcome {
    pub fn of<T>(result: &Result<T, DataError>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) if e.is_not_found() => Outcome::NotFound,
            Err(_) => Outcome::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Find,
    FindByWhere,
    FindByMap,
    FindList,
    FindListByWhere,
    FindListByMap,
    FindListByPrimaryKeys,
    Create,
    Save,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::FindByWhere => "find_by_where",
            Operation::FindByMap => "find_by_map",
            Operation::FindList => "find_list",
            Operation::FindListByWhere => "find_list_by_where",
            Operation::FindListByMap => "find_list_by_map",
            Operation::FindListByPrimaryKeys => "find_list_by_primary_keys",
            Operation::Create => "create",
            Operation::Save => "save",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives one observation per repository operation.
///
/// Called on the request path: implementations must not block and must not
/// fail.
pub trait MetricsSink: Send + Sync {
    fn record(&self, entity: &str, operation: Operation, outcome: Outcome, elapsed: Duration);
}

/// Discards every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _: &str, _: Operation, _: Outcome, _: Duration) {}
}

/// Started before an operation, finished with its result.
pub struct Instrument<'a> {
    sink: &'a dyn MetricsSink,
    entity: &'static str,
    operation: Operation,
    start: Instant,
}

impl<'a> Instrument<'a> {
    pub fn start(sink: &'a dyn MetricsSink, entity: &'static str, operation: Operation) -> Self {
        Self {
            sink,
            entity,
            operation,
            start: Instant::now(),
        }
    }

    /// Report the outcome and, for real failures, log the operation input.
    pub fn finish<T, I: Debug + ?Sized>(self, result: &Result<T, DataError>, input: &I) {
        let outcome = Outcome::of(result);
        self.sink
            .record(self.entity, self.operation, outcome, self.start.elapsed());
        if let (Outcome::Error, Err(e)) = (outcome, result) {
            tracing::error!(
                model = self.entity,
                method = self.operation.as_str(),
                expression = ?input,
                error = %e,
                "orm error"
            );
        }
    }
}
