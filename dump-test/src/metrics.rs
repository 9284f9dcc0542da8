use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dump_data::{MetricsSink, Operation, Outcome};

/// One observation received by [`RecordingMetrics`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub entity: String,
    pub operation: Operation,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// Metrics sink that keeps every observation for assertions.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    records: Mutex<Vec<Record>>,
}

impl RecordingMetrics {
    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Record> {
        self.lock().last().cloned()
    }

    pub fn count(&self, operation: Operation, outcome: Outcome) -> usize {
        self.lock()
            .iter()
            .filter(|r| r.operation == operation && r.outcome == outcome)
            .count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Panic unless the last observation matches.
    pub fn assert_last(&self, entity: &str, operation: Operation, outcome: Outcome) {
        let last = self.last().expect("no metrics recorded");
        assert_eq!(
            (last.entity.as_str(), last.operation, last.outcome),
            (entity, operation, outcome),
            "unexpected last metric"
        );
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, entity: &str, operation: Operation, outcome: Outcome, elapsed: Duration) {
        self.lock().push(Record {
            entity: entity.to_string(),
            operation,
            outcome,
            elapsed,
        });
    }
}
