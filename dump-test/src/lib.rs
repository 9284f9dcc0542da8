mod db;
mod logs;
mod metrics;

pub use db::TestDb;
pub use logs::LogCapture;
pub use metrics::{Record, RecordingMetrics};
