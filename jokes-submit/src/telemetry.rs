//! Submission metering and analytics events

use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Receives analytics events produced by the pipeline
pub trait SubmissionTelemetry: Send + Sync {
    /// A requester ran out of identity allocation attempts
    fn rate_limited(&self, fingerprint: &str, context: &Map<String, Value>);

    /// A submission was persisted; `record` is the request context with the
    /// stored artifact under `submission`
    fn submission(&self, fingerprint: &str, record: &Map<String, Value>);
}

/// Process-wide submission counters
#[derive(Debug, Default)]
pub struct SubmissionMeter {
    submissions: AtomicU64,
    rate_limited: AtomicU64,
}

impl SubmissionMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submission(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }

    pub fn rate_limited(&self) -> u64 {
        self.rate_limited.load(Ordering::Relaxed)
    }
}

/// Writes analytics events to the `jokes::analytics` tracing target
#[derive(Debug, Default, Clone)]
pub struct TracingTelemetry;

impl SubmissionTelemetry for TracingTelemetry {
    fn rate_limited(&self, fingerprint: &str, context: &Map<String, Value>) {
        let context = Value::Object(context.clone());
        info!(
            target: "jokes::analytics",
            event = "ratelimited",
            ip = %fingerprint,
            context = %context,
            "Requester rate limited"
        );
    }

    fn submission(&self, fingerprint: &str, record: &Map<String, Value>) {
        let record = Value::Object(record.clone());
        info!(
            target: "jokes::analytics",
            event = "submission",
            ip = %fingerprint,
            record = %record,
            "Submission recorded"
        );
    }
}
