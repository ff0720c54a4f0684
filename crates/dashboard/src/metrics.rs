//! Persistence API request metrics.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record the duration and outcome of a persistence API request.
pub fn record_request(operation: &str, outcome: &str, duration_secs: f64) {
    histogram!(
        "persistence_api_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration_secs);

    counter!(
        "persistence_api_requests_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Times a single persistence API request.
///
/// Usage:
/// ```ignore
/// let timer = RequestTimer::new("create_geofence");
/// let result = client.post(url).send().await;
/// timer.finish(result.is_ok());
/// ```
pub struct RequestTimer {
    operation: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Record the elapsed duration and outcome.
    pub fn finish(self, success: bool) {
        let outcome = if success { "success" } else { "error" };
        record_request(self.operation, outcome, self.start.elapsed().as_secs_f64());
    }
}
