// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Course command throughput, latency and rejections
// - Optimistic-concurrency retries
// - Enrollment records created and removed
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Command Metrics
    pub commands_total: IntCounterVec,
    pub commands_rejected: IntCounterVec,
    pub command_duration: HistogramVec,
    pub concurrency_retries: IntCounterVec,

    // Enrollment Metrics
    pub enrollments_created: IntCounter,
    pub enrollments_removed: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let commands_total = IntCounterVec::new(
            Opts::new("course_commands_total", "Total course commands handled"),
            &["command"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let commands_rejected = IntCounterVec::new(
            Opts::new("course_commands_rejected_total", "Course commands rejected"),
            &["command", "reason"],
        )?;
        registry.register(Box::new(commands_rejected.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("course_command_duration_seconds", "Course command handling duration")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["command"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        let concurrency_retries = IntCounterVec::new(
            Opts::new("course_concurrency_retries_total", "Commands re-run after a version conflict"),
            &["command"],
        )?;
        registry.register(Box::new(concurrency_retries.clone()))?;

        let enrollments_created = IntCounter::new(
            "enrollments_created_total",
            "Enrollment records created",
        )?;
        registry.register(Box::new(enrollments_created.clone()))?;

        let enrollments_removed = IntCounter::new(
            "enrollments_removed_total",
            "Enrollment records removed, cascades included",
        )?;
        registry.register(Box::new(enrollments_removed.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            commands_rejected,
            command_duration,
            concurrency_retries,
            enrollments_created,
            enrollments_removed,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record one handled command; `rejection` names the failure reason
    pub fn record_command(&self, command: &str, duration_secs: f64, rejection: Option<&str>) {
        self.commands_total.with_label_values(&[command]).inc();
        if let Some(reason) = rejection {
            self.commands_rejected.with_label_values(&[command, reason]).inc();
        }
        self.command_duration.with_label_values(&[command]).observe(duration_secs);
    }

    pub fn record_retry(&self, command: &str) {
        self.concurrency_retries.with_label_values(&[command]).inc();
    }

    pub fn record_enrollments(&self, created: usize, removed: usize) {
        self.enrollments_created.inc_by(created as u64);
        self.enrollments_removed.inc_by(removed as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &Metrics, name: &str) -> f64 {
        let gathered = metrics.registry().gather();
        let family = gathered.iter().find(|m| m.name() == name).unwrap();
        family.metric[0].counter.value.unwrap_or(0.0)
    }

    #[test]
    fn test_record_command() {
        let metrics = Metrics::new().unwrap();
        metrics.record_command("enroll", 0.001, None);
        metrics.record_command("enroll", 0.002, Some("already_enrolled"));

        assert_eq!(counter_value(&metrics, "course_commands_total"), 2.0);
        assert_eq!(counter_value(&metrics, "course_commands_rejected_total"), 1.0);
    }

    #[test]
    fn test_record_enrollments() {
        let metrics = Metrics::new().unwrap();
        metrics.record_enrollments(2, 0);
        metrics.record_enrollments(0, 1);

        assert_eq!(counter_value(&metrics, "enrollments_created_total"), 2.0);
        assert_eq!(counter_value(&metrics, "enrollments_removed_total"), 1.0);
    }

    #[test]
    fn test_record_retry() {
        let metrics = Metrics::new().unwrap();
        metrics.record_retry("enroll");
        assert_eq!(counter_value(&metrics, "course_concurrency_retries_total"), 1.0);
    }
}
