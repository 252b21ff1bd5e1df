//! Metrics collection and reporting

use crate::worker::CycleReport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Point-in-time view of the counters
#[derive(Debug, Clone)]
pub struct WorkerMetrics {
    pub cycles_total: u64,
    pub cycle_errors: u64,
    pub messages_processed: u64,
    pub messages_skipped: u64,
    pub messages_failed: u64,
    pub delete_failures: u64,
    pub uptime_secs: u64,
}

/// Latency histogram buckets (in milliseconds)
const LATENCY_BUCKETS: &[f64] = &[
    5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0,
];

/// Histogram for tracking latency distribution
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<(f64, AtomicU64)>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    fn new(buckets: &[f64]) -> Self {
        Self {
            buckets: buckets.iter().map(|&b| (b, AtomicU64::new(0))).collect(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    fn observe(&self, value: f64) {
        self.sum.fetch_add(value as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        // Cumulative: every bucket at or above the value
        for (bucket, counter) in &self.buckets {
            if value <= *bucket {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn export_prometheus(&self, name: &str, help: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} histogram\n", name));

        for (bucket, counter) in &self.buckets {
            output.push_str(&format!(
                "{}_bucket{{le=\"{}\"}} {}\n",
                name,
                bucket,
                counter.load(Ordering::Relaxed)
            ));
        }

        let total_count = self.count.load(Ordering::Relaxed);
        output.push_str(&format!("{}_bucket{{le=\"+Inf\"}} {}\n", name, total_count));
        output.push_str(&format!("{}_sum {:.3}\n", name, self.sum.load(Ordering::Relaxed) as f64));
        output.push_str(&format!("{}_count {}\n", name, total_count));

        output
    }
}

/// Metrics collector shared by the reconciler and the HTTP layer
pub struct MetricsCollector {
    start_time: Instant,
    cycles_total: AtomicU64,
    cycle_errors: AtomicU64,
    messages_processed: AtomicU64,
    messages_skipped: AtomicU64,
    messages_failed: AtomicU64,
    delete_failures: AtomicU64,

    cycle_latency: Histogram,
    embedding_latency: Histogram,
    store_latency: Histogram,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cycles_total: AtomicU64::new(0),
            cycle_errors: AtomicU64::new(0),
            messages_processed: AtomicU64::new(0),
            messages_skipped: AtomicU64::new(0),
            messages_failed: AtomicU64::new(0),
            delete_failures: AtomicU64::new(0),
            cycle_latency: Histogram::new(LATENCY_BUCKETS),
            embedding_latency: Histogram::new(LATENCY_BUCKETS),
            store_latency: Histogram::new(LATENCY_BUCKETS),
        }
    }

    /// Record a completed cycle
    pub fn record_cycle(&self, report: &CycleReport, duration: Duration) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.messages_processed.fetch_add(report.processed as u64, Ordering::Relaxed);
        self.messages_skipped.fetch_add(report.skipped as u64, Ordering::Relaxed);
        self.messages_failed.fetch_add(report.failed.len() as u64, Ordering::Relaxed);
        self.cycle_latency.observe(duration.as_millis() as f64);
    }

    /// Record a cycle aborted by a queue read failure
    pub fn record_cycle_error(&self) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.cycle_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_embedding_latency(&self, duration: Duration) {
        self.embedding_latency.observe(duration.as_millis() as f64);
    }

    pub fn record_store_latency(&self, duration: Duration) {
        self.store_latency.observe(duration.as_millis() as f64);
    }

    pub fn record_delete_failure(&self) {
        self.delete_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> WorkerMetrics {
        WorkerMetrics {
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            cycle_errors: self.cycle_errors.load(Ordering::Relaxed),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            messages_skipped: self.messages_skipped.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            delete_failures: self.delete_failures.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let m = self.get_metrics();

        let mut output = format!(
            "# HELP embedding_worker_cycles_total Total processing cycles\n\
             # TYPE embedding_worker_cycles_total counter\n\
             embedding_worker_cycles_total {}\n\
             \n\
             # HELP embedding_worker_cycle_errors_total Cycles aborted by a queue read failure\n\
             # TYPE embedding_worker_cycle_errors_total counter\n\
             embedding_worker_cycle_errors_total {}\n\
             \n\
             # HELP embedding_worker_messages_processed_total Messages embedded and stored\n\
             # TYPE embedding_worker_messages_processed_total counter\n\
             embedding_worker_messages_processed_total {}\n\
             \n\
             # HELP embedding_worker_messages_skipped_total Malformed messages skipped\n\
             # TYPE embedding_worker_messages_skipped_total counter\n\
             embedding_worker_messages_skipped_total {}\n\
             \n\
             # HELP embedding_worker_messages_failed_total Messages left in the queue for retry\n\
             # TYPE embedding_worker_messages_failed_total counter\n\
             embedding_worker_messages_failed_total {}\n\
             \n\
             # HELP embedding_worker_delete_failures_total Stored messages whose delete failed\n\
             # TYPE embedding_worker_delete_failures_total counter\n\
             embedding_worker_delete_failures_total {}\n\
             \n\
             # HELP embedding_worker_uptime_seconds Uptime in seconds\n\
             # TYPE embedding_worker_uptime_seconds counter\n\
             embedding_worker_uptime_seconds {}\n\
             \n",
            m.cycles_total,
            m.cycle_errors,
            m.messages_processed,
            m.messages_skipped,
            m.messages_failed,
            m.delete_failures,
            m.uptime_secs,
        );

        output.push_str(&self.cycle_latency.export_prometheus(
            "embedding_worker_cycle_duration_ms",
            "Cycle duration in milliseconds"
        ));
        output.push('\n');

        output.push_str(&self.embedding_latency.export_prometheus(
            "embedding_worker_embedding_duration_ms",
            "Embedding call duration in milliseconds"
        ));
        output.push('\n');

        output.push_str(&self.store_latency.export_prometheus(
            "embedding_worker_store_duration_ms",
            "Record store update duration in milliseconds"
        ));

        output
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{FailedMessage, FailureCause};

    #[test]
    fn test_record_cycle() {
        let collector = MetricsCollector::new();
        let report = CycleReport {
            success: true,
            processed: 2,
            skipped: 1,
            failed: vec![FailedMessage {
                message_id: 4,
                record_id: None,
                cause: FailureCause::Store,
                error: "down".to_string(),
            }],
            unacknowledged: vec![],
            message: None,
        };

        collector.record_cycle(&report, Duration::from_millis(120));
        collector.record_cycle_error();
        collector.record_delete_failure();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.cycles_total, 2);
        assert_eq!(metrics.cycle_errors, 1);
        assert_eq!(metrics.messages_processed, 2);
        assert_eq!(metrics.messages_skipped, 1);
        assert_eq!(metrics.messages_failed, 1);
        assert_eq!(metrics.delete_failures, 1);
    }

    #[test]
    fn test_prometheus_export() {
        let collector = MetricsCollector::new();
        collector.record_cycle(&CycleReport::empty(), Duration::from_millis(7));
        collector.record_embedding_latency(Duration::from_millis(300));

        let prometheus = collector.export_prometheus();

        assert!(prometheus.contains("embedding_worker_cycles_total 1"));
        assert!(prometheus.contains("embedding_worker_cycle_duration_ms_bucket{le=\"10\"} 1"));
        assert!(prometheus.contains("embedding_worker_embedding_duration_ms_bucket{le=\"250\"} 0"));
        assert!(prometheus.contains("embedding_worker_embedding_duration_ms_count 1"));
    }
}
