//! Prometheus metrics for order flow and the position monitor.
//!
//! Everything goes through the `metrics` facade; nothing is recorded
//! unless a recorder (the Prometheus exporter in the binary) is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::{debug, info};

// === Metric Name Constants ===

/// Order submission latency metric name.
pub const METRIC_ORDER_SUBMIT_LATENCY: &str = "order_submit_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Orders submitted counter metric name.
pub const METRIC_ORDERS_SUBMITTED: &str = "orders_submitted_total";
/// Orders failed counter metric name.
pub const METRIC_ORDERS_FAILED: &str = "orders_failed_total";
/// Orders cancelled counter metric name.
pub const METRIC_ORDERS_CANCELLED: &str = "orders_cancelled_total";
/// Cancel failures counter metric name.
pub const METRIC_CANCEL_FAILURES: &str = "cancel_failures_total";
/// Monitor polls counter metric name.
pub const METRIC_MONITOR_POLLS: &str = "monitor_polls_total";
/// Monitor poll errors counter metric name.
pub const METRIC_MONITOR_ERRORS: &str = "monitor_errors_total";
/// Liquidations counter metric name.
pub const METRIC_LIQUIDATIONS: &str = "liquidations_total";

/// Register metric descriptions. Call once at startup.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_ORDER_SUBMIT_LATENCY,
        "Order submission latency in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(METRIC_ORDERS_SUBMITTED, "Ladder and exit orders accepted by the venue");
    describe_counter!(METRIC_ORDERS_FAILED, "Order submissions that failed or were refused");
    describe_counter!(METRIC_ORDERS_CANCELLED, "Resting orders cancelled during liquidation");
    describe_counter!(METRIC_CANCEL_FAILURES, "Cancellation attempts that failed");
    describe_counter!(METRIC_MONITOR_POLLS, "Position monitor iterations");
    describe_counter!(METRIC_MONITOR_ERRORS, "Position monitor iterations that hit a gateway error");
    describe_counter!(METRIC_LIQUIDATIONS, "Liquidations triggered by the monitor");

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter with an HTTP listener on `port`.
pub fn install_prometheus(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment orders submitted counter.
pub fn inc_orders_submitted() {
    counter!(METRIC_ORDERS_SUBMITTED).increment(1);
}

/// Increment orders failed counter.
pub fn inc_orders_failed() {
    counter!(METRIC_ORDERS_FAILED).increment(1);
}

/// Increment orders cancelled counter.
pub fn inc_orders_cancelled() {
    counter!(METRIC_ORDERS_CANCELLED).increment(1);
}

/// Increment cancel failures counter.
pub fn inc_cancel_failures() {
    counter!(METRIC_CANCEL_FAILURES).increment(1);
}

/// Increment monitor polls counter.
pub fn inc_monitor_polls() {
    counter!(METRIC_MONITOR_POLLS).increment(1);
}

/// Increment monitor errors counter.
pub fn inc_monitor_errors() {
    counter!(METRIC_MONITOR_ERRORS).increment(1);
}

/// Increment liquidations counter.
pub fn inc_liquidations() {
    counter!(METRIC_LIQUIDATIONS).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for order submission.
pub fn timer_order_submit() -> LatencyTimer {
    LatencyTimer::new(METRIC_ORDER_SUBMIT_LATENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = LatencyTimer::new("test_metric");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 9.0);
    }

    #[test]
    fn counters_are_noops_without_recorder() {
        inc_orders_submitted();
        inc_monitor_polls();
        inc_liquidations();
    }
}
