//! Prometheus metrics for registration-service.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Safe to call more than once; only
/// the first call installs.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder");
        metrics::describe_counter!(
            "registrations_created_total",
            "Registrations successfully stored"
        );
        metrics::describe_counter!(
            "registrations_rejected_total",
            "Registrations rejected before reaching storage, by reason"
        );
        handle
    });
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_registration_created() {
    metrics::counter!("registrations_created_total").increment(1);
}

pub fn record_registration_rejected(reason: &'static str) {
    metrics::counter!("registrations_rejected_total", "reason" => reason).increment(1);
}
