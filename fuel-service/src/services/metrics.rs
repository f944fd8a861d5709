//! Metrics collection for fuel-service.
//!
//! HTTP metrics go through the `metrics` facade and the Prometheus
//! recorder; ledger counters live in a dedicated `prometheus` registry and
//! are appended to the same `/metrics` output.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static LPO_CREATED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static LPO_AUTO_CANCELLED_TOTAL: OnceLock<IntCounter> = OnceLock::new();
pub static LEDGER_CONFLICTS_TOTAL: OnceLock<IntCounter> = OnceLock::new();
pub static DRIVER_ACCOUNT_SETTLED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Install the recorder and register the ledger counters. Later calls are
/// no-ops.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => {
            tracing::error!("Failed to install Prometheus recorder: {}", e);
            return;
        }
    }

    let registry = Registry::new();

    let lpo_created = IntCounterVec::new(
        Opts::new("fuel_lpo_created_total", "LPO entries created by payment mode"),
        &["payment_mode"],
    );
    let auto_cancelled = IntCounter::new(
        "fuel_lpo_auto_cancelled_total",
        "LPO entries cancelled because cash was paid at their checkpoint",
    );
    let conflicts = IntCounter::new(
        "fuel_ledger_conflicts_total",
        "Ledger commits rejected because a document changed concurrently",
    );
    let settled = IntCounterVec::new(
        Opts::new(
            "fuel_driver_account_settled_total",
            "Driver account entries closed, by resulting status",
        ),
        &["status"],
    );

    let (lpo_created, auto_cancelled, conflicts, settled) =
        match (lpo_created, auto_cancelled, conflicts, settled) {
            (Ok(a), Ok(b), Ok(c), Ok(d)) => (a, b, c, d),
            _ => {
                tracing::error!("Failed to create fuel ledger metrics");
                return;
            }
        };

    let registered = registry
        .register(Box::new(lpo_created.clone()))
        .and_then(|_| registry.register(Box::new(auto_cancelled.clone())))
        .and_then(|_| registry.register(Box::new(conflicts.clone())))
        .and_then(|_| registry.register(Box::new(settled.clone())));
    if let Err(e) = registered {
        tracing::error!("Failed to register fuel ledger metrics: {}", e);
        return;
    }

    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = LPO_CREATED_TOTAL.set(lpo_created);
    let _ = LPO_AUTO_CANCELLED_TOTAL.set(auto_cancelled);
    let _ = LEDGER_CONFLICTS_TOTAL.set(conflicts);
    let _ = DRIVER_ACCOUNT_SETTLED_TOTAL.set(settled);
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

pub fn record_lpo_created(payment_mode: &str) {
    if let Some(counter) = LPO_CREATED_TOTAL.get() {
        counter.with_label_values(&[payment_mode]).inc();
    }
}

pub fn record_auto_cancelled(count: usize) {
    if let Some(counter) = LPO_AUTO_CANCELLED_TOTAL.get() {
        counter.inc_by(count as u64);
    }
}

pub fn record_conflict() {
    if let Some(counter) = LEDGER_CONFLICTS_TOTAL.get() {
        counter.inc();
    }
}

pub fn record_driver_account_closed(status: &str) {
    if let Some(counter) = DRIVER_ACCOUNT_SETTLED_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}
