//! Telemetry module
//!
//! Structured logging and Prometheus counters

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{increment_counter, init_metrics, CounterMetric};

use crate::config::TelemetryConfig;

/// Guard that keeps telemetry alive for the life of the process
pub struct TelemetryGuard {
    metrics_enabled: bool,
}

impl TelemetryGuard {
    /// True when the Prometheus exporter was installed
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    let metrics_enabled = match config.metrics_port {
        Some(port) => {
            init_metrics(port)?;
            true
        }
        None => false,
    };

    Ok(TelemetryGuard { metrics_enabled })
}
