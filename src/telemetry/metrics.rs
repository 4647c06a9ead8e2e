//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Counter metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    /// Symbol dropped during screening, labelled by reason
    SymbolsRejected(&'static str),
    /// Pair accepted by the matcher
    PairsSelected,
    /// Unit-root battery that fell back to sentinels
    UnitRootFailures,
    /// Round trip closed by the simulator
    TradesClosed,
}

impl CounterMetric {
    pub fn name(&self) -> &'static str {
        match self {
            CounterMetric::SymbolsRejected(_) => "pairs_symbols_rejected_total",
            CounterMetric::PairsSelected => "pairs_selected_total",
            CounterMetric::UnitRootFailures => "pairs_unit_root_failures_total",
            CounterMetric::TradesClosed => "pairs_trades_closed_total",
        }
    }
}

/// Increment a counter by one
///
/// A no-op until a recorder is installed, so library callers and tests
/// can count freely.
pub fn increment_counter(metric: CounterMetric) {
    let metric_name = metric.name();
    match metric {
        CounterMetric::SymbolsRejected(reason) => {
            metrics::counter!(metric_name, "reason" => reason).increment(1);
        }
        _ => metrics::counter!(metric_name).increment(1),
    }
    tracing::trace!(metric = metric_name, "Incremented counter");
}

/// Install the Prometheus recorder with a scrape endpoint on `port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
