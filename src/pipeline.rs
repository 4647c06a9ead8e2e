//! End-to-end run: load, select, backtest, persist
//!
//! Loading is async and concurrent. Selection runs on the blocking pool.
//! Each pair is then backtested on its own; a pair that fails to backtest
//! or to persist is logged and skipped, never fatal to the run.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::backtest::{BackTest, BackTestError, PairLeg, PairsBackTest, PerformanceMetrics, Strategy, TradeLedger};
use crate::config::Config;
use crate::data::{
    load_universe, read_listings, FilePriceSource, PriceSource, ResultWriter, StockHistory,
    SummaryRow,
};
use crate::selection::{PairSelector, PairStatistics, SelectionOutcome, SelectionReport};

/// Backtest result of one selected pair
#[derive(Debug, Clone, Serialize)]
pub struct PairResult {
    pub statistics: PairStatistics,
    pub metrics: PerformanceMetrics,
    #[serde(skip)]
    pub ledger: TradeLedger,
}

/// A pair that was selected but could not be backtested
#[derive(Debug, Clone, Serialize)]
pub struct PairFailure {
    pub pair: String,
    pub error: String,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub selection: SelectionReport,
    pub results: Vec<PairResult>,
    pub failures: Vec<PairFailure>,
    /// Written files, absent when persistence was skipped
    pub summary_path: Option<PathBuf>,
    pub trades_path: Option<PathBuf>,
}

impl RunReport {
    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let mut out = format!(
            r#"
RUN {}
───────────────────────────────────────────────────────
Universe:         {}
Eligible:         {}
Pairs:            {}
Backtested:       {}
Failed:           {}
"#,
            self.run_id,
            self.selection.universe,
            self.selection.eligible,
            self.selection.pairs,
            self.results.len(),
            self.failures.len(),
        );
        if !self.results.is_empty() {
            out.push_str(&format!(
                "\n{:<16} {:>10} {:>10} {:>8} {:>8} {:>10}\n",
                "PAIR", "STD DEV", "RETURN %", "TRADES", "SHARPE", "MAX DD %"
            ));
            for result in &self.results {
                out.push_str(&format!(
                    "{:<16} {:>10.4} {:>10.2} {:>8} {:>8.3} {:>10.2}\n",
                    result.statistics.pair.to_string(),
                    result.statistics.std_dev,
                    result.metrics.rate_of_return_pct(),
                    result.metrics.trade_count,
                    result.metrics.sharpe_ratio,
                    result.metrics.max_drawdown * 100.0,
                ));
            }
        }
        out
    }
}

/// Selection over loaded histories, keeping the histories for the backtest stage
pub struct SelectionRun {
    pub outcome: SelectionOutcome,
    histories: HashMap<String, StockHistory>,
}

impl SelectionRun {
    pub fn history(&self, symbol: &str) -> Option<&StockHistory> {
        self.histories.get(symbol)
    }
}

/// Runs the screener against a price source
pub struct Pipeline<S> {
    config: Config,
    source: S,
}

impl Pipeline<FilePriceSource> {
    /// Read prices from the configured stock data directory
    pub fn from_config(config: Config) -> Self {
        let source = FilePriceSource::new(
            config.data.stock_data_dir.clone(),
            config.data.file_extension.clone(),
        );
        Self::new(config, source)
    }
}

impl<S: PriceSource> Pipeline<S> {
    pub fn new(config: Config, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Listings from the configured file; unreadable yields no symbols
    pub fn listings(&self) -> Vec<String> {
        match read_listings(&self.config.data.listings_file) {
            Ok(symbols) => symbols,
            Err(error) => {
                error!(%error, "listings unavailable, universe is empty");
                Vec::new()
            }
        }
    }

    /// Load the universe and benchmark, then select pairs
    pub async fn select(&self, symbols: &[String]) -> anyhow::Result<SelectionRun> {
        let benchmark_symbol = self.config.data.benchmark_symbol.as_str();
        let benchmark = self.source.load(benchmark_symbol).await;
        if !benchmark.loaded {
            warn!(symbol = benchmark_symbol, "benchmark unavailable, every symbol will fail coverage");
        }

        let universe: Vec<StockHistory> = load_universe(&self.source, symbols)
            .await
            .into_iter()
            .map(|outcome| outcome.history)
            .collect();
        let loaded = universe.iter().filter(|h| !h.is_empty()).count();
        info!(requested = symbols.len(), loaded, "universe loaded");

        let selector = PairSelector::new(self.config.selection_config());
        let benchmark = benchmark.history;
        let (outcome, universe) = tokio::task::spawn_blocking(move || {
            let outcome = selector.select_pairs(&universe, &benchmark);
            (outcome, universe)
        })
        .await
        .context("pair selection task failed")?;

        let histories = universe
            .into_iter()
            .map(|history| (history.symbol().to_string(), history))
            .collect();
        Ok(SelectionRun { outcome, histories })
    }

    /// Backtest one selected pair on the backtest window
    pub fn backtest_pair(&self, run: &SelectionRun, statistics: &PairStatistics) -> Result<PairResult, BackTestError> {
        let leg = |symbol: &str| {
            let history = run.history(symbol).ok_or_else(|| BackTestError::MissingHistory {
                symbol: symbol.to_string(),
            })?;
            Ok::<_, BackTestError>(self.leg(history))
        };
        let backtest = PairsBackTest::new(
            leg(statistics.symbol_a())?,
            leg(statistics.symbol_b())?,
            self.config.backtest.initial_balance,
        )?;

        let mut strategy = Strategy::from(backtest);
        strategy.run(&self.config.backtest.rule_for(statistics.std_dev))?;

        Ok(PairResult {
            statistics: statistics.clone(),
            metrics: strategy.performance(),
            ledger: strategy.ledger().clone(),
        })
    }

    fn leg(&self, history: &StockHistory) -> PairLeg {
        let field = self.config.data.price_field;
        let selection = &self.config.selection;
        let backtest = &self.config.backtest;
        PairLeg::new(
            history.symbol(),
            history
                .series_in_range(field, backtest.start_date, backtest.end_date)
                .into_values(),
            history
                .series_in_range(field, selection.start_date, selection.end_date)
                .into_values(),
        )
    }

    /// Full run; `writer` decides where result files go, `None` skips persistence
    pub async fn run(&self, writer: Option<&ResultWriter>) -> anyhow::Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        self.run_inner(run_id, writer).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, writer: Option<&ResultWriter>) -> anyhow::Result<RunReport> {
        let symbols = self.listings();
        let selection = self.select(&symbols).await?;

        let mut summary = match writer {
            Some(writer) => {
                writer.ensure_dir().context("cannot create output directory")?;
                Some(
                    writer
                        .summary(&self.config.output.pairs_file)
                        .context("cannot create summary file")?,
                )
            }
            None => None,
        };
        let mut trades_path = None;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (pair, statistics) in &selection.outcome.pairs {
            let result = match self.backtest_pair(&selection, statistics) {
                Ok(result) => result,
                Err(error) => {
                    warn!(pair = %pair, %error, "backtest failed, skipping pair");
                    failures.push(PairFailure {
                        pair: pair.to_string(),
                        error: error.to_string(),
                    });
                    continue;
                }
            };
            info!(
                pair = %pair,
                trades = result.metrics.trade_count,
                return_pct = result.metrics.rate_of_return_pct(),
                "pair backtested"
            );

            if let Some(summary) = summary.as_mut() {
                if let Err(error) = summary.append(SummaryRow::new(&result.statistics, &result.metrics)) {
                    warn!(pair = %pair, %error, "summary row not written");
                }
            }
            if let Some(writer) = writer {
                match writer.append_trades(&self.config.output.trades_file, pair, &result.ledger) {
                    Ok(path) => trades_path = Some(path),
                    Err(error) => warn!(pair = %pair, %error, "trades not written"),
                }
            }
            results.push(result);
        }

        info!(
            pairs = selection.outcome.pairs.len(),
            backtested = results.len(),
            failed = failures.len(),
            "run complete"
        );

        Ok(RunReport {
            run_id,
            selection: selection.outcome.report,
            results,
            failures,
            summary_path: summary.map(|s| s.path().to_path_buf()),
            trades_path,
        })
    }
}
