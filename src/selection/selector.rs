//! Greedy pair selection
//!
//! Each round takes the first symbol left in the pool as the base, scores every
//! other remaining symbol by the standard deviation of the difference of their
//! self-normalized series, and pairs the base with the lowest score. Both
//! symbols then leave the pool. The winner is reduced sequentially with a
//! strict `<`, so ties go to the earlier candidate whether or not the scoring
//! ran in parallel.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::filter::{FilterResult, UniverseFilter};
use super::types::{PairId, PairStatistics, UnitRootConfig, UnitRootPValues};
use crate::analysis::{difference, self_normalize, AnalysisError, CacheKey, Moments, StatisticsCache};
use crate::data::{DateSeries, PriceField, StockHistory};
use crate::model::{two_tailed_significance, UnitRootSuite, UnitRootTest};
use crate::telemetry::{increment_counter, CounterMetric};

/// Selection window and screening parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub price_field: PriceField,
    /// Minimum average price × volume over the window
    pub price_volume_threshold: f64,
    pub unit_root: UnitRootConfig,
    /// Score candidates of a round on the rayon pool
    pub parallel: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2022, 11, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 11, 1).unwrap_or_default(),
            price_field: PriceField::AdjClose,
            price_volume_threshold: 500_000.0,
            unit_root: UnitRootConfig::default(),
            parallel: false,
        }
    }
}

/// Counts and timing of one selection run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionReport {
    /// Symbols offered to the filter
    pub universe: usize,
    /// Symbols that passed the filter
    pub eligible: usize,
    /// Rejections keyed by reason label
    pub rejected: BTreeMap<String, usize>,
    pub pairs: usize,
    /// Bases that found no eligible partner
    pub unpaired: Vec<String>,
    /// Pairs whose unit-root values fell back to the sentinel
    pub unit_root_failures: usize,
    pub elapsed: Duration,
}

/// Pairs keyed by id plus the run report
#[derive(Debug, Clone, Default)]
pub struct SelectionOutcome {
    pub pairs: BTreeMap<PairId, PairStatistics>,
    pub report: SelectionReport,
}

/// Symbol in the matching pool with its selection-window series
#[derive(Debug, Clone)]
pub struct PoolEntry {
    pub symbol: String,
    pub series: DateSeries,
}

impl PoolEntry {
    pub fn new(symbol: impl Into<String>, series: DateSeries) -> Self {
        Self {
            symbol: symbol.into(),
            series,
        }
    }
}

/// Scored candidate for the current base
struct Score {
    index: usize,
    spread: DateSeries,
    moments: Moments,
}

/// Greedy minimum-dispersion pair matcher
pub struct PairSelector<U = UnitRootSuite> {
    config: SelectionConfig,
    tester: U,
    cache: StatisticsCache,
}

impl PairSelector<UnitRootSuite> {
    pub fn new(config: SelectionConfig) -> Self {
        Self::with_tester(config, UnitRootSuite::new())
    }
}

impl<U: UnitRootTest> PairSelector<U> {
    /// Selector with a custom unit-root provider
    pub fn with_tester(config: SelectionConfig, tester: U) -> Self {
        Self {
            config,
            tester,
            cache: StatisticsCache::new(),
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn cache(&self) -> &StatisticsCache {
        &self.cache
    }

    /// Screen the universe and match the survivors
    ///
    /// `universe` order decides base order; `benchmark` supplies the trading calendar.
    pub fn select_pairs(&self, universe: &[StockHistory], benchmark: &StockHistory) -> SelectionOutcome {
        let started = Instant::now();
        let filter = UniverseFilter::new(
            benchmark,
            self.config.price_field,
            self.config.start,
            self.config.end,
            self.config.price_volume_threshold,
        );

        let mut report = SelectionReport {
            universe: universe.len(),
            ..Default::default()
        };
        let mut pool = Vec::new();
        for history in universe {
            match filter.apply(history) {
                FilterResult::Pass => pool.push(PoolEntry::new(
                    history.symbol(),
                    history
                        .series_in_range(self.config.price_field, self.config.start, self.config.end)
                        .into_values(),
                )),
                FilterResult::Reject(reason) => {
                    debug!(symbol = history.symbol(), reason = reason.label(), "symbol rejected");
                    increment_counter(CounterMetric::SymbolsRejected(reason.label()));
                    *report.rejected.entry(reason.label().to_string()).or_default() += 1;
                }
            }
        }
        report.eligible = pool.len();
        info!(
            universe = report.universe,
            eligible = report.eligible,
            "universe screened"
        );

        let (pairs, matching) = self.match_pairs(pool);
        report.pairs = pairs.len();
        report.unpaired = matching.unpaired;
        report.unit_root_failures = matching.unit_root_failures;
        report.elapsed = started.elapsed();
        info!(
            pairs = report.pairs,
            unpaired = report.unpaired.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "pair selection complete"
        );

        SelectionOutcome { pairs, report }
    }

    /// Greedy matching over an already screened pool, in pool order
    pub fn match_pairs(&self, mut pool: Vec<PoolEntry>) -> (BTreeMap<PairId, PairStatistics>, MatchSummary) {
        self.cache.clear();
        let mut pairs = BTreeMap::new();
        let mut summary = MatchSummary::default();

        while pool.len() > 1 {
            let base = pool.remove(0);
            let normalized_base = match self_normalize(&base.series) {
                Ok(normalized) => normalized,
                Err(error) => {
                    warn!(symbol = %base.symbol, %error, "cannot normalize base, dropping");
                    summary.unpaired.push(base.symbol);
                    continue;
                }
            };

            let scores = self.score_candidates(&base.symbol, normalized_base.values(), &pool);
            let winner = scores.into_iter().flatten().fold(None::<Score>, |best, score| match best {
                Some(best) if score.moments.std_dev >= best.moments.std_dev => Some(best),
                _ => Some(score),
            });

            let Some(winner) = winner else {
                debug!(symbol = %base.symbol, "no eligible partner");
                summary.unpaired.push(base.symbol);
                continue;
            };

            let partner = pool.remove(winner.index);
            let pair = PairId::new(base.symbol, partner.symbol);
            let statistics = self.annotate(pair.clone(), &winner, &mut summary);
            debug!(
                pair = %pair,
                std_dev = statistics.std_dev,
                p_value = statistics.p_value,
                "pair selected"
            );
            increment_counter(CounterMetric::PairsSelected);
            pairs.insert(pair, statistics);
        }
        summary.unpaired.extend(pool.into_iter().map(|entry| entry.symbol));

        (pairs, summary)
    }

    /// Score every remaining candidate against the base, preserving pool order
    fn score_candidates(&self, base: &str, normalized_base: &DateSeries, pool: &[PoolEntry]) -> Vec<Option<Score>> {
        let score = |(index, candidate): (usize, &PoolEntry)| {
            self.score(base, normalized_base, index, candidate)
        };
        if self.config.parallel {
            pool.par_iter().enumerate().map(score).collect()
        } else {
            pool.iter().enumerate().map(score).collect()
        }
    }

    fn score(&self, base: &str, normalized_base: &DateSeries, index: usize, candidate: &PoolEntry) -> Option<Score> {
        let result = self_normalize(&candidate.series)
            .and_then(|normalized| difference(normalized_base, normalized.values()))
            .and_then(|spread| {
                let key = CacheKey::named(PairId::new(base, candidate.symbol.as_str()).to_string());
                let moments = self.cache.get_or_compute(key, &spread)?;
                Ok::<_, AnalysisError>((spread, moments))
            });

        match result {
            Ok((spread, moments)) if !moments.std_dev.is_nan() => Some(Score {
                index,
                spread,
                moments,
            }),
            Ok(_) => None,
            Err(error) => {
                debug!(base, candidate = %candidate.symbol, %error, "candidate skipped");
                None
            }
        }
    }

    fn annotate(&self, pair: PairId, winner: &Score, summary: &mut MatchSummary) -> PairStatistics {
        let Moments { mean, std_dev } = winner.moments;
        let unit_root = match UnitRootPValues::compute(&self.tester, &winner.spread, &self.config.unit_root) {
            Ok(values) => values,
            Err(error) => {
                warn!(pair = %pair, %error, "unit-root tests failed");
                increment_counter(CounterMetric::UnitRootFailures);
                summary.unit_root_failures += 1;
                UnitRootPValues::failed()
            }
        };

        PairStatistics {
            pair,
            mean,
            std_dev,
            p_value: two_tailed_significance(mean, std_dev),
            unit_root,
        }
    }
}

/// Side results of a matching pass
#[derive(Debug, Clone, Default)]
pub struct MatchSummary {
    pub unpaired: Vec<String>,
    pub unit_root_failures: usize,
}
