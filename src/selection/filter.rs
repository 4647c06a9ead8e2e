//! Universe screening

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{average_price_volume, check_coverage, Coverage};
use crate::data::{PriceField, StockHistory};

/// Result of screening one symbol
#[derive(Debug, Clone, PartialEq)]
pub enum FilterResult {
    /// Symbol is eligible for pairing
    Pass,
    /// Symbol rejected
    Reject(RejectReason),
}

/// Reason for rejecting a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// No bars in the selection window
    NoData,
    /// Average price-volume below threshold
    InsufficientLiquidity(f64),
    /// Dates do not line up with the benchmark
    IncompleteCoverage,
}

impl RejectReason {
    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::NoData => "no_data",
            RejectReason::InsufficientLiquidity(_) => "illiquid",
            RejectReason::IncompleteCoverage => "coverage",
        }
    }
}

/// Liquidity and benchmark-coverage screen over a date window
pub struct UniverseFilter<'a> {
    benchmark: &'a StockHistory,
    field: PriceField,
    start: NaiveDate,
    end: NaiveDate,
    price_volume_threshold: f64,
}

impl<'a> UniverseFilter<'a> {
    pub fn new(
        benchmark: &'a StockHistory,
        field: PriceField,
        start: NaiveDate,
        end: NaiveDate,
        price_volume_threshold: f64,
    ) -> Self {
        Self {
            benchmark,
            field,
            start,
            end,
            price_volume_threshold,
        }
    }

    /// Screen one symbol: liquidity first, then date coverage
    pub fn apply(&self, history: &StockHistory) -> FilterResult {
        let average = match average_price_volume(history, self.field, self.start, self.end) {
            Ok(average) => average,
            Err(_) => return FilterResult::Reject(RejectReason::NoData),
        };
        if average < self.price_volume_threshold {
            return FilterResult::Reject(RejectReason::InsufficientLiquidity(average));
        }

        let coverage = check_coverage(history, self.benchmark, self.field, self.start, self.end);
        if !coverage.is_complete() {
            match coverage {
                Coverage::CountMismatch {
                    candidate,
                    benchmark,
                } => debug!(
                    symbol = history.symbol(),
                    candidate, benchmark, "date count differs from benchmark"
                ),
                Coverage::InvalidDate(date) => debug!(
                    symbol = history.symbol(),
                    %date,
                    "missing or zero price on benchmark date"
                ),
                _ => debug!(symbol = history.symbol(), "no data in selection window"),
            }
            return FilterResult::Reject(RejectReason::IncompleteCoverage);
        }

        FilterResult::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PriceBar;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, day).unwrap()
    }

    fn history(symbol: &str, rows: &[(u32, f64, f64)]) -> StockHistory {
        StockHistory::from_bars(
            symbol,
            rows.iter().map(|(d, price, volume)| {
                (
                    date(*d),
                    PriceBar {
                        open: *price,
                        high: *price,
                        low: *price,
                        close: *price,
                        adj_close: *price,
                        volume: *volume,
                    },
                )
            }),
        )
    }

    fn filter(benchmark: &StockHistory) -> UniverseFilter<'_> {
        UniverseFilter::new(benchmark, PriceField::AdjClose, date(1), date(30), 1000.0)
    }

    #[test]
    fn test_liquid_and_covered_passes() {
        let spy = history("SPY", &[(1, 400.0, 1.0), (2, 401.0, 1.0)]);
        let aaa = history("AAA", &[(1, 10.0, 100.0), (2, 10.0, 100.0)]);
        assert_eq!(filter(&spy).apply(&aaa), FilterResult::Pass);
    }

    #[test]
    fn test_illiquid_rejected_before_coverage() {
        let spy = history("SPY", &[(1, 400.0, 1.0), (2, 401.0, 1.0)]);
        // also misses a benchmark date, but liquidity is checked first
        let thin = history("THIN", &[(1, 10.0, 10.0)]);
        assert_eq!(
            filter(&spy).apply(&thin),
            FilterResult::Reject(RejectReason::InsufficientLiquidity(100.0))
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let spy = history("SPY", &[(1, 400.0, 1.0)]);
        let edge = history("EDGE", &[(1, 10.0, 100.0)]);
        assert_eq!(filter(&spy).apply(&edge), FilterResult::Pass);
    }

    #[test]
    fn test_missing_dates_rejected() {
        let spy = history("SPY", &[(1, 400.0, 1.0), (2, 401.0, 1.0)]);
        let gappy = history("GAP", &[(1, 10.0, 1000.0), (3, 10.0, 1000.0)]);
        assert_eq!(
            filter(&spy).apply(&gappy),
            FilterResult::Reject(RejectReason::IncompleteCoverage)
        );
    }

    #[test]
    fn test_empty_history_rejected() {
        let spy = history("SPY", &[(1, 400.0, 1.0)]);
        let empty = StockHistory::new("NONE");
        let result = filter(&spy).apply(&empty);
        assert_eq!(result, FilterResult::Reject(RejectReason::NoData));
        if let FilterResult::Reject(reason) = result {
            assert_eq!(reason.label(), "no_data");
        }
    }
}
