//! Liquidity and date-coverage checks used to screen the universe

use chrono::NaiveDate;

use super::AnalysisError;
use crate::data::{PriceField, StockHistory};

/// Price times volume on one date
pub fn price_volume(
    history: &StockHistory,
    date: NaiveDate,
    field: PriceField,
) -> Result<f64, AnalysisError> {
    let bar = history
        .bar(date)
        .ok_or(AnalysisError::MissingDateData { date })?;
    Ok(bar.get(field) * bar.volume)
}

/// Mean price-volume over the dates in `start..=end` that carry a bar
pub fn average_price_volume(
    history: &StockHistory,
    field: PriceField,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<f64, AnalysisError> {
    let (total, count) = history
        .bars_in_range(start, end)
        .fold((0.0, 0usize), |(total, count), (_, bar)| {
            (total + bar.get(field) * bar.volume, count + 1)
        });

    if count == 0 {
        return Err(AnalysisError::EmptyDataset);
    }
    Ok(total / count as f64)
}

/// Result of comparing a symbol's dates against a benchmark calendar
#[derive(Debug, Clone, PartialEq)]
pub enum Coverage {
    /// Every benchmark date carries a non-zero value in both series
    Complete,
    /// One of the series has no data in the window
    NoData,
    /// Different number of dates in the window
    CountMismatch { candidate: usize, benchmark: usize },
    /// A date is missing or zero
    InvalidDate(NaiveDate),
}

impl Coverage {
    pub fn is_complete(&self) -> bool {
        matches!(self, Coverage::Complete)
    }
}

/// Check that `candidate` trades on exactly the benchmark's dates with non-zero prices
pub fn check_coverage(
    candidate: &StockHistory,
    benchmark: &StockHistory,
    field: PriceField,
    start: NaiveDate,
    end: NaiveDate,
) -> Coverage {
    let data = candidate.series_in_range(field, start, end);
    let reference = benchmark.series_in_range(field, start, end);

    if data.is_empty() || reference.is_empty() {
        return Coverage::NoData;
    }
    if data.len() != reference.len() {
        return Coverage::CountMismatch {
            candidate: data.len(),
            benchmark: reference.len(),
        };
    }

    for (date, value) in data.values() {
        match reference.get(*date) {
            Some(bench) if *value != 0.0 && bench != 0.0 => {}
            _ => return Coverage::InvalidDate(*date),
        }
    }
    Coverage::Complete
}
