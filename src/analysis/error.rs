//! Analysis errors

use chrono::NaiveDate;
use thiserror::Error;

/// Expected, per-series failures of normalization and statistics
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Operation needs at least one observation
    #[error("Dataset is empty")]
    EmptyDataset,
    /// Normalization base on the earliest date is zero
    #[error("Value on earliest date {date} is zero, cannot normalize")]
    ZeroBaseValue { date: NaiveDate },
    /// Two series do not share exactly the same dates
    #[error("Date keys differ, first mismatch at {date}")]
    KeySetMismatch { date: NaiveDate },
    /// A required date is absent from a series
    #[error("No data for {date}")]
    MissingDateData { date: NaiveDate },
}
