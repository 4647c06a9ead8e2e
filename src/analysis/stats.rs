//! Descriptive statistics

use serde::{Deserialize, Serialize};

use super::AnalysisError;
use crate::data::DateSeries;
use crate::model::{UnitRootError, UnitRootSpec, UnitRootTest};

/// Population mean and standard deviation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
}

impl Moments {
    /// Two-pass population moments (divides by N); `None` when empty
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

/// Population mean and standard deviation of a date series
pub fn mean_and_std_dev(data: &DateSeries) -> Result<Moments, AnalysisError> {
    let values: Vec<f64> = data.values().copied().collect();
    Moments::from_values(&values).ok_or(AnalysisError::EmptyDataset)
}

/// Run a unit-root test over the series' values in date order
pub fn unit_root_p_value<U>(
    tester: &U,
    series: &DateSeries,
    spec: &UnitRootSpec,
) -> Result<f64, UnitRootError>
where
    U: UnitRootTest + ?Sized,
{
    let values: Vec<f64> = series.values().copied().collect();
    tester.p_value(&values, spec)
}
