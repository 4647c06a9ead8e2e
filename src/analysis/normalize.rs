//! Series normalization and spreads
//!
//! Two modes:
//! - self normalization divides a series by its own earliest value
//! - reference normalization divides a series by the earliest value of
//!   another series. The backtest relies on this asymmetry to decide which
//!   leg is long, so the divisor must stay the reference's base.

use chrono::NaiveDate;

use super::AnalysisError;
use crate::data::DateSeries;

/// Read-only series of ratios to a base value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedSeries {
    values: DateSeries,
}

impl NormalizedSeries {
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.values.get(&date).copied()
    }

    pub fn values(&self) -> &DateSeries {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Value on the earliest date, rejecting empty series and a zero base
fn base_value(series: &DateSeries) -> Result<f64, AnalysisError> {
    let (date, value) = series
        .first_key_value()
        .ok_or(AnalysisError::EmptyDataset)?;
    if *value == 0.0 {
        return Err(AnalysisError::ZeroBaseValue { date: *date });
    }
    Ok(*value)
}

fn scale(series: &DateSeries, base: f64) -> NormalizedSeries {
    NormalizedSeries {
        values: series.iter().map(|(d, v)| (*d, v / base)).collect(),
    }
}

/// Divide every value by the series' own earliest value
pub fn self_normalize(series: &DateSeries) -> Result<NormalizedSeries, AnalysisError> {
    let base = base_value(series)?;
    Ok(scale(series, base))
}

/// Divide every value of `target` by the earliest value of `reference`
pub fn reference_normalize(
    target: &DateSeries,
    reference: &DateSeries,
) -> Result<NormalizedSeries, AnalysisError> {
    let base = base_value(reference)?;
    Ok(scale(target, base))
}

/// Elementwise `a - b`; both series must carry exactly the same dates
pub fn difference(a: &DateSeries, b: &DateSeries) -> Result<DateSeries, AnalysisError> {
    let mut result = DateSeries::new();
    let mut left = a.iter();
    let mut right = b.iter();

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ok(result),
            (Some((da, va)), Some((db, vb))) if da == db => {
                result.insert(*da, va - vb);
            }
            (Some((da, _)), Some((db, _))) => {
                return Err(AnalysisError::KeySetMismatch {
                    date: (*da).min(*db),
                })
            }
            (Some((date, _)), None) | (None, Some((date, _))) => {
                return Err(AnalysisError::KeySetMismatch { date: *date })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, day).unwrap()
    }

    fn series(values: &[(u32, f64)]) -> DateSeries {
        values.iter().map(|(d, v)| (date(*d), *v)).collect()
    }

    #[test]
    fn test_self_normalize_divides_by_earliest() {
        let data = series(&[(3, 20.0), (1, 10.0), (2, 15.0)]);
        let normalized = self_normalize(&data).unwrap();
        assert_eq!(normalized.get(date(1)), Some(1.0));
        assert_eq!(normalized.get(date(2)), Some(1.5));
        assert_eq!(normalized.get(date(3)), Some(2.0));
    }

    #[test]
    fn test_self_normalize_empty() {
        assert_eq!(
            self_normalize(&DateSeries::new()),
            Err(AnalysisError::EmptyDataset)
        );
    }

    #[test]
    fn test_self_normalize_zero_base() {
        let data = series(&[(1, 0.0), (2, 5.0)]);
        assert_eq!(
            self_normalize(&data),
            Err(AnalysisError::ZeroBaseValue { date: date(1) })
        );
    }

    #[test]
    fn test_zero_after_earliest_is_allowed() {
        let data = series(&[(1, 4.0), (2, 0.0)]);
        let normalized = self_normalize(&data).unwrap();
        assert_eq!(normalized.get(date(2)), Some(0.0));
    }

    #[test]
    fn test_reference_normalize_uses_reference_base() {
        let target = series(&[(10, 30.0), (11, 60.0)]);
        let reference = series(&[(1, 15.0), (2, 100.0)]);
        let normalized = reference_normalize(&target, &reference).unwrap();
        assert_eq!(normalized.get(date(10)), Some(2.0));
        assert_eq!(normalized.get(date(11)), Some(4.0));
    }

    #[test]
    fn test_reference_normalize_failures_follow_reference() {
        let target = series(&[(1, 1.0)]);
        assert_eq!(
            reference_normalize(&target, &DateSeries::new()),
            Err(AnalysisError::EmptyDataset)
        );
        assert_eq!(
            reference_normalize(&target, &series(&[(4, 0.0)])),
            Err(AnalysisError::ZeroBaseValue { date: date(4) })
        );
        // an empty target with a valid reference is fine
        let empty = reference_normalize(&DateSeries::new(), &series(&[(1, 2.0)])).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_difference_matching_keys() {
        let a = series(&[(1, 1.0), (2, 1.5)]);
        let b = series(&[(1, 0.5), (2, 2.0)]);
        let diff = difference(&a, &b).unwrap();
        assert_eq!(diff, series(&[(1, 0.5), (2, -0.5)]));
    }

    #[test]
    fn test_difference_requires_identical_keys() {
        let a = series(&[(1, 1.0), (2, 1.5)]);
        let b = series(&[(1, 0.5), (3, 2.0)]);
        assert_eq!(
            difference(&a, &b),
            Err(AnalysisError::KeySetMismatch { date: date(2) })
        );
    }

    #[test]
    fn test_difference_is_not_an_intersection() {
        let a = series(&[(1, 1.0), (2, 1.5), (3, 2.0)]);
        let b = series(&[(1, 0.5), (2, 2.0)]);
        assert_eq!(
            difference(&a, &b),
            Err(AnalysisError::KeySetMismatch { date: date(3) })
        );
        assert!(difference(&b, &a).is_err());
    }

    #[test]
    fn test_difference_of_empty_series() {
        let diff = difference(&DateSeries::new(), &DateSeries::new()).unwrap();
        assert!(diff.is_empty());
    }
}
