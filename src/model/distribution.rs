//! Standard normal and Student-t helpers

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::function::erf;

use super::ModelError;

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erf::erfc(-x / std::f64::consts::SQRT_2)
}

/// Standard normal density
pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Standard normal quantile for `p` in (0, 1)
pub fn normal_inv_cdf(p: f64) -> Result<f64, ModelError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(ModelError::InvalidProbability(p));
    }
    Ok(-std::f64::consts::SQRT_2 * erf::erfc_inv(2.0 * p))
}

/// Reference distribution of a test statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFamily {
    /// Student-t, one-tailed upper
    T,
    /// Standard normal, two-tailed
    Normal,
}

/// P-value of a test statistic
///
/// `T` gives `1 - F_t(stat)` with `degrees_of_freedom`; `Normal` ignores the
/// degrees of freedom and gives `2(1 - Φ(stat))`.
pub fn p_value(statistic: f64, degrees_of_freedom: f64, family: TestFamily) -> Result<f64, ModelError> {
    if !statistic.is_finite() {
        return Err(ModelError::NonFinite("test statistic"));
    }
    match family {
        TestFamily::T => {
            if degrees_of_freedom <= 0.0 {
                return Err(ModelError::InvalidDegreesOfFreedom(degrees_of_freedom));
            }
            let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)
                .map_err(|_| ModelError::InvalidDegreesOfFreedom(degrees_of_freedom))?;
            Ok(1.0 - dist.cdf(statistic))
        }
        TestFamily::Normal => Ok(2.0 * (1.0 - normal_cdf(statistic))),
    }
}

/// Two-tailed normal significance of a spread with the given moments
///
/// Returns NaN when `std_dev` is zero, matching the undefined z-score.
pub fn two_tailed_significance(mean: f64, std_dev: f64) -> f64 {
    let z = mean.abs() / std_dev;
    if z.is_nan() {
        return f64::NAN;
    }
    2.0 * (1.0 - normal_cdf(z))
}
