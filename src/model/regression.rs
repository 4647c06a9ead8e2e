//! Ordinary least squares
//!
//! `ols` is the shared fitting routine for the unit-root tests; the public
//! surface is the simple two-variable `linear_regression`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::data::DateSeries;

/// Fitted OLS model
#[derive(Debug, Clone)]
pub(crate) struct OlsFit {
    pub params: DVector<f64>,
    pub std_errors: DVector<f64>,
    pub residuals: DVector<f64>,
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    pub fn regressors(&self) -> usize {
        self.params.len()
    }

    /// Residual variance with `nobs - k` degrees of freedom
    pub fn sigma2(&self) -> f64 {
        self.ssr / (self.nobs - self.regressors()) as f64
    }

    /// t-statistic of one coefficient
    pub fn t_value(&self, index: usize) -> f64 {
        self.params[index] / self.std_errors[index]
    }

    /// Gaussian log-likelihood
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.regressors() as f64
    }

    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + self.regressors() as f64 * (self.nobs as f64).ln()
    }
}

/// Fit `y = X b + e`
pub(crate) fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit, ModelError> {
    let (nobs, k) = x.shape();
    if y.len() != nobs {
        return Err(ModelError::LengthMismatch {
            x: nobs,
            y: y.len(),
        });
    }
    if nobs <= k {
        return Err(ModelError::InsufficientData {
            required: k + 1,
            actual: nobs,
        });
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * x).try_inverse().ok_or(ModelError::Singular)?;
    let params = &xtx_inv * (&xt * y);
    let residuals = y - x * &params;
    let ssr = residuals.dot(&residuals);
    if !ssr.is_finite() || params.iter().any(|p| !p.is_finite()) {
        return Err(ModelError::NonFinite("regression coefficients"));
    }

    let sigma2 = ssr / (nobs - k) as f64;
    let std_errors = DVector::from_iterator(k, (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).sqrt()));

    Ok(OlsFit {
        params,
        std_errors,
        residuals,
        ssr,
        nobs,
    })
}

/// Simple regression of `y` on `x` with an intercept
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub intercept: f64,
    pub slope: f64,
    pub intercept_std_error: f64,
    pub slope_std_error: f64,
    /// NaN when `y` is constant
    pub r_squared: f64,
}

/// Regress `y` on `x`; needs at least three points
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<RegressionResult, ModelError> {
    if x.len() != y.len() {
        return Err(ModelError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 3 {
        return Err(ModelError::InsufficientData {
            required: 3,
            actual: x.len(),
        });
    }

    let n = x.len();
    let design = DMatrix::from_fn(n, 2, |row, col| if col == 0 { 1.0 } else { x[row] });
    let target = DVector::from_column_slice(y);
    let fit = ols(&design, &target)?;

    let mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - fit.ssr / sst } else { f64::NAN };

    Ok(RegressionResult {
        intercept: fit.params[0],
        slope: fit.params[1],
        intercept_std_error: fit.std_errors[0],
        slope_std_error: fit.std_errors[1],
        r_squared,
    })
}

/// Regress a series' values on their chronological index (0, 1, 2, ...)
pub fn linear_regression_over_time(series: &DateSeries) -> Result<RegressionResult, ModelError> {
    let y: Vec<f64> = series.values().copied().collect();
    let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    linear_regression(&x, &y)
}
