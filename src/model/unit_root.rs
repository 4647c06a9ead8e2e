//! Unit-root tests
//!
//! ADF and Phillips-Perron test the null of a unit root; KPSS tests the null
//! of stationarity. Each returns an asymptotic p-value.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::mackinnon::{interpolate, rho_p_value, tau_p_value};
use super::regression::{ols, OlsFit};
use super::ModelError;

/// Deterministic terms included in the test regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "nc")]
    None,
    #[serde(rename = "c")]
    Constant,
    #[default]
    #[serde(rename = "ct")]
    ConstantTrend,
    #[serde(rename = "ctt")]
    ConstantTrendSquared,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::None => "nc",
            Trend::Constant => "c",
            Trend::ConstantTrend => "ct",
            Trend::ConstantTrendSquared => "ctt",
        }
    }

    /// Number of deterministic regressors
    pub fn terms(&self) -> usize {
        match self {
            Trend::None => 0,
            Trend::Constant => 1,
            Trend::ConstantTrend => 2,
            Trend::ConstantTrendSquared => 3,
        }
    }

    /// Value of deterministic regressor `term` at 0-based sample row `row`
    fn value(term: usize, row: usize) -> f64 {
        let t = (row + 1) as f64;
        match term {
            0 => 1.0,
            1 => t,
            _ => t * t,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nc" | "n" => Ok(Trend::None),
            "c" => Ok(Trend::Constant),
            "ct" => Ok(Trend::ConstantTrend),
            "ctt" => Ok(Trend::ConstantTrendSquared),
            other => Err(format!("unknown trend '{other}'")),
        }
    }
}

/// Bandwidth rule for the long-run variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LagLength {
    /// ⌊4 (n/100)^¼⌋
    Short,
    /// ⌊12 (n/100)^¼⌋
    Long,
}

impl LagLength {
    pub fn lags(&self, nobs: usize) -> usize {
        let scale = match self {
            LagLength::Short => 4.0,
            LagLength::Long => 12.0,
        };
        (scale * (nobs as f64 / 100.0).powf(0.25)).floor() as usize
    }
}

/// How ADF picks the number of lagged differences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LagSelection {
    /// Use the given lag count as-is
    Fixed,
    Aic,
    Bic,
}

/// Phillips-Perron statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PpStatistic {
    /// Z-tau, studentized
    Tau,
    /// Z-alpha, normalized bias
    Rho,
}

/// One fully-specified unit-root test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitRootSpec {
    Adf {
        lags: usize,
        trend: Trend,
        selection: LagSelection,
    },
    Pp {
        lags: usize,
        trend: Trend,
        statistic: PpStatistic,
        lag_length: Option<LagLength>,
    },
    Kpss {
        lags: usize,
        trend: Trend,
        lag_length: Option<LagLength>,
    },
}

impl UnitRootSpec {
    pub fn name(&self) -> &'static str {
        match self {
            UnitRootSpec::Adf { .. } => "ADF",
            UnitRootSpec::Pp { .. } => "PP",
            UnitRootSpec::Kpss { .. } => "KPSS",
        }
    }
}

/// Unit-root test failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitRootError {
    #[error("{test} needs at least {required} observations, got {actual}")]
    InsufficientData {
        test: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("{test} does not support trend '{trend}'")]
    UnsupportedTrend { test: &'static str, trend: Trend },

    #[error("regression failed: {0}")]
    Regression(#[from] ModelError),

    #[error("{test} statistic is not finite")]
    NonFinite { test: &'static str },
}

/// Unit-root test provider
pub trait UnitRootTest: Send + Sync {
    /// Augmented Dickey-Fuller p-value
    fn adf(
        &self,
        series: &[f64],
        lags: usize,
        trend: Trend,
        selection: LagSelection,
    ) -> Result<f64, UnitRootError>;

    /// Phillips-Perron p-value; `lag_length` overrides `lags` when given
    fn pp(
        &self,
        series: &[f64],
        lags: usize,
        trend: Trend,
        statistic: PpStatistic,
        lag_length: Option<LagLength>,
    ) -> Result<f64, UnitRootError>;

    /// KPSS p-value; `lag_length` overrides `lags` when given
    fn kpss(
        &self,
        series: &[f64],
        lags: usize,
        trend: Trend,
        lag_length: Option<LagLength>,
    ) -> Result<f64, UnitRootError>;

    /// Run whichever test `spec` names
    fn p_value(&self, series: &[f64], spec: &UnitRootSpec) -> Result<f64, UnitRootError> {
        match *spec {
            UnitRootSpec::Adf {
                lags,
                trend,
                selection,
            } => self.adf(series, lags, trend, selection),
            UnitRootSpec::Pp {
                lags,
                trend,
                statistic,
                lag_length,
            } => self.pp(series, lags, trend, statistic, lag_length),
            UnitRootSpec::Kpss {
                lags,
                trend,
                lag_length,
            } => self.kpss(series, lags, trend, lag_length),
        }
    }
}

/// OLS-based ADF, PP and KPSS with asymptotic p-values
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitRootSuite;

impl UnitRootSuite {
    pub fn new() -> Self {
        Self
    }
}

/// ADF regression of Δy on [y_{t-1}, deterministic, Δy_{t-1..t-lag}]
///
/// Rows start at `start` differences in so fits with different lag counts
/// share a sample during selection.
fn adf_fit(y: &[f64], lag: usize, start: usize, trend: Trend) -> Result<OlsFit, ModelError> {
    let dy: Vec<f64> = y.windows(2).map(|w| w[1] - w[0]).collect();
    let rows = dy.len().saturating_sub(start);
    let det = trend.terms();
    let cols = 1 + det + lag;

    let x = DMatrix::from_fn(rows, cols, |row, col| {
        let t = start + row;
        if col == 0 {
            y[t]
        } else if col <= det {
            Trend::value(col - 1, row)
        } else {
            dy[t - (col - det)]
        }
    });
    let target = DVector::from_iterator(rows, dy[start..].iter().copied());
    ols(&x, &target)
}

/// Bartlett-kernel long-run variance of residuals
fn long_run_variance(residuals: &[f64], lags: usize) -> f64 {
    let n = residuals.len() as f64;
    let autocovariance =
        |j: usize| residuals[j..].iter().zip(residuals).map(|(a, b)| a * b).sum::<f64>() / n;

    let mut variance = autocovariance(0);
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        variance += 2.0 * weight * autocovariance(j);
    }
    variance
}

fn finite(test: &'static str, value: f64) -> Result<f64, UnitRootError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(UnitRootError::NonFinite { test })
    }
}

const KPSS_P_VALUES: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
const KPSS_CRITICAL_C: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const KPSS_CRITICAL_CT: [f64; 4] = [0.119, 0.146, 0.176, 0.216];

impl UnitRootTest for UnitRootSuite {
    fn adf(
        &self,
        series: &[f64],
        lags: usize,
        trend: Trend,
        selection: LagSelection,
    ) -> Result<f64, UnitRootError> {
        const TEST: &str = "ADF";
        let required = 2 * lags + trend.terms() + 3;
        if series.len() < required {
            return Err(UnitRootError::InsufficientData {
                test: TEST,
                required,
                actual: series.len(),
            });
        }

        let lag = match selection {
            LagSelection::Fixed => lags,
            LagSelection::Aic | LagSelection::Bic => {
                let mut best: Option<(usize, f64)> = None;
                for candidate in 0..=lags {
                    let fit = adf_fit(series, candidate, lags, trend)?;
                    let ic = if selection == LagSelection::Aic {
                        fit.aic()
                    } else {
                        fit.bic()
                    };
                    if best.map_or(true, |(_, current)| ic < current) {
                        best = Some((candidate, ic));
                    }
                }
                best.map_or(lags, |(lag, _)| lag)
            }
        };

        let fit = adf_fit(series, lag, lag, trend)?;
        let tau = finite(TEST, fit.t_value(0))?;
        Ok(tau_p_value(tau, trend))
    }

    fn pp(
        &self,
        series: &[f64],
        lags: usize,
        trend: Trend,
        statistic: PpStatistic,
        lag_length: Option<LagLength>,
    ) -> Result<f64, UnitRootError> {
        const TEST: &str = "PP";
        let lags = lag_length.map_or(lags, |l| l.lags(series.len()));
        let k = 1 + trend.terms();
        let required = (k + 3).max(lags + 2);
        if series.len() < required {
            return Err(UnitRootError::InsufficientData {
                test: TEST,
                required,
                actual: series.len(),
            });
        }
        if statistic == PpStatistic::Rho && trend == Trend::ConstantTrendSquared {
            return Err(UnitRootError::UnsupportedTrend { test: TEST, trend });
        }

        // y_t on [y_{t-1}, deterministic]
        let nobs = series.len() - 1;
        let det = trend.terms();
        let x = DMatrix::from_fn(nobs, k, |row, col| {
            if col == 0 {
                series[row]
            } else {
                Trend::value(col - 1, row)
            }
        });
        let target = DVector::from_column_slice(&series[1..]);
        let fit = ols(&x, &target)?;
        debug_assert_eq!(fit.regressors(), 1 + det);

        let n = nobs as f64;
        let residuals = fit.residuals.as_slice();
        let rho = fit.params[0];
        let se = fit.std_errors[0];
        let s2 = fit.sigma2();
        let gamma0 = residuals.iter().map(|u| u * u).sum::<f64>() / n;
        let lambda2 = long_run_variance(residuals, lags);
        if lambda2 <= 0.0 {
            return Err(UnitRootError::NonFinite { test: TEST });
        }
        let lambda = lambda2.sqrt();

        match statistic {
            PpStatistic::Tau => {
                let t_rho = (rho - 1.0) / se;
                let z = (gamma0 / lambda2).sqrt() * t_rho
                    - 0.5 * ((lambda2 - gamma0) / lambda) * (n * se / s2.sqrt());
                Ok(tau_p_value(finite(TEST, z)?, trend))
            }
            PpStatistic::Rho => {
                let z = n * (rho - 1.0) - 0.5 * (n * n * se * se / s2) * (lambda2 - gamma0);
                rho_p_value(finite(TEST, z)?, trend)
                    .ok_or(UnitRootError::UnsupportedTrend { test: TEST, trend })
            }
        }
    }

    fn kpss(
        &self,
        series: &[f64],
        lags: usize,
        trend: Trend,
        lag_length: Option<LagLength>,
    ) -> Result<f64, UnitRootError> {
        const TEST: &str = "KPSS";
        let critical = match trend {
            Trend::Constant => &KPSS_CRITICAL_C,
            Trend::ConstantTrend => &KPSS_CRITICAL_CT,
            other => {
                return Err(UnitRootError::UnsupportedTrend {
                    test: TEST,
                    trend: other,
                })
            }
        };

        let nobs = series.len();
        let lags = lag_length.map_or(lags, |l| l.lags(nobs));
        let required = (lags + 2).max(3);
        if nobs < required {
            return Err(UnitRootError::InsufficientData {
                test: TEST,
                required,
                actual: nobs,
            });
        }

        let k = trend.terms();
        let x = DMatrix::from_fn(nobs, k, |row, col| Trend::value(col, row));
        let target = DVector::from_column_slice(series);
        let fit = ols(&x, &target)?;
        let residuals = fit.residuals.as_slice();

        let n = nobs as f64;
        let mut partial = 0.0;
        let eta = residuals
            .iter()
            .map(|r| {
                partial += r;
                partial * partial
            })
            .sum::<f64>()
            / (n * n);
        let lambda2 = long_run_variance(residuals, lags);
        let stat = finite(TEST, eta / lambda2)?;

        Ok(interpolate(stat, critical, &KPSS_P_VALUES))
    }
}
