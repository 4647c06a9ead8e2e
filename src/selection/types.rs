//! Selection result types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::unit_root_p_value;
use crate::data::DateSeries;
use crate::model::{
    LagLength, LagSelection, PpStatistic, Trend, UnitRootError, UnitRootSpec, UnitRootTest,
};

/// Ordered pair of symbols, displayed as `BASE-CANDIDATE`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairId {
    pub base: String,
    pub candidate: String,
}

impl PairId {
    pub fn new(base: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            candidate: candidate.into(),
        }
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.candidate)
    }
}

/// Unit-root test settings shared by all eight statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitRootConfig {
    #[serde(default = "default_lags")]
    pub lags: usize,
    #[serde(default)]
    pub trend: Trend,
}

fn default_lags() -> usize {
    10
}

impl Default for UnitRootConfig {
    fn default() -> Self {
        Self {
            lags: default_lags(),
            trend: Trend::default(),
        }
    }
}

impl UnitRootConfig {
    /// The eight tests in summary column order
    pub fn specs(&self) -> [UnitRootSpec; 8] {
        let (lags, trend) = (self.lags, self.trend);
        let adf = |selection| UnitRootSpec::Adf {
            lags,
            trend,
            selection,
        };
        let pp = |statistic, length| UnitRootSpec::Pp {
            lags,
            trend,
            statistic,
            lag_length: Some(length),
        };
        let kpss = |length| UnitRootSpec::Kpss {
            lags,
            trend,
            lag_length: Some(length),
        };
        [
            adf(LagSelection::Aic),
            adf(LagSelection::Bic),
            pp(PpStatistic::Rho, LagLength::Short),
            pp(PpStatistic::Rho, LagLength::Long),
            pp(PpStatistic::Tau, LagLength::Short),
            pp(PpStatistic::Tau, LagLength::Long),
            kpss(LagLength::Short),
            kpss(LagLength::Long),
        ]
    }
}

/// Eight unit-root p-values of a pair's spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitRootPValues {
    pub adf_aic: f64,
    pub adf_bic: f64,
    pub pp_rho_short: f64,
    pub pp_rho_long: f64,
    pub pp_tau_short: f64,
    pub pp_tau_long: f64,
    pub kpss_short: f64,
    pub kpss_long: f64,
}

impl UnitRootPValues {
    /// Placeholder for a test that could not be computed
    pub const SENTINEL: f64 = -1.0;

    /// All eight values set to the sentinel
    pub fn failed() -> Self {
        Self::from_array([Self::SENTINEL; 8])
    }

    /// Run every test; the first failure aborts the batch
    pub fn compute<U>(tester: &U, series: &DateSeries, config: &UnitRootConfig) -> Result<Self, UnitRootError>
    where
        U: UnitRootTest + ?Sized,
    {
        let mut values = [Self::SENTINEL; 8];
        for (slot, spec) in values.iter_mut().zip(config.specs().iter()) {
            *slot = unit_root_p_value(tester, series, spec)?;
        }
        Ok(Self::from_array(values))
    }

    pub fn is_failed(&self) -> bool {
        self.as_array().iter().all(|v| *v == Self::SENTINEL)
    }

    pub fn as_array(&self) -> [f64; 8] {
        [
            self.adf_aic,
            self.adf_bic,
            self.pp_rho_short,
            self.pp_rho_long,
            self.pp_tau_short,
            self.pp_tau_long,
            self.kpss_short,
            self.kpss_long,
        ]
    }

    fn from_array(v: [f64; 8]) -> Self {
        Self {
            adf_aic: v[0],
            adf_bic: v[1],
            pp_rho_short: v[2],
            pp_rho_long: v[3],
            pp_tau_short: v[4],
            pp_tau_long: v[5],
            kpss_short: v[6],
            kpss_long: v[7],
        }
    }
}

/// Statistics of a selected pair over the selection window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStatistics {
    pub pair: PairId,
    /// Mean of the normalized difference
    pub mean: f64,
    /// Population standard deviation of the normalized difference
    pub std_dev: f64,
    /// Two-tailed normal significance of the mean
    pub p_value: f64,
    pub unit_root: UnitRootPValues,
}

impl PairStatistics {
    pub fn symbol_a(&self) -> &str {
        &self.pair.base
    }

    pub fn symbol_b(&self) -> &str {
        &self.pair.candidate
    }
}
