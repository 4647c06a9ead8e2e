//! Numerical models
//!
//! Normal and Student-t distributions, OLS regression and unit-root tests
//! used to annotate selected pairs.

mod distribution;
mod mackinnon;
mod regression;
mod unit_root;

pub use distribution::{
    normal_cdf, normal_inv_cdf, normal_pdf, p_value, two_tailed_significance, TestFamily,
};
pub use mackinnon::{rho_p_value, tau_p_value};
pub use regression::{linear_regression, linear_regression_over_time, RegressionResult};
pub use unit_root::{
    LagLength, LagSelection, PpStatistic, Trend, UnitRootError, UnitRootSpec, UnitRootSuite,
    UnitRootTest,
};

use thiserror::Error;

/// Regression and distribution errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("x has {x} values but y has {y}")]
    LengthMismatch { x: usize, y: usize },

    #[error("design matrix is singular")]
    Singular,

    #[error("{0} is not finite")]
    NonFinite(&'static str),

    #[error("probability {0} outside (0, 1)")]
    InvalidProbability(f64),

    #[error("invalid degrees of freedom: {0}")]
    InvalidDegreesOfFreedom(f64),
}
