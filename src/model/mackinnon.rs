//! Asymptotic p-values for unit-root statistics
//!
//! Tau statistics use MacKinnon (1994) response surfaces for a single series.
//! Rho statistics interpolate Fuller's asymptotic distribution table.

use super::distribution::normal_cdf;
use super::unit_root::Trend;

struct TauSurface {
    star: f64,
    min: f64,
    max: f64,
    small_p: [f64; 3],
    large_p: [f64; 4],
}

// Coefficients are stored pre-scaled: small-p by [1, 1, 1e-2], large-p by [1, 1e-1, 1e-1, 1e-2].
const TAU_NC: TauSurface = TauSurface {
    star: -1.04,
    min: -19.04,
    max: f64::INFINITY,
    small_p: [0.6344, 1.2378, 3.2496e-2],
    large_p: [0.4797, 9.3557e-1, -0.6999e-1, 3.3066e-2],
};

const TAU_C: TauSurface = TauSurface {
    star: -1.61,
    min: -18.83,
    max: 2.74,
    small_p: [2.1659, 1.4412, 3.8269e-2],
    large_p: [1.7339, 9.3202e-1, -1.2745e-1, -1.0368e-2],
};

const TAU_CT: TauSurface = TauSurface {
    star: -2.89,
    min: -16.18,
    max: 0.7,
    small_p: [3.2512, 1.6047, 4.9588e-2],
    large_p: [2.5261, 6.1654e-1, -3.7956e-1, -6.0285e-2],
};

const TAU_CTT: TauSurface = TauSurface {
    star: -3.21,
    min: -17.17,
    max: 0.54,
    small_p: [4.0003, 1.658, 4.8288e-2],
    large_p: [3.0778, 4.9529e-1, -4.1477e-1, -5.9359e-2],
};

fn tau_surface(trend: Trend) -> &'static TauSurface {
    match trend {
        Trend::None => &TAU_NC,
        Trend::Constant => &TAU_C,
        Trend::ConstantTrend => &TAU_CT,
        Trend::ConstantTrendSquared => &TAU_CTT,
    }
}

fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// P-value of a Dickey-Fuller tau statistic
pub fn tau_p_value(statistic: f64, trend: Trend) -> f64 {
    let surface = tau_surface(trend);
    if statistic > surface.max {
        return 1.0;
    }
    if statistic < surface.min {
        return 0.0;
    }
    let z = if statistic <= surface.star {
        polyval(&surface.small_p, statistic)
    } else {
        polyval(&surface.large_p, statistic)
    };
    normal_cdf(z)
}

const RHO_QUANTILES: [f64; 8] = [0.01, 0.025, 0.05, 0.10, 0.90, 0.95, 0.975, 0.99];

const RHO_NC: [f64; 8] = [-13.8, -10.5, -8.1, -5.7, 0.93, 1.28, 1.66, 2.03];
const RHO_C: [f64; 8] = [-20.7, -16.9, -14.1, -11.3, -0.74, -0.40, -0.08, 0.41];
const RHO_CT: [f64; 8] = [-29.5, -25.1, -21.8, -18.3, -4.03, -3.42, -2.86, -2.21];

/// P-value of a normalized-bias (rho) statistic, clamped to [0.01, 0.99]
///
/// `None` when no table exists for the trend.
pub fn rho_p_value(statistic: f64, trend: Trend) -> Option<f64> {
    let table = match trend {
        Trend::None => &RHO_NC,
        Trend::Constant => &RHO_C,
        Trend::ConstantTrend => &RHO_CT,
        Trend::ConstantTrendSquared => return None,
    };
    Some(interpolate(statistic, table, &RHO_QUANTILES))
}

/// Piecewise-linear lookup of `x` in ascending `xs`, clamped at both ends
pub(crate) fn interpolate(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let upper = xs.iter().position(|v| *v >= x).unwrap_or(last);
    let lower = upper - 1;
    let weight = (x - xs[lower]) / (xs[upper] - xs[lower]);
    ys[lower] + weight * (ys[upper] - ys[lower])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tau_critical_values() {
        // 5% asymptotic critical values for c and ct
        assert!((tau_p_value(-2.86, Trend::Constant) - 0.05).abs() < 0.005);
        assert!((tau_p_value(-3.41, Trend::ConstantTrend) - 0.05).abs() < 0.005);
        // 1% for nc
        assert!((tau_p_value(-2.57, Trend::None) - 0.01).abs() < 0.003);
    }

    #[test]
    fn test_tau_bounds() {
        assert_eq!(tau_p_value(5.0, Trend::Constant), 1.0);
        assert_eq!(tau_p_value(-25.0, Trend::ConstantTrend), 0.0);
        assert_eq!(tau_p_value(-20.0, Trend::None), 0.0);
    }

    #[test]
    fn test_tau_is_monotone() {
        let mut previous = 0.0;
        let mut stat = -15.0;
        while stat < 0.5 {
            let p = tau_p_value(stat, Trend::ConstantTrend);
            assert!(p >= previous, "p-value decreased at {stat}");
            previous = p;
            stat += 0.05;
        }
    }

    #[test]
    fn test_rho_interpolation() {
        assert_eq!(rho_p_value(-14.1, Trend::Constant), Some(0.05));
        assert_eq!(rho_p_value(-100.0, Trend::Constant), Some(0.01));
        assert_eq!(rho_p_value(10.0, Trend::ConstantTrend), Some(0.99));
        let mid = rho_p_value(-12.7, Trend::Constant).unwrap();
        assert!((mid - 0.075).abs() < 1e-9);
        assert_eq!(rho_p_value(0.0, Trend::ConstantTrendSquared), None);
    }
}
