//! Confidence intervals from a bootstrap distribution.
//!
//! Both methods read R-7 quantiles of the surviving resampled alphas. The
//! percentile interval uses the nominal tail probabilities; BCa shifts them
//! by a bias correction and an acceleration.

use serde::{Deserialize, Serialize};
use u_numflow::{special, stats};

/// A two-sided interval at confidence `level`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub low: f64,
    /// Upper bound.
    pub high: f64,
    /// Confidence level in (0, 1).
    pub level: f64,
}

/// BCa adjustment terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BcaAdjustment {
    /// Bias correction z₀.
    pub bias_correction: f64,
    /// Acceleration a.
    pub acceleration: f64,
}

/// Percentile interval: quantiles at `α/2` and `1 − α/2`, `α = 1 − level`.
///
/// # Returns
///
/// `None` if `values` is empty or contains NaN.
///
/// # Examples
///
/// ```
/// use u_reliability::bootstrap::percentile_interval;
///
/// let values: Vec<f64> = (0..=100).map(|i| i as f64).collect();
/// let ci = percentile_interval(&values, 0.9).unwrap();
/// assert!((ci.low - 5.0).abs() < 1e-9);
/// assert!((ci.high - 95.0).abs() < 1e-9);
/// ```
pub fn percentile_interval(values: &[f64], level: f64) -> Option<ConfidenceInterval> {
    let tail = 1.0 - level;
    interval_at(values, tail / 2.0, 1.0 - tail / 2.0, level)
}

/// Bias-corrected and accelerated (BCa) interval.
///
/// # Algorithm
///
/// 1. z₀ = Φ⁻¹((#{θ* < θ̂} + ½·#{θ* = θ̂}) / B), with the proportion
///    clamped to [1/(2B), 1 − 1/(2B)]
/// 2. a = Σ(θ̄ − θ₍ᵢ₎)³ / (6·(Σ(θ̄ − θ₍ᵢ₎)²)^{3/2}) over the jackknife values
/// 3. For z = Φ⁻¹(α/2) and Φ⁻¹(1 − α/2), read the quantile at
///    Φ(z₀ + (z₀ + z) / (1 − a(z₀ + z)))
///
/// Undefined jackknife values are skipped; with fewer than two defined, or
/// no spread among them, a = 0.
///
/// # Returns
///
/// `None` if `values` is empty or contains NaN, or `estimate` is not
/// finite.
///
/// # References
///
/// Efron (1987). "Better bootstrap confidence intervals". Journal of the
/// American Statistical Association, 82(397), 171–185.
pub fn bca_interval(
    values: &[f64],
    estimate: f64,
    jackknife: &[Option<f64>],
    level: f64,
) -> Option<(ConfidenceInterval, BcaAdjustment)> {
    if values.is_empty() || !estimate.is_finite() {
        return None;
    }
    let z0 = bias_correction(values, estimate);
    let a = acceleration(jackknife);

    let tail = 1.0 - level;
    let adjust = |z: f64| -> f64 {
        let shifted = z0 + z;
        let denom = 1.0 - a * shifted;
        let arg = z0 + shifted / denom;
        if arg.is_nan() {
            special::standard_normal_cdf(z)
        } else if arg == f64::INFINITY {
            1.0
        } else if arg == f64::NEG_INFINITY {
            0.0
        } else {
            special::standard_normal_cdf(arg).clamp(0.0, 1.0)
        }
    };
    let p_low = adjust(special::inverse_normal_cdf(tail / 2.0));
    let p_high = adjust(special::inverse_normal_cdf(1.0 - tail / 2.0));

    let ci = interval_at(values, p_low, p_high, level)?;
    Some((
        ci,
        BcaAdjustment {
            bias_correction: z0,
            acceleration: a,
        },
    ))
}

fn bias_correction(values: &[f64], estimate: f64) -> f64 {
    let b = values.len() as f64;
    let below = values.iter().filter(|&&v| v < estimate).count() as f64;
    let ties = values.iter().filter(|&&v| v == estimate).count() as f64;
    let bound = 1.0 / (2.0 * b);
    let p = ((below + 0.5 * ties) / b).clamp(bound, 1.0 - bound);
    special::inverse_normal_cdf(p)
}

fn acceleration(jackknife: &[Option<f64>]) -> f64 {
    let defined: Vec<f64> = jackknife.iter().flatten().copied().collect();
    let Some(mean) = (defined.len() >= 2).then(|| stats::mean(&defined)).flatten() else {
        return 0.0;
    };
    let (num, den) = defined.iter().fold((0.0, 0.0), |(num, den), &t| {
        let d = mean - t;
        (num + d * d * d, den + d * d)
    });
    if den < 1e-300 {
        return 0.0;
    }
    num / (6.0 * den.powf(1.5))
}

fn interval_at(values: &[f64], p_low: f64, p_high: f64, level: f64) -> Option<ConfidenceInterval> {
    let low = stats::quantile(values, p_low.clamp(0.0, 1.0))?;
    let high = stats::quantile(values, p_high.clamp(0.0, 1.0))?;
    Some(ConfidenceInterval {
        low: low.min(high),
        high: low.max(high),
        level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        (0..=100).map(|i| i as f64 / 100.0).collect()
    }

    #[test]
    fn percentile_95() {
        let ci = percentile_interval(&grid(), 0.95).expect("defined");
        assert!((ci.low - 0.025).abs() < 1e-12);
        assert!((ci.high - 0.975).abs() < 1e-12);
        assert_eq!(ci.level, 0.95);
    }

    #[test]
    fn percentile_single_value() {
        let ci = percentile_interval(&[0.7], 0.95).expect("defined");
        assert_eq!(ci.low, 0.7);
        assert_eq!(ci.high, 0.7);
        assert!(percentile_interval(&[], 0.95).is_none());
    }

    #[test]
    fn bca_reduces_to_percentile_without_bias_or_skew() {
        // Estimate at the median, symmetric jackknife: z0 = 0, a = 0.
        let values = grid();
        let jack = [Some(0.4), Some(0.5), Some(0.6)];
        let (ci, adj) = bca_interval(&values, 0.5, &jack, 0.95).expect("defined");
        assert!(adj.bias_correction.abs() < 1e-6, "z0 = {}", adj.bias_correction);
        assert!(adj.acceleration.abs() < 1e-12);
        let pct = percentile_interval(&values, 0.95).expect("defined");
        assert!((ci.low - pct.low).abs() < 1e-4);
        assert!((ci.high - pct.high).abs() < 1e-4);
    }

    #[test]
    fn bca_shifts_toward_estimate() {
        // Most resamples below the estimate: z0 > 0 pushes both bounds up.
        let values = grid();
        let (ci, adj) = bca_interval(&values, 0.8, &[], 0.9).expect("defined");
        assert!(adj.bias_correction > 0.5);
        let pct = percentile_interval(&values, 0.9).expect("defined");
        assert!(ci.low > pct.low);
        assert!(ci.high >= pct.high);
    }

    #[test]
    fn bias_correction_is_clamped() {
        let values = [0.1, 0.2, 0.3, 0.4];
        let z0 = bias_correction(&values, 10.0);
        let expected = special::inverse_normal_cdf(1.0 - 1.0 / 8.0);
        assert!((z0 - expected).abs() < 1e-12);
        assert!(z0.is_finite());
    }

    #[test]
    fn acceleration_sign_follows_skew() {
        // A single low jackknife outlier makes θ̄ − θ₍ᵢ₎ strongly positive
        // for that entry.
        let a = acceleration(&[Some(0.8), Some(0.8), Some(0.8), Some(0.2)]);
        assert!(a > 0.0);
        assert_eq!(acceleration(&[Some(0.5), None]), 0.0);
        assert_eq!(acceleration(&[Some(0.5), Some(0.5)]), 0.0);
    }

    #[test]
    fn undefined_estimate_rejected() {
        assert!(bca_interval(&grid(), f64::NAN, &[], 0.95).is_none());
    }
}
