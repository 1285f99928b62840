//! Normality diagnostics.
//!
//! Per item, the Shapiro-Wilk W statistic with Royston's p-value
//! approximation. Over the whole matrix, Mardia's multivariate skewness
//! and kurtosis.
//!
//! Both are approximations: W uses Royston's polynomial fit of the
//! coefficients rather than exact expected order statistics, and Mardia's
//! tests use their large-sample reference distributions.
//!
//! # Examples
//!
//! ```
//! use u_reliability::normality::shapiro_wilk;
//!
//! let data = [-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5];
//! let r = shapiro_wilk(&data).unwrap();
//! assert!(r.w > 0.9);
//! assert!(r.p_value > 0.05);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use u_numflow::matrix::Matrix;
use u_numflow::special;

use crate::error::NormalityError;
use crate::matrix::ItemMatrix;

/// Condition number above which the covariance matrix counts as singular.
pub const MAX_CONDITION_NUMBER: f64 = 1e12;

/// Shapiro-Wilk result for one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapiroWilk {
    /// W statistic in (0, 1]. Values near 1 are consistent with normality.
    pub w: f64,
    /// Approximate p-value; small values reject normality.
    pub p_value: f64,
    /// Observations used.
    pub n: usize,
}

/// Mardia's multivariate skewness and kurtosis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MardiaResult {
    /// b₁,ₚ = Σₐ Σ_b (xₐᵀ S⁻¹ x_b)³ / n².
    pub skewness: f64,
    /// b₂,ₚ = Σₐ (xₐᵀ S⁻¹ xₐ)² / n.
    pub kurtosis: f64,
    /// n·b₁/6, asymptotically χ² with k(k+1)(k+2)/6 degrees of freedom.
    pub skewness_statistic: f64,
    /// Upper-tail p-value of the skewness statistic.
    pub skewness_p_value: f64,
    /// (b₂ − k(k+2)) / √(8k(k+2)/n), asymptotically standard normal.
    pub kurtosis_statistic: f64,
    /// Two-sided p-value of the kurtosis statistic.
    pub kurtosis_p_value: f64,
    /// Complete rows used.
    pub n: usize,
}

/// Univariate and multivariate normality of an item matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityResult {
    /// Shapiro-Wilk per item; `None` where the test does not apply.
    pub per_item: Vec<Option<ShapiroWilk>>,
    /// Mardia's statistics; `None` when skipped.
    pub mardia: Option<MardiaResult>,
}

/// Runs both diagnostics.
///
/// # Errors
///
/// [`NormalityError::SingularCovariance`] if Mardia's statistics cannot be
/// computed. Use [`univariate`] and [`mardia`] separately to keep the
/// per-item results in that case.
pub fn normality(matrix: &ItemMatrix) -> Result<NormalityResult, NormalityError> {
    let per_item = univariate(matrix);
    let mardia = mardia(matrix)?;
    Ok(NormalityResult {
        per_item,
        mardia: Some(mardia),
    })
}

/// Shapiro-Wilk on each item's observed values.
pub fn univariate(matrix: &ItemMatrix) -> Vec<Option<ShapiroWilk>> {
    (0..matrix.n_items())
        .map(|j| shapiro_wilk(&matrix.observed(j)))
        .collect()
}

// ---------------------------------------------------------------------------
// Shapiro-Wilk
// ---------------------------------------------------------------------------

/// Shapiro-Wilk W test: H₀: data is normally distributed.
///
/// # Algorithm
///
/// Royston (1992, 1995), AS R94:
/// 1. Blom scores mᵢ = Φ⁻¹((i − 3/8) / (n + 1/4)) approximate the expected
///    normal order statistics
/// 2. The outermost one or two coefficients get Royston's polynomial
///    correction, the rest are mᵢ rescaled
/// 3. W = (Σ aᵢ x₍ᵢ₎)² / Σ (xᵢ − x̄)²
/// 4. ln(1 − W) is mapped to a standard normal score (log-normal fit for
///    n ≥ 12, gamma-log fit for 4 ≤ n ≤ 11); n = 3 has an exact p-value
///
/// # Returns
///
/// `None` if n < 3, n > 5000, all values equal, or any value is
/// non-finite.
///
/// # References
///
/// - Shapiro & Wilk (1965). "An analysis of variance test for normality".
///   Biometrika, 52(3–4), 591–611.
/// - Royston (1992). "Approximating the Shapiro-Wilk W-test for
///   non-normality". Statistics and Computing, 2, 117–119.
/// - Royston (1995). "Remark AS R94: A remark on Algorithm AS 181".
///   Applied Statistics, 44(4), 547–551.
pub fn shapiro_wilk(data: &[f64]) -> Option<ShapiroWilk> {
    let n = data.len();
    if !(3..=5000).contains(&n) || data.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut x = data.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    if x[n - 1] - x[0] < 1e-300 {
        return None;
    }

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
    if ss < 1e-300 {
        return None;
    }

    if n == 3 {
        // a = (−√½, 0, √½); exact null distribution of W.
        let w = (0.5 * (x[2] - x[0]).powi(2) / ss).clamp(0.75, 1.0);
        let p = 1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos();
        return Some(ShapiroWilk {
            w,
            p_value: p.clamp(0.0, 1.0),
            n,
        });
    }

    let a = royston_coefficients(n)?;
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = numerator * numerator / ss;
    if !(0.0..=1.0 + 1e-10).contains(&w) {
        return None;
    }
    let w = w.min(1.0);

    Some(ShapiroWilk {
        w,
        p_value: royston_p_value(w, n).clamp(0.0, 1.0),
        n,
    })
}

// AS R94 polynomial coefficients, lowest order first.
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Upper-half coefficients a₁..a_{n/2} (positive, largest first).
fn royston_coefficients(n: usize) -> Option<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;

    // Blom scores for the upper half, largest first.
    let m: Vec<f64> = (0..half)
        .map(|i| -special::inverse_normal_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let u = 1.0 / nf.sqrt();

    let corrected = if n > 5 { 2 } else { 1 };
    let mut lead = Vec::with_capacity(corrected);
    lead.push(m[0] / ssumm2 + poly(&C1, u));
    if corrected == 2 {
        lead.push(m[1] / ssumm2 + poly(&C2, u));
    }

    let m_lead: f64 = m[..corrected].iter().map(|v| v * v).sum();
    let a_lead: f64 = lead.iter().map(|v| v * v).sum();
    let fac_sq = summ2 - 2.0 * m_lead;
    let rest = 1.0 - 2.0 * a_lead;
    if fac_sq <= 0.0 || rest <= 0.0 {
        return None;
    }
    let fac = (fac_sq / rest).sqrt();

    let mut a = lead;
    a.extend(m[corrected..].iter().map(|mi| mi / fac));
    Some(a)
}

fn royston_p_value(w: f64, n: usize) -> f64 {
    let y = 1.0 - w;
    if y <= 0.0 {
        return 1.0;
    }
    let y = y.ln();
    let nf = n as f64;

    let (z_input, mu, sigma) = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return 0.0;
        }
        (-(gamma - y).ln(), poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (y, poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    if sigma < 1e-300 {
        return 0.0;
    }
    1.0 - special::standard_normal_cdf((z_input - mu) / sigma)
}

// ---------------------------------------------------------------------------
// Mardia
// ---------------------------------------------------------------------------

/// Mardia's multivariate skewness and kurtosis over complete rows.
///
/// # Algorithm
///
/// 1. Keep rows with no missing item, centre each column on its mean
/// 2. S = sample covariance (n-1), inverted after a condition check
/// 3. gₐ_b = xₐᵀ S⁻¹ x_b for every pair of rows
/// 4. b₁ = Σ gₐ_b³ / n², b₂ = Σ gₐₐ² / n
///
/// # Errors
///
/// [`NormalityError::SingularCovariance`] if there are no more complete
/// rows than items, the covariance cannot be inverted, or its 1-norm
/// condition number exceeds [`MAX_CONDITION_NUMBER`].
///
/// # References
///
/// Mardia (1970). "Measures of multivariate skewness and kurtosis with
/// applications". Biometrika, 57(3), 519–530.
pub fn mardia(matrix: &ItemMatrix) -> Result<MardiaResult, NormalityError> {
    let data = matrix.listwise();
    let n = data.n_rows();
    let k = data.n_items();
    let singular = |condition: f64| NormalityError::SingularCovariance { condition };

    if k == 0 || n <= k {
        return Err(singular(f64::INFINITY));
    }

    let nf = n as f64;
    let means: Vec<f64> = (0..k)
        .map(|j| data.column(j).iter().sum::<f64>() / nf)
        .collect();
    let centred: Vec<Vec<f64>> = (0..n)
        .map(|r| (0..k).map(|j| data.column(j)[r] - means[j]).collect())
        .collect();

    let mut cov = vec![0.0; k * k];
    for row in &centred {
        for i in 0..k {
            for j in 0..k {
                cov[i * k + j] += row[i] * row[j];
            }
        }
    }
    for c in &mut cov {
        *c /= nf - 1.0;
    }

    let s = Matrix::new(k, k, cov).map_err(|_| singular(f64::INFINITY))?;
    let s_inv = s.inverse().map_err(|_| singular(f64::INFINITY))?;
    let condition = norm_1(&s, k) * norm_1(&s_inv, k);
    if !condition.is_finite() || condition > MAX_CONDITION_NUMBER {
        return Err(singular(condition));
    }

    // yₐ = S⁻¹ xₐ, so gₐ_b = x_b · yₐ.
    let projected: Vec<Vec<f64>> = centred
        .iter()
        .map(|x| {
            (0..k)
                .map(|i| (0..k).map(|j| s_inv.get(i, j) * x[j]).sum())
                .collect()
        })
        .collect();

    let mut b1 = 0.0;
    let mut b2 = 0.0;
    for (a, ya) in projected.iter().enumerate() {
        for (b, xb) in centred.iter().enumerate() {
            let g: f64 = xb.iter().zip(ya).map(|(p, q)| p * q).sum();
            b1 += g * g * g;
            if a == b {
                b2 += g * g;
            }
        }
    }
    b1 /= nf * nf;
    b2 /= nf;

    let kf = k as f64;
    let skew_df = kf * (kf + 1.0) * (kf + 2.0) / 6.0;
    let skewness_statistic = nf * b1 / 6.0;
    let skewness_p_value = (1.0 - special::chi_squared_cdf(skewness_statistic, skew_df)).clamp(0.0, 1.0);

    let expected_b2 = kf * (kf + 2.0);
    let kurtosis_statistic = (b2 - expected_b2) / (8.0 * expected_b2 / nf).sqrt();
    let kurtosis_p_value =
        (2.0 * (1.0 - special::standard_normal_cdf(kurtosis_statistic.abs()))).clamp(0.0, 1.0);

    debug!(n, k, condition, b1, b2, "computed Mardia statistics");

    Ok(MardiaResult {
        skewness: b1,
        kurtosis: b2,
        skewness_statistic,
        skewness_p_value,
        kurtosis_statistic,
        kurtosis_p_value,
        n,
    })
}

/// Maximum absolute column sum.
fn norm_1(m: &Matrix, k: usize) -> f64 {
    (0..k)
        .map(|j| (0..k).map(|i| m.get(i, j).abs()).sum::<f64>())
        .fold(0.0, f64::max)
}
