//! Cronbach's alpha.
//!
//! Raw alpha comes from the variance decomposition of the item sum;
//! standardized alpha from the mean inter-item correlation.
//!
//! ```text
//! raw          = k/(k-1) · (1 − Σ s²ᵢ / s²_total)
//! standardized = k·r̄ / (1 + (k-1)·r̄)
//! ```
//!
//! [`raw_alpha`] is the one place the variance formula and its
//! missing-data policy live; item deletion and the bootstrap call it on
//! reduced or resampled matrices.
//!
//! # Examples
//!
//! ```
//! use u_reliability::alpha::{alpha, MissingDataPolicy};
//! use u_reliability::matrix::ItemMatrix;
//!
//! let m = ItemMatrix::from_columns(vec![
//!     vec![5.0, 4.0, 3.0, 2.0],
//!     vec![4.0, 3.0, 2.0, 1.0],
//!     vec![5.0, 4.0, 3.0, 2.0],
//! ])
//! .unwrap();
//! let a = alpha(&m, MissingDataPolicy::Listwise).unwrap();
//! assert!((a.raw_alpha - 1.0).abs() < 1e-6);
//! assert!((a.standardized_alpha - 1.0).abs() < 1e-6);
//! ```
//!
//! # References
//!
//! Cronbach (1951). "Coefficient alpha and the internal structure of
//! tests". Psychometrika, 16(3), 297–334.

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use crate::correlation::{correlate, CorrelationMatrix};
use crate::error::{AlphaError, DegenerateKind};
use crate::items;
use crate::matrix::ItemMatrix;

/// How missing values enter the raw-alpha variance terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataPolicy {
    /// Item and total variances both use only rows where every item is
    /// present.
    #[default]
    Listwise,
    /// Item variances use each item's own observed values; the total
    /// variance uses complete rows. The two can disagree when missingness
    /// differs between items.
    Mixed,
}

/// The alpha coefficients of one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaCoefficients {
    /// Variance-based alpha.
    pub raw_alpha: f64,
    /// Correlation-based alpha.
    #[serde(with = "crate::float_serde::nullable")]
    pub standardized_alpha: f64,
    /// Mean defined off-diagonal correlation (r̄).
    #[serde(with = "crate::float_serde::nullable")]
    pub average_inter_item_correlation: f64,
    /// Items in the matrix (k).
    pub n_items: usize,
    /// Complete rows behind the total score.
    pub n_complete: usize,
}

/// Alpha coefficients plus alpha with each item removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaResult {
    /// Variance-based alpha.
    pub raw_alpha: f64,
    /// Correlation-based alpha.
    #[serde(with = "crate::float_serde::nullable")]
    pub standardized_alpha: f64,
    /// Mean defined off-diagonal correlation (r̄).
    #[serde(with = "crate::float_serde::nullable")]
    pub average_inter_item_correlation: f64,
    /// Raw alpha of the matrix without item *i*; `None` where undefined.
    pub alpha_if_item_deleted: Vec<Option<f64>>,
    /// Items in the matrix (k).
    pub n_items: usize,
    /// Complete rows behind the total score.
    pub n_complete: usize,
    /// Policy used for the variance terms.
    pub missing_policy: MissingDataPolicy,
}

// ---------------------------------------------------------------------------
// Raw alpha
// ---------------------------------------------------------------------------

/// Raw (variance-based) alpha.
///
/// Sample variances with an n-1 denominator. The total score is summed
/// over rows where all items are present; item variances follow `policy`.
///
/// # Errors
///
/// - [`AlphaError::InsufficientItems`] if k < 2
/// - [`AlphaError::DegenerateVariance`] if fewer than two complete rows
///   exist, an item variance cannot be estimated, or the total variance is
///   zero
pub fn raw_alpha(matrix: &ItemMatrix, policy: MissingDataPolicy) -> Result<f64, AlphaError> {
    raw_alpha_parts(matrix, policy).map(|(alpha, _)| alpha)
}

fn raw_alpha_parts(
    matrix: &ItemMatrix,
    policy: MissingDataPolicy,
) -> Result<(f64, usize), AlphaError> {
    let k = matrix.n_items();
    if k < 2 {
        return Err(AlphaError::InsufficientItems { found: k });
    }

    let complete = matrix.complete_rows();
    let total: Vec<f64> = {
        let sums = matrix.row_sums(None);
        complete.iter().map(|&r| sums[r]).collect()
    };
    if total.len() < 2 {
        return Err(AlphaError::DegenerateVariance(DegenerateKind::TotalVariance));
    }

    let mut sum_item_var = 0.0;
    for j in 0..k {
        let values: Vec<f64> = match policy {
            MissingDataPolicy::Listwise => complete.iter().map(|&r| matrix.column(j)[r]).collect(),
            MissingDataPolicy::Mixed => matrix.observed(j),
        };
        let var = stats::variance(&values)
            .ok_or(AlphaError::DegenerateVariance(DegenerateKind::ItemVariance { item: j }))?;
        sum_item_var += var;
    }

    let total_var = stats::variance(&total)
        .ok_or(AlphaError::DegenerateVariance(DegenerateKind::TotalVariance))?;

    // Exact cancellation of item scores can leave round-off instead of 0.
    if total_var <= 1e-300 || total_var <= 1e-14 * sum_item_var {
        return Err(AlphaError::DegenerateVariance(DegenerateKind::TotalVariance));
    }

    let kf = k as f64;
    let alpha = (kf / (kf - 1.0)) * (1.0 - sum_item_var / total_var);
    Ok((alpha, complete.len()))
}

// ---------------------------------------------------------------------------
// Standardized alpha
// ---------------------------------------------------------------------------

/// Standardized alpha from a correlation matrix: `k·r̄ / (1 + (k-1)·r̄)`.
///
/// # Returns
///
/// `(alpha, r̄)`. Both are `NaN` when no off-diagonal correlation is
/// defined (e.g. k = 2 with one constant item).
///
/// # Errors
///
/// - [`AlphaError::InsufficientItems`] if the matrix has fewer than 2 items
/// - [`AlphaError::DegenerateVariance`] if the denominator is zero
pub fn standardized_alpha(corr: &CorrelationMatrix) -> Result<(f64, f64), AlphaError> {
    let k = corr.size();
    if k < 2 {
        return Err(AlphaError::InsufficientItems { found: k });
    }
    let Some(r_bar) = corr.mean_off_diagonal() else {
        return Ok((f64::NAN, f64::NAN));
    };

    let kf = k as f64;
    let denom = 1.0 + (kf - 1.0) * r_bar;
    if denom.abs() < 1e-12 {
        return Err(AlphaError::DegenerateVariance(DegenerateKind::StandardizedDenominator));
    }
    Ok((kf * r_bar / denom, r_bar))
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Raw and standardized alpha of `matrix`.
pub fn coefficients(
    matrix: &ItemMatrix,
    policy: MissingDataPolicy,
) -> Result<AlphaCoefficients, AlphaError> {
    coefficients_with(matrix, &correlate(matrix), policy)
}

/// As [`coefficients`], reusing an already computed correlation matrix of
/// the same items.
pub fn coefficients_with(
    matrix: &ItemMatrix,
    corr: &CorrelationMatrix,
    policy: MissingDataPolicy,
) -> Result<AlphaCoefficients, AlphaError> {
    let (raw, n_complete) = raw_alpha_parts(matrix, policy)?;
    let (standardized, r_bar) = standardized_alpha(corr)?;
    Ok(AlphaCoefficients {
        raw_alpha: raw,
        standardized_alpha: standardized,
        average_inter_item_correlation: r_bar,
        n_items: matrix.n_items(),
        n_complete,
    })
}

/// Full alpha result, including alpha-if-item-deleted.
///
/// Per-item deletion failures are reported as `None` entries rather than
/// failing the whole call.
pub fn alpha(matrix: &ItemMatrix, policy: MissingDataPolicy) -> Result<AlphaResult, AlphaError> {
    let c = coefficients(matrix, policy)?;
    let deleted = items::alpha_if_item_deleted(matrix, policy);
    Ok(AlphaResult::from_parts(c, &deleted, policy))
}

impl AlphaResult {
    pub(crate) fn from_parts(
        c: AlphaCoefficients,
        alpha_if_item_deleted: &[Result<f64, AlphaError>],
        policy: MissingDataPolicy,
    ) -> Self {
        Self {
            raw_alpha: c.raw_alpha,
            standardized_alpha: c.standardized_alpha,
            average_inter_item_correlation: c.average_inter_item_correlation,
            alpha_if_item_deleted: alpha_if_item_deleted.iter().map(|r| r.ok()).collect(),
            n_items: c.n_items,
            n_complete: c.n_complete,
            missing_policy: policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MISSING;

    fn items(columns: Vec<Vec<f64>>) -> ItemMatrix {
        ItemMatrix::from_columns(columns).expect("rectangular")
    }

    fn survey() -> ItemMatrix {
        items(vec![
            vec![4.0, 3.0, 5.0, 2.0],
            vec![3.0, 4.0, 2.0, 5.0],
            vec![5.0, 4.0, 3.0, 4.0],
        ])
    }

    #[test]
    fn perfect_correlation_is_one() {
        let m = items(vec![
            vec![5.0, 4.0, 3.0, 2.0],
            vec![4.0, 3.0, 2.0, 1.0],
            vec![5.0, 4.0, 3.0, 2.0],
        ]);
        let c = coefficients(&m, MissingDataPolicy::Listwise).expect("should compute");
        assert!((c.raw_alpha - 1.0).abs() < 1e-6, "raw = {}", c.raw_alpha);
        assert!((c.standardized_alpha - 1.0).abs() < 1e-6);
        assert!((c.average_inter_item_correlation - 1.0).abs() < 1e-10);
        assert_eq!(c.n_items, 3);
        assert_eq!(c.n_complete, 4);
    }

    #[test]
    fn known_negative_alpha() {
        // Σ s²ᵢ = 4, s²_total = 2/3 → 1.5 · (1 − 6) = −7.5
        let c = coefficients(&survey(), MissingDataPolicy::Listwise).expect("should compute");
        assert!((c.raw_alpha + 7.5).abs() < 1e-10, "raw = {}", c.raw_alpha);
        // r̄ = −1/3 → 3·(−1/3) / (1 − 2/3) = −3
        assert!((c.average_inter_item_correlation + 1.0 / 3.0).abs() < 1e-10);
        assert!((c.standardized_alpha + 3.0).abs() < 1e-10);
    }

    #[test]
    fn deterministic_bits() {
        let m = survey();
        let a = alpha(&m, MissingDataPolicy::Listwise).expect("should compute");
        let b = alpha(&m, MissingDataPolicy::Listwise).expect("should compute");
        assert_eq!(a.raw_alpha.to_bits(), b.raw_alpha.to_bits());
        assert_eq!(a.standardized_alpha.to_bits(), b.standardized_alpha.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn one_item_is_insufficient() {
        let m = items(vec![vec![1.0, 2.0, 3.0]]);
        assert_eq!(
            raw_alpha(&m, MissingDataPolicy::Listwise),
            Err(AlphaError::InsufficientItems { found: 1 })
        );
    }

    #[test]
    fn constant_total_is_degenerate() {
        let m = items(vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]]);
        assert_eq!(
            raw_alpha(&m, MissingDataPolicy::Listwise),
            Err(AlphaError::DegenerateVariance(DegenerateKind::TotalVariance))
        );
    }

    #[test]
    fn standardized_denominator_zero_is_degenerate() {
        // k = 2, r = −1 → 1 + r̄ = 0
        let m = items(vec![vec![1.0, 2.0, 3.0, 4.0], vec![4.0, 3.0, 2.0, 1.0]]);
        assert_eq!(
            standardized_alpha(&correlate(&m)),
            Err(AlphaError::DegenerateVariance(DegenerateKind::StandardizedDenominator))
        );
    }

    #[test]
    fn too_few_complete_rows_is_degenerate() {
        let m = items(vec![
            vec![1.0, MISSING, 3.0],
            vec![MISSING, 2.0, 3.0],
            vec![1.0, 2.0, 3.0],
        ]);
        assert_eq!(
            raw_alpha(&m, MissingDataPolicy::Listwise),
            Err(AlphaError::DegenerateVariance(DegenerateKind::TotalVariance))
        );
    }

    #[test]
    fn zero_variance_item_still_computes() {
        let m = items(vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![2.0, 2.0, 2.0, 2.0, 2.0],
            vec![1.0, 3.0, 2.0, 5.0, 4.0],
        ]);
        let c = coefficients(&m, MissingDataPolicy::Listwise).expect("should compute");
        assert!(c.raw_alpha.is_finite());
        // only the (0, 2) pair is defined
        let r02 = correlate(&m).get(0, 2);
        assert!((c.average_inter_item_correlation - r02).abs() < 1e-12);
    }

    #[test]
    fn undefined_mean_correlation_leaves_standardized_nan() {
        // k = 2 with a constant item: no defined pair, raw alpha still exists.
        let m = items(vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0; 4]]);
        let (std_alpha, r_bar) = standardized_alpha(&correlate(&m)).expect("not an error");
        assert!(std_alpha.is_nan());
        assert!(r_bar.is_nan());
        let c = coefficients(&m, MissingDataPolicy::Listwise).expect("should compute");
        assert!(c.raw_alpha.abs() < 1e-12, "raw = {}", c.raw_alpha);
        assert!(c.standardized_alpha.is_nan());
    }

    #[test]
    fn policies_agree_without_missing_data() {
        let m = survey();
        let a = raw_alpha(&m, MissingDataPolicy::Listwise).expect("should compute");
        let b = raw_alpha(&m, MissingDataPolicy::Mixed).expect("should compute");
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn policies_diverge_with_uneven_missingness() {
        let m = items(vec![
            vec![4.0, 3.0, 5.0, 2.0, 4.0, 1.0],
            vec![3.0, 4.0, 2.0, 5.0, 3.0, MISSING],
            vec![5.0, 4.0, 3.0, 4.0, 5.0, 2.0],
        ]);
        let listwise = raw_alpha(&m, MissingDataPolicy::Listwise).expect("should compute");
        let mixed = raw_alpha(&m, MissingDataPolicy::Mixed).expect("should compute");
        assert!((listwise - mixed).abs() > 1e-6);

        // Listwise equals alpha on the explicitly reduced matrix.
        let reduced = raw_alpha(&m.listwise(), MissingDataPolicy::Listwise).expect("should compute");
        assert_eq!(listwise.to_bits(), reduced.to_bits());
    }

    #[test]
    fn alpha_if_deleted_matches_submatrix() {
        let m = survey();
        let a = alpha(&m, MissingDataPolicy::Listwise).expect("should compute");
        assert_eq!(a.alpha_if_item_deleted.len(), 3);
        for i in 0..3 {
            let direct = raw_alpha(&m.without_item(i), MissingDataPolicy::Listwise).ok();
            assert_eq!(a.alpha_if_item_deleted[i], direct, "item {i}");
        }
        // Items 1 and 2 sum to a constant, so dropping item 3 is undefined.
        assert_eq!(a.alpha_if_item_deleted[2], None);
        let a0 = a.alpha_if_item_deleted[0].expect("defined");
        assert!((a0 - 4.0 / 9.0).abs() < 1e-10);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn raw_alpha_at_most_one(
            cols in (2_usize..6, 3_usize..25).prop_flat_map(|(k, n)| {
                proptest::collection::vec(proptest::collection::vec(-50.0_f64..50.0, n..=n), k..=k)
            })
        ) {
            let m = ItemMatrix::from_columns(cols).expect("rectangular");
            if let Ok(a) = raw_alpha(&m, MissingDataPolicy::Listwise) {
                prop_assert!(a <= 1.0 + 1e-9, "alpha = {}", a);
            }
        }
    }
}
