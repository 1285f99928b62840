//! Per-item diagnostics.
//!
//! Descriptive statistics, the corrected item-total correlation, and alpha
//! with each item removed.
//!
//! The corrected item-total correlation compares an item with the sum of
//! the *other* items (the rest score). Comparing it with the full total,
//! which contains the item itself, inflates the correlation; that
//! uncorrected figure is reported alongside for reference only.
//!
//! # Examples
//!
//! ```
//! use u_reliability::items::corrected_item_total;
//! use u_reliability::matrix::ItemMatrix;
//!
//! let m = ItemMatrix::from_columns(vec![
//!     vec![1.0, 2.0, 3.0, 4.0, 5.0],
//!     vec![2.0, 1.0, 4.0, 3.0, 5.0],
//!     vec![1.0, 3.0, 2.0, 5.0, 4.0],
//! ])
//! .unwrap();
//! let r = corrected_item_total(&m, 0).unwrap();
//! assert!(r > 0.5);
//! ```

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use crate::alpha::{raw_alpha, MissingDataPolicy};
use crate::correlation::pairwise_pearson;
use crate::error::AlphaError;
use crate::matrix::ItemMatrix;
use crate::validate::ValidatedMatrix;

/// Descriptive and discrimination statistics of one item.
///
/// Values that cannot be computed (too few observations, zero variance)
/// are `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStatistics {
    /// Item name.
    pub name: String,
    /// Non-missing observations.
    pub n: usize,
    /// Mean.
    #[serde(with = "crate::float_serde::nullable")]
    pub mean: f64,
    /// Sample standard deviation (n-1).
    #[serde(with = "crate::float_serde::nullable")]
    pub std_dev: f64,
    /// Smallest observed value.
    #[serde(with = "crate::float_serde::nullable")]
    pub min: f64,
    /// Largest observed value.
    #[serde(with = "crate::float_serde::nullable")]
    pub max: f64,
    /// Sample skewness.
    #[serde(with = "crate::float_serde::nullable")]
    pub skewness: f64,
    /// Excess kurtosis.
    #[serde(with = "crate::float_serde::nullable")]
    pub kurtosis: f64,
    /// Correlation with the sum of the other items.
    #[serde(with = "crate::float_serde::nullable")]
    pub corrected_item_total: f64,
    /// Correlation with the sum of all items, this one included.
    #[serde(with = "crate::float_serde::nullable")]
    pub item_total: f64,
}

/// Item statistics together with alpha-if-item-deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDiagnostics {
    /// One entry per item.
    pub statistics: Vec<ItemStatistics>,
    /// Raw alpha without each item, or the reason it is undefined.
    pub alpha_if_item_deleted: Vec<Result<f64, AlphaError>>,
}

/// Computes statistics and alpha-if-deleted for every item.
pub fn item_diagnostics(matrix: &ValidatedMatrix, policy: MissingDataPolicy) -> ItemDiagnostics {
    ItemDiagnostics {
        statistics: item_statistics(matrix.names(), matrix.items()),
        alpha_if_item_deleted: alpha_if_item_deleted(matrix.items(), policy),
    }
}

/// Computes [`ItemStatistics`] for every item.
///
/// `names` supplies item names by position; absent names fall back to
/// `item_<n>`.
pub fn item_statistics(names: &[String], matrix: &ItemMatrix) -> Vec<ItemStatistics> {
    let total = matrix.row_sums(None);
    (0..matrix.n_items())
        .map(|j| {
            let observed = matrix.observed(j);
            let name = names
                .get(j)
                .cloned()
                .unwrap_or_else(|| format!("item_{}", j + 1));
            ItemStatistics {
                name,
                n: observed.len(),
                mean: stats::mean(&observed).unwrap_or(f64::NAN),
                std_dev: stats::std_dev(&observed).unwrap_or(f64::NAN),
                min: stats::min(&observed).unwrap_or(f64::NAN),
                max: stats::max(&observed).unwrap_or(f64::NAN),
                skewness: stats::skewness(&observed).unwrap_or(f64::NAN),
                kurtosis: stats::kurtosis(&observed).unwrap_or(f64::NAN),
                corrected_item_total: corrected_item_total(matrix, j).unwrap_or(f64::NAN),
                item_total: pairwise_pearson(matrix.column(j), &total)
                    .map_or(f64::NAN, |p| p.r),
            }
        })
        .collect()
}

/// Correlation of item `j` with the rest score.
///
/// The rest score of a row is the sum of all items except `j`, defined
/// only where all of those items are present. Rows are then paired
/// pairwise-complete with item `j`.
///
/// # Returns
///
/// `None` if `j` is out of range, the matrix has fewer than 2 items, fewer
/// than 2 rows pair up, or either side is constant.
pub fn corrected_item_total(matrix: &ItemMatrix, j: usize) -> Option<f64> {
    if j >= matrix.n_items() || matrix.n_items() < 2 {
        return None;
    }
    let rest = matrix.row_sums(Some(j));
    pairwise_pearson(matrix.column(j), &rest).map(|p| p.r)
}

/// Raw alpha of the matrix with each item removed in turn.
///
/// Entry `i` is the result of [`raw_alpha`] on the matrix without item `i`;
/// with only two items every entry is
/// [`AlphaError::InsufficientItems`].
pub fn alpha_if_item_deleted(
    matrix: &ItemMatrix,
    policy: MissingDataPolicy,
) -> Vec<Result<f64, AlphaError>> {
    (0..matrix.n_items())
        .map(|i| raw_alpha(&matrix.without_item(i), policy))
        .collect()
}
