//! Inter-item correlation.
//!
//! Pearson correlation under the pairwise-complete policy: each pair of
//! items uses exactly the rows where both are observed, so different pairs
//! may rest on different subsets of observations.
//!
//! # Examples
//!
//! ```
//! use u_reliability::correlation::correlate;
//! use u_reliability::matrix::ItemMatrix;
//!
//! let m = ItemMatrix::from_columns(vec![
//!     vec![1.0, 2.0, 3.0, 4.0, 5.0],
//!     vec![2.0, 4.0, 6.0, 8.0, 10.0],
//!     vec![5.0, 4.0, 3.0, 2.0, 1.0],
//! ])
//! .unwrap();
//! let c = correlate(&m);
//! assert!((c.get(0, 1) - 1.0).abs() < 1e-10);
//! assert!((c.get(0, 2) + 1.0).abs() < 1e-10);
//! ```

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use crate::matrix::{is_missing, ItemMatrix};

/// Pearson correlation of one pair with the number of rows it used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseCorrelation {
    /// Correlation coefficient in [-1, 1].
    pub r: f64,
    /// Rows where both variables were observed.
    pub n: usize,
}

/// Symmetric K×K correlation matrix with unit diagonal.
///
/// Off-diagonal entries are `NaN` where the pair has fewer than two
/// overlapping observations or either side is constant over the overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    size: usize,
    #[serde(with = "crate::float_serde::nullable_vec")]
    values: Vec<f64>,
    pairwise_n: Vec<usize>,
}

impl CorrelationMatrix {
    /// Number of items (rows = columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Entry (i, j).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Overlapping observations behind entry (i, j). The diagonal reports
    /// the item's own non-missing count.
    pub fn pairwise_n(&self, i: usize, j: usize) -> usize {
        self.pairwise_n[i * self.size + j]
    }

    /// Rows of the matrix.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.values.chunks(self.size.max(1)).map(<[f64]>::to_vec).collect()
    }

    /// Mean of the defined off-diagonal entries.
    ///
    /// Computed as `(Σ entries − k) / (k² − k)` with undefined entries
    /// dropped from both the sum and the count. `None` when no off-diagonal
    /// entry is defined.
    pub fn mean_off_diagonal(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..self.size {
            for j in 0..self.size {
                if i == j {
                    continue;
                }
                let r = self.get(i, j);
                if !r.is_nan() {
                    sum += r;
                    count += 1;
                }
            }
        }
        (count > 0).then(|| sum / count as f64)
    }
}

// ---------------------------------------------------------------------------
// Pearson, pairwise-complete
// ---------------------------------------------------------------------------

/// Pearson correlation over the rows where both `x` and `y` are present.
///
/// # Algorithm
///
/// r = cov(x,y) / (σ_x · σ_y) on the overlap, sample (n-1) moments.
///
/// # Returns
///
/// `None` if the slices differ in length, fewer than 2 rows overlap, or
/// either variable is constant over the overlap.
///
/// # References
///
/// Pearson (1895). "Note on regression and inheritance in the case of
/// two parents". Proceedings of the Royal Society of London, 58, 240–242.
///
/// # Examples
///
/// ```
/// use u_reliability::correlation::pairwise_pearson;
///
/// let x = [1.0, 2.0, f64::NAN, 4.0];
/// let y = [2.0, 4.0, 6.0, 8.0];
/// let p = pairwise_pearson(&x, &y).unwrap();
/// assert_eq!(p.n, 3);
/// assert!((p.r - 1.0).abs() < 1e-10);
/// ```
pub fn pairwise_pearson(x: &[f64], y: &[f64]) -> Option<PairwiseCorrelation> {
    if x.len() != y.len() {
        return None;
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !is_missing(**a) && !is_missing(**b))
        .map(|(a, b)| (*a, *b))
        .unzip();

    let n = xs.len();
    if n < 2 {
        return None;
    }

    let cov = stats::covariance(&xs, &ys)?;
    let sx = stats::std_dev(&xs)?;
    let sy = stats::std_dev(&ys)?;

    if sx < 1e-300 || sy < 1e-300 {
        return None; // zero variance over the overlap
    }

    let r = (cov / (sx * sy)).clamp(-1.0, 1.0);
    Some(PairwiseCorrelation { r, n })
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Computes the pairwise-complete Pearson correlation matrix of all items.
///
/// Never fails: an undefined pair yields `NaN` in that cell only. The
/// diagonal is set to exactly 1.0 rather than computed.
pub fn correlate(matrix: &ItemMatrix) -> CorrelationMatrix {
    let k = matrix.n_items();
    let mut values = vec![0.0; k * k];
    let mut pairwise_n = vec![0; k * k];

    for i in 0..k {
        values[i * k + i] = 1.0;
        pairwise_n[i * k + i] = matrix.n_rows() - matrix.missing_count(i);
        for j in (i + 1)..k {
            let (r, n) = match pairwise_pearson(matrix.column(i), matrix.column(j)) {
                Some(p) => (p.r, p.n),
                None => (f64::NAN, overlap(matrix.column(i), matrix.column(j))),
            };
            values[i * k + j] = r;
            values[j * k + i] = r;
            pairwise_n[i * k + j] = n;
            pairwise_n[j * k + i] = n;
        }
    }

    CorrelationMatrix {
        size: k,
        values,
        pairwise_n,
    }
}

fn overlap(x: &[f64], y: &[f64]) -> usize {
    x.iter()
        .zip(y)
        .filter(|(a, b)| !is_missing(**a) && !is_missing(**b))
        .count()
}
