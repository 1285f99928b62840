//! Error taxonomy.
//!
//! Each engine reports its own failure type; [`ReliabilityError`] wraps
//! them for [`analyze`](crate::analysis::analyze). Conditions that are
//! merely noteworthy are not errors; they travel as
//! [`Warning`](crate::warning::Warning) values on the result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal shape or content problems found before any computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Fewer than two observations.
    #[error("too few rows: need at least 2 observations, found {rows}")]
    TooFewRows {
        /// Observed row count.
        rows: usize,
    },

    /// Fewer than two items.
    #[error("too few columns: need at least 2 items, found {columns}")]
    TooFewColumns {
        /// Observed column count.
        columns: usize,
    },

    /// A cell is neither numeric nor the missing marker.
    #[error("non-numeric value in item '{item}' at row {row}")]
    NonNumericData {
        /// Item name.
        item: String,
        /// Zero-based row index.
        row: usize,
    },

    /// Columns of unequal length.
    #[error("item '{item}' has {found} rows, expected {expected}")]
    RaggedColumns {
        /// Item name.
        item: String,
        /// Row count of the first item.
        expected: usize,
        /// Row count of this item.
        found: usize,
    },
}

/// Which quantity made an alpha computation undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegenerateKind {
    /// Total-score variance is zero or cannot be estimated.
    TotalVariance,
    /// An item variance cannot be estimated (fewer than two values).
    ItemVariance {
        /// Zero-based item index.
        item: usize,
    },
    /// `1 + (k - 1)·r̄` is zero.
    StandardizedDenominator,
}

impl std::fmt::Display for DegenerateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalVariance => write!(f, "total-score variance is zero or undefined"),
            Self::ItemVariance { item } => write!(f, "variance of item {item} is undefined"),
            Self::StandardizedDenominator => {
                write!(f, "standardized alpha denominator is zero")
            }
        }
    }
}

/// Failure of a single alpha computation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum AlphaError {
    /// Alpha needs at least two items.
    #[error("insufficient items: alpha needs at least 2, found {found}")]
    InsufficientItems {
        /// Item count supplied.
        found: usize,
    },

    /// A variance term made the coefficient undefined.
    #[error("degenerate variance: {0}")]
    DegenerateVariance(DegenerateKind),
}

/// Failure of the multivariate normality step.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NormalityError {
    /// The sample covariance matrix could not be inverted reliably.
    ///
    /// `condition` is the 1-norm condition number when it could be
    /// computed, otherwise infinite.
    #[error("singular covariance matrix (condition number {condition:e})")]
    SingularCovariance {
        /// Estimated condition number.
        condition: f64,
    },
}

/// Failure of the bootstrap procedure as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BootstrapError {
    /// Resample count or confidence level out of range.
    #[error("invalid bootstrap configuration: {0}")]
    InvalidConfig(String),

    /// Every resample was degenerate.
    #[error("no usable resamples: all {attempted} resamples were degenerate")]
    NoUsableResamples {
        /// Resamples drawn.
        attempted: usize,
    },

    /// The full-sample statistic needed by BCa is undefined.
    #[error("full-sample alpha undefined: {0}")]
    Alpha(#[from] AlphaError),
}

/// Any failure surfaced by [`analyze`](crate::analysis::analyze).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReliabilityError {
    /// Configuration rejected before computation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input matrix rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Core alpha computation failed.
    #[error(transparent)]
    Alpha(#[from] AlphaError),

    /// Multivariate normality failed where it was not tolerated.
    #[error(transparent)]
    Normality(#[from] NormalityError),

    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}
