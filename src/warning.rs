//! Non-fatal diagnostic conditions.
//!
//! Warnings are values attached to a successful result, in the order they
//! were detected: validation warnings first (by item), then those raised
//! while computing item diagnostics, normality, and the bootstrap.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A non-fatal condition noticed during analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// Item has zero sample variance (or fewer than two observed values).
    ZeroVariance {
        /// Item name.
        item: String,
    },
    /// Item contains missing values.
    MissingValues {
        /// Item name.
        item: String,
        /// Number of missing cells.
        count: usize,
    },
    /// Item contains negative values.
    NegativeValues {
        /// Item name.
        item: String,
        /// Number of negative cells.
        count: usize,
    },
    /// Alpha with this item removed could not be computed.
    AlphaIfDeletedUndefined {
        /// Item name.
        item: String,
        /// Why the reduced alpha is undefined.
        reason: String,
    },
    /// Item correlates negatively with the sum of the other items, which
    /// usually means it should be reverse-keyed.
    NegativeItemTotal {
        /// Item name.
        item: String,
        /// Corrected item-total correlation.
        correlation: f64,
    },
    /// No pair of items has a defined correlation, so the mean inter-item
    /// correlation and standardized alpha are `NaN`.
    UndefinedInterItemCorrelation,
    /// Mardia's statistics were skipped.
    SingularCovariance {
        /// Estimated condition number; infinite (`null` once serialized)
        /// when it could not be computed.
        #[serde(with = "crate::float_serde::nullable")]
        condition: f64,
    },
    /// Some bootstrap resamples were dropped as degenerate.
    DegenerateResamples {
        /// Resamples dropped.
        excluded: usize,
        /// Resamples drawn.
        attempted: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroVariance { item } => write!(f, "item '{item}' has zero variance"),
            Self::MissingValues { item, count } => {
                write!(f, "item '{item}' has {count} missing value(s)")
            }
            Self::NegativeValues { item, count } => {
                write!(f, "item '{item}' has {count} negative value(s)")
            }
            Self::AlphaIfDeletedUndefined { item, reason } => {
                write!(f, "alpha if '{item}' deleted is undefined: {reason}")
            }
            Self::NegativeItemTotal { item, correlation } => write!(
                f,
                "item '{item}' correlates negatively with the rest score (r = {correlation:.3}); \
                 it may need reverse keying"
            ),
            Self::UndefinedInterItemCorrelation => write!(
                f,
                "no inter-item correlation is defined; standardized alpha is undefined"
            ),
            Self::SingularCovariance { condition } => write!(
                f,
                "covariance matrix is singular (condition {condition:e}); Mardia statistics skipped"
            ),
            Self::DegenerateResamples {
                excluded,
                attempted,
            } => write!(
                f,
                "{excluded} of {attempted} bootstrap resamples were degenerate and excluded"
            ),
        }
    }
}
