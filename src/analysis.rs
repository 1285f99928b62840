//! End-to-end reliability analysis.
//!
//! [`analyze`] runs the pipeline and gathers everything into one
//! [`AnalysisResult`]:
//!
//! 1. configuration and input validation
//! 2. pairwise correlation matrix
//! 3. raw and standardized alpha, alpha-if-item-deleted
//! 4. item statistics
//! 5. normality diagnostics (optional)
//! 6. bootstrap interval (optional)
//!
//! Validation failures, an undefined overall alpha, and a bootstrap with no
//! usable resample abort the run. Everything else that goes wrong is
//! recorded as a [`Warning`] and the run continues.
//!
//! # Examples
//!
//! ```
//! use u_reliability::analysis::analyze;
//! use u_reliability::config::AnalysisConfig;
//! use u_reliability::matrix::DataMatrix;
//!
//! let data = DataMatrix::from_numeric_columns(vec![
//!     vec![4.0, 3.0, 5.0, 2.0, 4.0, 3.0],
//!     vec![3.0, 3.0, 4.0, 2.0, 5.0, 2.0],
//!     vec![5.0, 2.0, 4.0, 3.0, 4.0, 3.0],
//! ])
//! .with_names(["q1", "q2", "q3"]);
//!
//! let result = analyze(&data, &AnalysisConfig::new().bootstrap(true).random_seed(1)).unwrap();
//! assert!(result.alpha.raw_alpha > 0.7);
//! assert!(result.bootstrap.is_some());
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alpha::{coefficients_with, AlphaResult};
use crate::bootstrap::{bootstrap, BootstrapResult};
use crate::config::AnalysisConfig;
use crate::correlation::{correlate, CorrelationMatrix};
use crate::error::{NormalityError, ReliabilityError};
use crate::items::{alpha_if_item_deleted, item_statistics, ItemStatistics};
use crate::matrix::DataMatrix;
use crate::normality::{mardia, univariate, NormalityResult};
use crate::validate::validate;
use crate::warning::Warning;

/// Everything one analysis produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Item names in column order.
    pub names: Vec<String>,
    /// Non-fatal conditions, in detection order.
    pub warnings: Vec<Warning>,
    /// Alpha coefficients and alpha-if-item-deleted.
    pub alpha: AlphaResult,
    /// Per-item statistics.
    pub item_statistics: Vec<ItemStatistics>,
    /// Pairwise inter-item correlations.
    pub correlation: CorrelationMatrix,
    /// Bootstrap interval, when requested.
    pub bootstrap: Option<BootstrapResult>,
    /// Normality diagnostics, when requested.
    pub normality: Option<NormalityResult>,
}

/// Runs a full reliability analysis of `data`.
///
/// # Errors
///
/// - [`ReliabilityError::InvalidConfig`] if `config` is out of range
/// - [`ReliabilityError::Validation`] if `data` is unusable
/// - [`ReliabilityError::Alpha`] if alpha of the full matrix is undefined
/// - [`ReliabilityError::Bootstrap`] if the bootstrap was requested and
///   failed
pub fn analyze(
    data: &DataMatrix,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, ReliabilityError> {
    config.validate()?;
    let (names, items, mut warnings) = validate(data)?.into_parts();
    let policy = config.missing_policy;
    debug!(
        items = items.n_items(),
        rows = items.n_rows(),
        ?policy,
        "validated input"
    );

    let correlation = correlate(&items);
    let coefficients = coefficients_with(&items, &correlation, policy)?;
    if coefficients.average_inter_item_correlation.is_nan() {
        warn!("no defined inter-item correlation; standardized alpha is undefined");
        warnings.push(Warning::UndefinedInterItemCorrelation);
    }

    let deleted = alpha_if_item_deleted(&items, policy);
    for (name, outcome) in names.iter().zip(&deleted) {
        if let Err(e) = outcome {
            warnings.push(Warning::AlphaIfDeletedUndefined {
                item: name.clone(),
                reason: e.to_string(),
            });
        }
    }
    let alpha = AlphaResult::from_parts(coefficients, &deleted, policy);

    let item_statistics = item_statistics(&names, &items);
    for s in &item_statistics {
        if s.corrected_item_total < 0.0 {
            warnings.push(Warning::NegativeItemTotal {
                item: s.name.clone(),
                correlation: s.corrected_item_total,
            });
        }
    }

    let normality = config.normality.then(|| {
        let per_item = univariate(&items);
        let mardia = match mardia(&items) {
            Ok(m) => Some(m),
            Err(NormalityError::SingularCovariance { condition }) => {
                warn!(condition, "covariance matrix is singular; skipping Mardia");
                warnings.push(Warning::SingularCovariance { condition });
                None
            }
        };
        NormalityResult { per_item, mardia }
    });

    let bootstrap = if config.bootstrap {
        let result = bootstrap(&items, &config.bootstrap_config(), policy)?;
        if result.excluded > 0 {
            warnings.push(Warning::DegenerateResamples {
                excluded: result.excluded,
                attempted: result.attempted(),
            });
        }
        Some(result)
    } else {
        None
    };

    info!(
        raw_alpha = alpha.raw_alpha,
        standardized_alpha = alpha.standardized_alpha,
        warnings = warnings.len(),
        "reliability analysis complete"
    );

    Ok(AnalysisResult {
        names,
        warnings,
        alpha,
        item_statistics,
        correlation,
        bootstrap,
        normality,
    })
}
