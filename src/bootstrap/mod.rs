//! Bootstrap confidence intervals for raw alpha.
//!
//! Rows are resampled with replacement, raw alpha is recomputed on each
//! resample, and the distribution of those alphas yields a percentile or
//! BCa interval.
//!
//! # Reproducibility
//!
//! With a seed, the result is a pure function of (matrix, config, policy):
//! each resample owns an RNG stream derived from the seed and its index,
//! so the `parallel` feature changes only how fast the answer arrives.
//!
//! # Examples
//!
//! ```
//! use u_reliability::alpha::MissingDataPolicy;
//! use u_reliability::bootstrap::{bootstrap, BootstrapConfig};
//! use u_reliability::matrix::ItemMatrix;
//!
//! let m = ItemMatrix::from_columns(vec![
//!     vec![4.0, 3.0, 5.0, 2.0, 4.0, 3.0, 5.0, 2.0],
//!     vec![3.0, 3.0, 4.0, 2.0, 5.0, 2.0, 4.0, 1.0],
//!     vec![5.0, 2.0, 4.0, 3.0, 4.0, 3.0, 5.0, 2.0],
//! ])
//! .unwrap();
//! let config = BootstrapConfig::default().with_resamples(200).with_seed(7);
//! let r = bootstrap(&m, &config, MissingDataPolicy::Listwise).unwrap();
//! assert!(r.confidence_interval.low <= r.confidence_interval.high);
//! ```

mod interval;
mod resample;

pub use interval::{bca_interval, percentile_interval, BcaAdjustment, ConfidenceInterval};
pub use resample::counter_rng_seed;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use u_numflow::stats;

use crate::alpha::{raw_alpha, MissingDataPolicy};
use crate::error::{AlphaError, BootstrapError};
use crate::matrix::ItemMatrix;

/// Interval construction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiMethod {
    /// Plain percentile interval.
    #[default]
    Percentile,
    /// Bias-corrected and accelerated interval.
    Bca,
}

/// Bootstrap settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of resamples (B), at least 1.
    pub resamples: usize,
    /// Confidence level in (0, 1).
    pub confidence_level: f64,
    /// Interval method.
    pub method: CiMethod,
    /// Base seed; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resamples: 1000,
            confidence_level: 0.95,
            method: CiMethod::Percentile,
            seed: None,
        }
    }
}

impl BootstrapConfig {
    /// Sets the number of resamples.
    pub fn with_resamples(mut self, resamples: usize) -> Self {
        self.resamples = resamples;
        self
    }

    /// Sets the confidence level.
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Sets the interval method.
    pub fn with_method(mut self, method: CiMethod) -> Self {
        self.method = method;
        self
    }

    /// Fixes the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks ranges.
    ///
    /// # Errors
    ///
    /// [`BootstrapError::InvalidConfig`] if `resamples` is 0 or
    /// `confidence_level` is outside (0, 1).
    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.resamples == 0 {
            return Err(BootstrapError::InvalidConfig(
                "resamples must be at least 1".into(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(BootstrapError::InvalidConfig(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    /// Alphas of the usable resamples, in resample order.
    pub resampled_alphas: Vec<f64>,
    /// Resamples dropped because alpha was undefined on them.
    pub excluded: usize,
    /// The interval.
    pub confidence_interval: ConfidenceInterval,
    /// Mean of `resampled_alphas`.
    #[serde(with = "crate::float_serde::nullable")]
    pub mean: f64,
    /// Sample standard deviation of `resampled_alphas`; `NaN` with fewer
    /// than two.
    #[serde(with = "crate::float_serde::nullable")]
    pub std_dev: f64,
    /// Interval method used.
    pub method: CiMethod,
    /// Configured seed, `None` if one was drawn.
    pub seed: Option<u64>,
    /// BCa terms, present only for [`CiMethod::Bca`].
    pub bca: Option<BcaAdjustment>,
}

impl BootstrapResult {
    /// Resamples attempted (usable plus excluded).
    pub fn attempted(&self) -> usize {
        self.resampled_alphas.len() + self.excluded
    }
}

/// Runs the bootstrap on `matrix`.
///
/// Resamples whose alpha is undefined (e.g. every drawn row identical) are
/// excluded and counted in [`BootstrapResult::excluded`].
///
/// # Errors
///
/// - [`BootstrapError::InvalidConfig`] for an out-of-range config
/// - [`BootstrapError::NoUsableResamples`] if every resample is excluded
/// - [`BootstrapError::Alpha`] if BCa is requested and alpha of the full
///   matrix is undefined
pub fn bootstrap(
    matrix: &ItemMatrix,
    config: &BootstrapConfig,
    policy: MissingDataPolicy,
) -> Result<BootstrapResult, BootstrapError> {
    config.validate()?;
    let base_seed = config
        .seed
        .unwrap_or_else(|| rand::thread_rng().gen::<u64>());

    let outcomes = resample::resampled_alphas(matrix, config.resamples, base_seed, policy);
    let (alphas, excluded) = partition(outcomes);
    debug!(
        resamples = config.resamples,
        usable = alphas.len(),
        excluded,
        "bootstrap resampling finished"
    );
    if alphas.is_empty() {
        return Err(BootstrapError::NoUsableResamples {
            attempted: config.resamples,
        });
    }
    if excluded > 0 {
        warn!(excluded, attempted = config.resamples, "excluded degenerate resamples");
    }

    let no_interval = || BootstrapError::NoUsableResamples {
        attempted: config.resamples,
    };
    let (confidence_interval, bca) = match config.method {
        CiMethod::Percentile => (
            percentile_interval(&alphas, config.confidence_level).ok_or_else(no_interval)?,
            None,
        ),
        CiMethod::Bca => {
            let estimate = raw_alpha(matrix, policy)?;
            let jackknife = resample::jackknife_alphas(matrix, policy);
            let (ci, adj) =
                bca_interval(&alphas, estimate, &jackknife, config.confidence_level)
                    .ok_or_else(no_interval)?;
            (ci, Some(adj))
        }
    };

    Ok(BootstrapResult {
        mean: stats::mean(&alphas).unwrap_or(f64::NAN),
        std_dev: stats::std_dev(&alphas).unwrap_or(f64::NAN),
        resampled_alphas: alphas,
        excluded,
        confidence_interval,
        method: config.method,
        seed: config.seed,
        bca,
    })
}

/// Splits outcomes into usable alphas and a count of degenerate ones.
fn partition(outcomes: Vec<Result<f64, AlphaError>>) -> (Vec<f64>, usize) {
    let total = outcomes.len();
    let alphas: Vec<f64> = outcomes
        .into_iter()
        .filter_map(Result::ok)
        .filter(|a| a.is_finite())
        .collect();
    let excluded = total - alphas.len();
    (alphas, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemMatrix {
        ItemMatrix::from_columns(vec![
            vec![4.0, 3.0, 5.0, 2.0, 4.0, 3.0, 5.0, 2.0, 1.0, 4.0, 3.0, 5.0],
            vec![3.0, 3.0, 4.0, 2.0, 5.0, 2.0, 4.0, 1.0, 2.0, 4.0, 3.0, 4.0],
            vec![5.0, 2.0, 4.0, 3.0, 4.0, 3.0, 5.0, 2.0, 1.0, 3.0, 3.0, 5.0],
            vec![4.0, 3.0, 4.0, 2.0, 4.0, 2.0, 5.0, 1.0, 2.0, 4.0, 2.0, 4.0],
        ])
        .expect("rectangular")
    }

    #[test]
    fn seeded_runs_are_identical() {
        let m = sample();
        let config = BootstrapConfig::default().with_resamples(100).with_seed(42);
        let a = bootstrap(&m, &config, MissingDataPolicy::Listwise).expect("bootstrap");
        let b = bootstrap(&m, &config, MissingDataPolicy::Listwise).expect("bootstrap");
        assert_eq!(a, b);
        assert_eq!(a.seed, Some(42));
        assert_eq!(a.attempted(), 100);
    }

    #[test]
    fn different_seeds_differ() {
        let m = sample();
        let cfg = BootstrapConfig::default().with_resamples(100);
        let a = bootstrap(&m, &cfg.clone().with_seed(1), MissingDataPolicy::Listwise)
            .expect("bootstrap");
        let b = bootstrap(&m, &cfg.with_seed(2), MissingDataPolicy::Listwise).expect("bootstrap");
        assert_ne!(a.resampled_alphas, b.resampled_alphas);
    }

    #[test]
    fn interval_brackets_the_bulk() {
        let m = sample();
        let config = BootstrapConfig::default().with_resamples(500).with_seed(3);
        let r = bootstrap(&m, &config, MissingDataPolicy::Listwise).expect("bootstrap");
        let ci = r.confidence_interval;
        assert!(ci.low <= ci.high);
        assert!(ci.high <= 1.0);
        assert!(ci.low <= r.mean && r.mean <= ci.high);
        assert!(r.std_dev > 0.0);
        assert!(r.bca.is_none());
    }

    #[test]
    fn bca_reports_adjustment() {
        let m = sample();
        let config = BootstrapConfig::default()
            .with_resamples(300)
            .with_seed(11)
            .with_method(CiMethod::Bca);
        let r = bootstrap(&m, &config, MissingDataPolicy::Listwise).expect("bootstrap");
        assert_eq!(r.method, CiMethod::Bca);
        let adj = r.bca.expect("bca terms");
        assert!(adj.bias_correction.is_finite());
        assert!(adj.acceleration.is_finite());
        assert!(r.confidence_interval.low <= r.confidence_interval.high);
    }

    #[test]
    fn constant_rows_give_no_usable_resamples() {
        // Every row is the same, so every resample has zero total variance.
        let m = ItemMatrix::from_columns(vec![vec![2.0; 6], vec![3.0; 6]]).expect("rectangular");
        let config = BootstrapConfig::default().with_resamples(20).with_seed(0);
        assert_eq!(
            bootstrap(&m, &config, MissingDataPolicy::Listwise),
            Err(BootstrapError::NoUsableResamples { attempted: 20 })
        );
    }

    #[test]
    fn bca_needs_full_sample_alpha() {
        let m = ItemMatrix::from_columns(vec![vec![2.0; 6], vec![3.0; 6]]).expect("rectangular");
        let config = BootstrapConfig::default()
            .with_resamples(20)
            .with_seed(0)
            .with_method(CiMethod::Bca);
        // Resampling fails first: nothing usable.
        assert!(matches!(
            bootstrap(&m, &config, MissingDataPolicy::Listwise),
            Err(BootstrapError::NoUsableResamples { .. })
        ));
    }

    #[test]
    fn small_samples_exclude_some_resamples() {
        // With 3 rows, resamples drawing one row three times are degenerate.
        let m = ItemMatrix::from_columns(vec![
            vec![1.0, 2.0, 3.0],
            vec![2.0, 1.0, 3.0],
            vec![1.0, 3.0, 2.0],
        ])
        .expect("rectangular");
        let config = BootstrapConfig::default().with_resamples(400).with_seed(9);
        let r = bootstrap(&m, &config, MissingDataPolicy::Listwise).expect("bootstrap");
        assert!(r.excluded > 0);
        assert_eq!(r.attempted(), 400);
    }

    #[test]
    fn unseeded_run_records_no_seed() {
        let m = sample();
        let config = BootstrapConfig::default().with_resamples(10);
        let r = bootstrap(&m, &config, MissingDataPolicy::Listwise).expect("bootstrap");
        assert_eq!(r.seed, None);
    }

    #[test]
    fn config_validation() {
        let bad = BootstrapConfig::default().with_resamples(0);
        assert!(matches!(bad.validate(), Err(BootstrapError::InvalidConfig(_))));
        for level in [0.0, 1.0, -0.5, f64::NAN] {
            let bad = BootstrapConfig::default().with_confidence_level(level);
            assert!(bad.validate().is_err(), "level {level}");
        }
        assert!(BootstrapConfig::default().validate().is_ok());
    }

    #[test]
    fn single_survivor_has_nan_spread() {
        let (alphas, excluded) = partition(vec![
            Ok(0.5),
            Err(AlphaError::InsufficientItems { found: 1 }),
        ]);
        assert_eq!(alphas, vec![0.5]);
        assert_eq!(excluded, 1);
        assert!(stats::std_dev(&alphas).is_none());
    }
}
