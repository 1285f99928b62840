//! Analysis configuration.
//!
//! [`AnalysisConfig`] deserializes with every field optional (missing
//! fields take their defaults) and can also be built in code:
//!
//! ```
//! use u_reliability::bootstrap::CiMethod;
//! use u_reliability::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::new()
//!     .bootstrap(true)
//!     .resample_count(500)
//!     .ci_method(CiMethod::Bca)
//!     .random_seed(42);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::alpha::MissingDataPolicy;
use crate::bootstrap::{BootstrapConfig, CiMethod};
use crate::error::ReliabilityError;

/// Options for [`analyze`](crate::analysis::analyze).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // =========================================================================
    // Bootstrap
    // =========================================================================
    /// Run the bootstrap. Default: false.
    pub bootstrap: bool,

    /// Confidence level of the bootstrap interval, in (0, 1).
    ///
    /// Default: 0.95.
    pub confidence_level: f64,

    /// Number of bootstrap resamples. Default: 1000.
    pub resample_count: usize,

    /// Interval method. Default: percentile.
    pub ci_method: CiMethod,

    /// Seed for reproducible resampling.
    ///
    /// Default: None (a fresh seed per run).
    pub random_seed: Option<u64>,

    // =========================================================================
    // Diagnostics
    // =========================================================================
    /// Run Shapiro-Wilk and Mardia. Default: false.
    pub normality: bool,

    /// Missing-data handling of raw alpha. Default: listwise.
    pub missing_policy: MissingDataPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bootstrap: false,
            confidence_level: 0.95,
            resample_count: 1000,
            ci_method: CiMethod::Percentile,
            random_seed: None,
            normality: false,
            missing_policy: MissingDataPolicy::Listwise,
        }
    }
}

impl AnalysisConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the bootstrap.
    pub fn bootstrap(mut self, enabled: bool) -> Self {
        self.bootstrap = enabled;
        self
    }

    /// Sets the confidence level.
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Sets the number of resamples.
    pub fn resample_count(mut self, count: usize) -> Self {
        self.resample_count = count;
        self
    }

    /// Sets the interval method.
    pub fn ci_method(mut self, method: CiMethod) -> Self {
        self.ci_method = method;
        self
    }

    /// Fixes the random seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Enables or disables normality diagnostics.
    pub fn normality(mut self, enabled: bool) -> Self {
        self.normality = enabled;
        self
    }

    /// Sets the missing-data policy.
    pub fn missing_policy(mut self, policy: MissingDataPolicy) -> Self {
        self.missing_policy = policy;
        self
    }

    /// The bootstrap settings carried by this configuration.
    pub fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            resamples: self.resample_count,
            confidence_level: self.confidence_level,
            method: self.ci_method,
            seed: self.random_seed,
        }
    }

    /// Checks ranges.
    ///
    /// Bootstrap settings are checked even when the bootstrap is off, so a
    /// configuration is either valid or not regardless of which steps run.
    ///
    /// # Errors
    ///
    /// [`ReliabilityError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), ReliabilityError> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ReliabilityError::InvalidConfig(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.resample_count == 0 {
            return Err(ReliabilityError::InvalidConfig(
                "resample_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalysisConfig::default();
        assert!(!c.bootstrap);
        assert!(!c.normality);
        assert_eq!(c.confidence_level, 0.95);
        assert_eq!(c.resample_count, 1000);
        assert_eq!(c.ci_method, CiMethod::Percentile);
        assert_eq!(c.random_seed, None);
        assert_eq!(c.missing_policy, MissingDataPolicy::Listwise);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let c = AnalysisConfig::new()
            .bootstrap(true)
            .confidence_level(0.9)
            .resample_count(250)
            .ci_method(CiMethod::Bca)
            .random_seed(7)
            .normality(true)
            .missing_policy(MissingDataPolicy::Mixed);
        let b = c.bootstrap_config();
        assert_eq!(b.resamples, 250);
        assert_eq!(b.confidence_level, 0.9);
        assert_eq!(b.method, CiMethod::Bca);
        assert_eq!(b.seed, Some(7));
        assert!(c.normality);
        assert_eq!(c.missing_policy, MissingDataPolicy::Mixed);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: AnalysisConfig =
            serde_json::from_str(r#"{"bootstrap": true, "ci_method": "bca", "random_seed": 3}"#)
                .expect("parse");
        assert!(c.bootstrap);
        assert_eq!(c.ci_method, CiMethod::Bca);
        assert_eq!(c.random_seed, Some(3));
        assert_eq!(c.resample_count, 1000);
        assert_eq!(c.missing_policy, MissingDataPolicy::Listwise);

        let c: AnalysisConfig =
            serde_json::from_str(r#"{"missing_policy": "mixed"}"#).expect("parse");
        assert_eq!(c.missing_policy, MissingDataPolicy::Mixed);
    }

    #[test]
    fn rejects_out_of_range() {
        for level in [0.0, 1.0, 1.5, f64::NAN] {
            let c = AnalysisConfig::new().confidence_level(level);
            assert!(
                matches!(c.validate(), Err(ReliabilityError::InvalidConfig(_))),
                "level {level}"
            );
        }
        let c = AnalysisConfig::new().resample_count(0);
        assert!(matches!(c.validate(), Err(ReliabilityError::InvalidConfig(_))));
    }
}
