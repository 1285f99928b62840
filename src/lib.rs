//! # u-reliability
//!
//! Internal-consistency reliability of multi-item scales: Cronbach's alpha
//! (raw and standardized), item diagnostics, bootstrap confidence
//! intervals, and normality checks.
//!
//! The crate operates on a plain matrix of item scores (rows are
//! respondents, columns are items) and knows nothing about questionnaires,
//! file formats, or presentation.
//!
//! ## Modules
//!
//! - [`matrix`] — Raw cells, the input [`DataMatrix`], and the numeric [`ItemMatrix`]
//! - [`validate`] — Shape and content checks with non-fatal warnings
//! - [`correlation`] — Pairwise-complete Pearson correlation matrix
//! - [`alpha`] — Raw and standardized alpha, missing-data policies
//! - [`items`] — Item statistics, corrected item-total correlation, alpha-if-deleted
//! - [`normality`] — Shapiro-Wilk per item, Mardia's multivariate skewness and kurtosis
//! - [`bootstrap`] — Percentile and BCa intervals for alpha
//! - [`config`] — Analysis configuration
//! - [`analysis`] — The end-to-end [`analyze`] entry point
//! - [`error`], [`warning`] — Failure and diagnostic types
//!
//! ## Design Philosophy
//!
//! - **Errors vs. warnings**: only conditions that make the main result
//!   meaningless are errors; the rest are reported alongside it
//! - **Reproducible**: a seeded bootstrap gives identical results serially
//!   and in parallel
//! - **Numerical stability**: Leverages `u-numflow` for stable statistics

pub mod alpha;
pub mod analysis;
pub mod bootstrap;
pub mod config;
pub mod correlation;
pub mod error;
mod float_serde;
pub mod items;
pub mod matrix;
pub mod normality;
pub mod validate;
pub mod warning;

pub use analysis::{analyze, AnalysisResult};
pub use config::AnalysisConfig;
pub use error::ReliabilityError;
pub use matrix::{Cell, DataMatrix, ItemMatrix};
pub use warning::Warning;
