//! Classifier configuration.
//!
//! [`HyperionConfig`] holds every knob of [`crate::model::HyperionFuzzy`] and
//! projects onto the engine parameter structs via [`HyperionConfig::fuzzy_params`]
//! and [`HyperionConfig::refine_params`].

use crate::classify::{ContributionForm, FuzzyParams};
use crate::error::{HyperionError, HyperionResult};
use crate::optimize::RefineParams;

/// Element-wise transform applied to inputs before training and prediction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureMap {
    /// Inputs are used unchanged.
    Identity,
    /// `x ↦ exp(x)` per coordinate.
    #[default]
    Exp,
}

impl FeatureMap {
    /// Map one point.
    pub fn apply(self, x: &[f64]) -> Vec<f64> {
        match self {
            FeatureMap::Identity => x.to_vec(),
            FeatureMap::Exp => x.iter().map(|v| v.exp()).collect(),
        }
    }
}

/// Training and inference configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HyperionConfig {
    /// Hyperspheres per class (default: 2).
    pub num_clusters: usize,
    /// Contribution regularizer, `> 0` (default: 1.0).
    pub gamma: f64,
    /// RBF width, finite and nonzero (default: 0.005).
    pub sigma: f64,
    /// Conformal-factor guard, `>= 0` (default: 1e-7).
    pub epsilon: f64,
    /// Objective weight on a sphere's own assignments, `>= 0` (default: 1.0).
    pub c1: f64,
    /// Fuzzy passes over the training set, `>= 1` (default: 5).
    pub epochs: usize,
    /// Refine spheres after each pass (default: true).
    pub refine: bool,
    /// Step for the gradient-descent minimizer, `> 0` (default: 0.01).
    pub learning_rate: f64,
    /// Minimizer iteration cap, `>= 1` (default: 100).
    pub refine_max_iterations: u32,
    /// Objective-delta stopping threshold, `> 0` (default: 1e-6).
    pub tolerance: f64,
    /// Refinement stops once its objective reaches this value, finite (default: -1.0).
    pub refine_min_value: f64,
    /// Seed for hypersphere initialisation (default: 42).
    pub seed: u64,
    /// Input transform (default: [`FeatureMap::Exp`]).
    pub feature_map: FeatureMap,
    /// Confidence formula (default: [`ContributionForm::Linear`]).
    pub contribution_form: ContributionForm,
}

impl Default for HyperionConfig {
    fn default() -> Self {
        Self {
            num_clusters: 2,
            gamma: 1.0,
            sigma: 0.005,
            epsilon: 1e-7,
            c1: 1.0,
            epochs: 5,
            refine: true,
            learning_rate: 0.01,
            refine_max_iterations: 100,
            tolerance: 1e-6,
            refine_min_value: -1.0,
            seed: 42,
            feature_map: FeatureMap::Exp,
            contribution_form: ContributionForm::Linear,
        }
    }
}

impl HyperionConfig {
    /// Validate every field. Range errors from the engine structs are
    /// reported as [`HyperionError::Config`].
    pub fn validate(&self) -> HyperionResult<()> {
        if self.num_clusters == 0 {
            return Err(HyperionError::Config("num_clusters must be at least 1".into()));
        }
        if self.epochs == 0 {
            return Err(HyperionError::Config("epochs must be at least 1".into()));
        }
        if self.refine_max_iterations == 0 {
            return Err(HyperionError::Config("refine_max_iterations must be at least 1".into()));
        }
        self.fuzzy_params().validate().map_err(as_config)?;
        self.refine_params().validate().map_err(as_config)?;
        Ok(())
    }

    /// Parameters for [`crate::classify::classify_and_contribute`].
    pub fn fuzzy_params(&self) -> FuzzyParams {
        FuzzyParams::new(self.gamma, self.sigma, self.epsilon).with_form(self.contribution_form)
    }

    /// Parameters for [`crate::optimize::refine`].
    pub fn refine_params(&self) -> RefineParams {
        RefineParams {
            c1: self.c1,
            learning_rate: self.learning_rate,
            max_iterations: self.refine_max_iterations,
            tolerance: self.tolerance,
            min_value: self.refine_min_value,
        }
    }
}

fn as_config(err: HyperionError) -> HyperionError {
    match err {
        HyperionError::InvalidParameter(msg) => HyperionError::Config(msg),
        other => other,
    }
}
