/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Fuzzy classification with assignment recording.
//!
//! For a point `x`, every sphere's conformal kernel against its own center is
//! read as a boundary-distance surrogate: the *lowest* value per class marks
//! the class boundary `x` sits closest to. The class with the lower minimum
//! wins, and the winning sphere logs the point with a fuzzy contribution:
//!
//! ```text
//! contribution = max(c(k_own), c(|k_other − r_other|))
//! c(v)         = 1 − 1 / √(v + γ)        (ContributionForm::Linear)
//! c(v)         = 1 − 1 / √(v² + γ)       (ContributionForm::Squared)
//! ```
//!
//! An exact tie yields [`Label::Undecided`] with contribution `1.0` and logs
//! nothing.

use core::cmp::Ordering;

use crate::error::{ensure_dim, HyperionError, HyperionResult};
use crate::hypersphere::{Hypersphere, Label};
use crate::kernel::center_kernel;

// ─── Parameters ─────────────────────────────────────────────────────────────

/// How a kernel value is turned into a confidence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContributionForm {
    /// `1 − 1/√(v + γ)` on the raw kernel value.
    #[default]
    Linear,
    /// `1 − 1/√(v² + γ)`, the squared variant.
    Squared,
}

impl ContributionForm {
    /// Confidence for kernel value `v` under this form.
    pub fn confidence(self, v: f64, gamma: f64) -> f64 {
        match self {
            ContributionForm::Linear => fuzzy_confidence(v, gamma),
            ContributionForm::Squared => fuzzy_confidence(v * v, gamma),
        }
    }
}

/// Scalars for [`classify_and_contribute`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuzzyParams {
    /// Regularizer keeping the confidence transform finite. Must be `> 0`.
    pub gamma: f64,
    /// RBF width. Must be finite and nonzero.
    pub sigma: f64,
    /// Conformal-factor guard. Must be `>= 0`.
    pub epsilon: f64,
    /// Confidence formula.
    pub form: ContributionForm,
}

impl FuzzyParams {
    /// Parameters with the default [`ContributionForm::Linear`].
    pub fn new(gamma: f64, sigma: f64, epsilon: f64) -> Self {
        Self { gamma, sigma, epsilon, form: ContributionForm::Linear }
    }

    /// Same parameters with a different confidence formula.
    pub fn with_form(mut self, form: ContributionForm) -> Self {
        self.form = form;
        self
    }

    /// Check ranges: `gamma > 0`, `sigma != 0`, `epsilon >= 0`, all finite.
    pub fn validate(&self) -> HyperionResult<()> {
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(HyperionError::InvalidParameter(format!(
                "gamma must be finite and > 0, got {}",
                self.gamma
            )));
        }
        check_sigma(self.sigma)?;
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(HyperionError::InvalidParameter(format!(
                "epsilon must be finite and >= 0, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_sigma(sigma: f64) -> HyperionResult<()> {
    if sigma.is_finite() && sigma != 0.0 {
        Ok(())
    } else {
        Err(HyperionError::InvalidParameter(format!(
            "sigma must be finite and nonzero, got {sigma}"
        )))
    }
}

/// Both classes must be non-empty and every sphere must have dimension `dim`.
pub(crate) fn check_spheres(
    dim: usize,
    positive: &[Hypersphere],
    negative: &[Hypersphere],
) -> HyperionResult<()> {
    if positive.is_empty() {
        return Err(HyperionError::EmptyClass(Label::Positive));
    }
    if negative.is_empty() {
        return Err(HyperionError::EmptyClass(Label::Negative));
    }
    for hs in positive.iter().chain(negative) {
        ensure_dim(dim, hs.dim())?;
    }
    Ok(())
}

// ─── Outcome ────────────────────────────────────────────────────────────────

/// Result of one classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuzzyOutcome {
    /// Predicted class, or [`Label::Undecided`] on an exact tie.
    pub label: Label,
    /// Fuzzy confidence; `1.0` on a tie.
    pub contribution: f64,
    /// Index of the sphere that recorded the point, within the winning
    /// class's collection. `None` on a tie.
    pub winner: Option<usize>,
}

/// Confidence transform `1 − 1/√(v + γ)`.
///
/// Strictly below `1.0` for every finite `v >= 0` and `γ > 0`, and equal to
/// `1 − 1/√γ` at `v = 0`.
pub fn fuzzy_confidence(v: f64, gamma: f64) -> f64 {
    1.0 - 1.0 / (v + gamma).sqrt()
}

/// Index and value of the lowest center kernel; the first sphere wins ties.
///
/// Every sphere is scored, so a non-finite kernel anywhere in the class is an
/// error regardless of where the sphere sits in the collection.
fn nearest_boundary(
    x: &[f64],
    spheres: &[Hypersphere],
    sigma: f64,
    epsilon: f64,
) -> HyperionResult<(usize, f64)> {
    let mut best = (0, f64::INFINITY);
    for (i, hs) in spheres.iter().enumerate() {
        let k = center_kernel(x, hs, sigma, epsilon);
        if !k.is_finite() {
            return Err(HyperionError::Numerical(format!("non-finite boundary kernel {k} at sphere {i}")));
        }
        if i == 0 || k < best.1 {
            best = (i, k);
        }
    }
    Ok(best)
}

// ─── classify_and_contribute ────────────────────────────────────────────────

/// Classify `x` against both classes and log it on the winning sphere.
///
/// Exactly one sphere gains one assignment, unless the classes tie exactly.
/// Fails without mutating anything on empty classes, dimension mismatch,
/// invalid parameters, or a non-finite kernel value.
pub fn classify_and_contribute(
    x: &[f64],
    positive: &mut [Hypersphere],
    negative: &mut [Hypersphere],
    params: &FuzzyParams,
) -> HyperionResult<FuzzyOutcome> {
    params.validate()?;
    check_spheres(x.len(), positive, negative)?;

    let (pos_idx, min_pos) = nearest_boundary(x, positive, params.sigma, params.epsilon)?;
    let (neg_idx, min_neg) = nearest_boundary(x, negative, params.sigma, params.epsilon)?;

    let contribution = |own: f64, other: f64, other_radius: f64| {
        let d_other = (other - other_radius).abs();
        params
            .form
            .confidence(own, params.gamma)
            .max(params.form.confidence(d_other, params.gamma))
    };

    let outcome = match min_pos.partial_cmp(&min_neg) {
        Some(Ordering::Less) => {
            let c = contribution(min_pos, min_neg, negative[neg_idx].radius());
            positive[pos_idx].record_assignment(x.to_vec(), Label::Positive, c);
            FuzzyOutcome { label: Label::Positive, contribution: c, winner: Some(pos_idx) }
        }
        Some(Ordering::Greater) => {
            let c = contribution(min_neg, min_pos, positive[pos_idx].radius());
            negative[neg_idx].record_assignment(x.to_vec(), Label::Negative, c);
            FuzzyOutcome { label: Label::Negative, contribution: c, winner: Some(neg_idx) }
        }
        _ => FuzzyOutcome { label: Label::Undecided, contribution: 1.0, winner: None },
    };

    tracing::trace!(
        label = outcome.label.value(),
        contribution = outcome.contribution,
        min_pos,
        min_neg,
        "classified point"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::conformal_kernel;
    use approx::assert_abs_diff_eq;

    fn sphere(center: &[f64], radius: f64, elements: &[&[f64]]) -> Hypersphere {
        Hypersphere::new(center.to_vec(), radius, elements.iter().map(|e| e.to_vec()).collect())
            .expect("valid sphere")
    }

    fn params() -> FuzzyParams {
        FuzzyParams::new(0.5, 1.0, 1e-7)
    }

    #[test]
    fn test_confidence_bounds() {
        assert_abs_diff_eq!(fuzzy_confidence(0.0, 4.0), 0.5, epsilon = 1e-15);
        assert!(fuzzy_confidence(1e12, 0.1) < 1.0);
        assert!(fuzzy_confidence(3.0, 1.0) > fuzzy_confidence(1.0, 1.0));
        assert_abs_diff_eq!(
            ContributionForm::Squared.confidence(2.0, 1.0),
            fuzzy_confidence(4.0, 1.0),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_lower_kernel_wins_and_records() {
        // x sits on the negative sphere's elements and far from the positive
        // sphere's, so the positive kernel underflows to 0 and is the minimum.
        let mut pos = vec![sphere(&[10.0, 10.0], 0.3, &[&[10.0, 10.0], &[11.0, 10.0]])];
        let mut neg = vec![sphere(&[0.0, 0.0], 0.7, &[&[0.0, 0.0], &[1.0, 0.0]])];
        let x = [0.1, 0.0];
        let p = params();

        let k_neg = conformal_kernel(&x, neg[0].center(), &neg[0], p.sigma, p.epsilon);
        let out = classify_and_contribute(&x, &mut pos, &mut neg, &p).expect("classify");

        assert_eq!(out.label, Label::Positive);
        assert_eq!(out.winner, Some(0));
        let expected = fuzzy_confidence(0.0, p.gamma).max(fuzzy_confidence((k_neg - 0.7).abs(), p.gamma));
        assert_abs_diff_eq!(out.contribution, expected, epsilon = 1e-12);

        assert_eq!(pos[0].assignments().len(), 1);
        assert_eq!(pos[0].assignments()[0].point, x.to_vec());
        assert_eq!(pos[0].assignments()[0].label, Label::Positive);
        assert!(neg[0].assignments().is_empty());
    }

    #[test]
    fn test_picks_lowest_sphere_within_class() {
        let mut pos = vec![
            sphere(&[0.0], 1.0, &[&[0.0], &[0.5]]),
            sphere(&[9.0], 1.0, &[&[9.0], &[9.5]]),
        ];
        let mut neg = vec![sphere(&[0.2], 1.0, &[&[0.0], &[0.4]])];
        let out = classify_and_contribute(&[0.1], &mut pos, &mut neg, &params()).expect("classify");
        // the far positive sphere has kernel ≈ 0, lower than the near negative sphere
        assert_eq!(out.label, Label::Positive);
        assert_eq!(out.winner, Some(1));
        assert_eq!(pos[1].assignments().len(), 1);
        assert!(pos[0].assignments().is_empty());
    }

    #[test]
    fn test_mirrored_tie_is_undecided() {
        let mut pos = vec![sphere(&[-1.0, 0.0], 1.0, &[&[-1.0, 0.0], &[-2.0, 0.0]])];
        let mut neg = vec![sphere(&[1.0, 0.0], 1.0, &[&[1.0, 0.0], &[2.0, 0.0]])];
        let out = classify_and_contribute(&[0.0, 0.0], &mut pos, &mut neg, &params()).expect("classify");
        assert_eq!(out, FuzzyOutcome { label: Label::Undecided, contribution: 1.0, winner: None });
        assert!(pos[0].assignments().is_empty());
        assert!(neg[0].assignments().is_empty());
    }

    #[test]
    fn test_rejects_empty_class() {
        let mut pos = vec![sphere(&[0.0], 1.0, &[&[0.0]])];
        let mut neg: Vec<Hypersphere> = Vec::new();
        assert_eq!(
            classify_and_contribute(&[0.0], &mut pos, &mut neg, &params()),
            Err(HyperionError::EmptyClass(Label::Negative))
        );
        assert_eq!(
            classify_and_contribute(&[0.0], &mut neg, &mut pos, &params()),
            Err(HyperionError::EmptyClass(Label::Positive))
        );
    }

    #[test]
    fn test_rejects_dimension_mismatch_without_mutation() {
        let mut pos = vec![sphere(&[0.0, 0.0], 1.0, &[&[0.0, 0.0]])];
        let mut neg = vec![sphere(&[5.0, 5.0], 1.0, &[&[5.0, 5.0]])];
        let err = classify_and_contribute(&[0.0, 0.0, 0.0], &mut pos, &mut neg, &params()).unwrap_err();
        assert_eq!(err, HyperionError::DimensionMismatch { expected: 3, found: 2 });
        assert!(pos[0].assignments().is_empty());
        assert!(neg[0].assignments().is_empty());
    }

    #[test]
    fn test_rejects_bad_params() {
        let mut pos = vec![sphere(&[0.0], 1.0, &[&[0.0]])];
        let mut neg = vec![sphere(&[1.0], 1.0, &[&[1.0]])];
        for bad in [
            FuzzyParams::new(0.0, 1.0, 0.0),
            FuzzyParams::new(1.0, 0.0, 0.0),
            FuzzyParams::new(1.0, 1.0, -1e-9),
            FuzzyParams::new(1.0, f64::NAN, 0.0),
        ] {
            assert!(matches!(
                classify_and_contribute(&[0.5], &mut pos, &mut neg, &bad),
                Err(HyperionError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_non_finite_point_is_numerical_error() {
        let mut pos = vec![sphere(&[0.0], 1.0, &[&[0.0], &[1.0]])];
        let mut neg = vec![sphere(&[3.0], 1.0, &[&[3.0], &[4.0]])];
        assert!(matches!(
            classify_and_contribute(&[f64::NAN], &mut pos, &mut neg, &params()),
            Err(HyperionError::Numerical(_))
        ));
        assert!(pos[0].assignments().is_empty());
    }

    #[test]
    fn test_overflowing_sphere_fails_in_any_position() {
        // elements at ±1e200 overflow the spread to inf, so its kernel is NaN
        let overflow = sphere(&[0.0], 1.0, &[&[1e200], &[-1e200]]);
        let near = sphere(&[0.0], 1.0, &[&[0.0], &[1.0]]);
        let far = sphere(&[5.0], 1.0, &[&[5.0], &[6.0]]);

        for mut pos in [vec![overflow.clone(), near.clone()], vec![near.clone(), overflow.clone()]] {
            let mut neg = vec![far.clone()];
            assert!(matches!(
                classify_and_contribute(&[0.5], &mut pos, &mut neg, &params()),
                Err(HyperionError::Numerical(_))
            ));
            assert!(pos.iter().chain(&neg).all(|hs| hs.assignments().is_empty()));
        }
    }
}
