/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Hypersphere refinement from accumulated assignments.
//!
//! The parameter vector is `[radius, center₀, …, center_{D−1}]` and the
//! objective is
//!
//! ```text
//! f(r, c) = r² + c1 · Σ w            (own assignment weights)
//!              − mean over others of Σ ‖p − c‖²   (others' assigned points)
//! ```
//!
//! `r²` pulls the boundary tight and the last term pushes the center away
//! from points claimed by competing spheres. `c1 · Σ w` is added as-is.
//!
//! The last term is concave in the center, so `f` has no lower bound. The run
//! stops once `f` reaches [`RefineParams::min_value`], which keeps the center
//! within a bounded distance of where it started.
//!
//! # Invariants
//!
//! - Other spheres are read through a shared borrow and never mutated.
//! - The minimizer works on its own parameter copy; the result is written back
//!   to the target only after it finishes and only if it has the target's
//!   shape (`dim + 1` finite values).
//! - The objective is even in `r`, so the stored radius is `|r|` and stays `>= 0`.

use crate::error::{ensure_dim, HyperionError, HyperionResult};
use crate::hypersphere::Hypersphere;
use crate::kernel::squared_distance;
use crate::minimize::{Bfgs, GradientDescent, MinimizeOutcome, Minimizer};

/// Parameters for [`refine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefineParams {
    /// Weight on the target's own assignment weights. Must be `>= 0`.
    pub c1: f64,
    /// Step size for the [`GradientDescent`] fallback.
    pub learning_rate: f64,
    /// Iteration cap handed to the minimizer.
    pub max_iterations: u32,
    /// Objective-delta stopping threshold. Must be `> 0`.
    pub tolerance: f64,
    /// Stop once the objective reaches this value. Must be finite.
    pub min_value: f64,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self { c1: 1.0, learning_rate: 0.01, max_iterations: 100, tolerance: 1e-6, min_value: -1.0 }
    }
}

impl RefineParams {
    /// Check ranges: `c1 >= 0`, `tolerance > 0`, `learning_rate > 0`, all finite.
    pub fn validate(&self) -> HyperionResult<()> {
        if !(self.c1.is_finite() && self.c1 >= 0.0) {
            return Err(HyperionError::InvalidParameter(format!(
                "c1 must be finite and >= 0, got {}",
                self.c1
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(HyperionError::InvalidParameter(format!(
                "tolerance must be finite and > 0, got {}",
                self.tolerance
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(HyperionError::InvalidParameter(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if !self.min_value.is_finite() {
            return Err(HyperionError::InvalidParameter(format!(
                "min_value must be finite, got {}",
                self.min_value
            )));
        }
        Ok(())
    }

    /// Quasi-Newton minimizer configured from these parameters.
    pub fn bfgs(&self) -> Bfgs {
        Bfgs::new(self.tolerance, self.max_iterations).with_min_value(self.min_value)
    }

    /// Gradient-descent minimizer configured from these parameters.
    pub fn gradient_descent(&self) -> GradientDescent {
        GradientDescent {
            learning_rate: self.learning_rate,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            min_value: self.min_value,
        }
    }
}

// ─── Objective ──────────────────────────────────────────────────────────────

/// The refinement objective for one target sphere.
///
/// `c1 · Σ w` does not depend on the parameters and is computed once.
#[derive(Clone, Debug)]
pub struct RefineObjective<'a> {
    pos_part: f64,
    others: &'a [Hypersphere],
}

impl<'a> RefineObjective<'a> {
    /// Build the objective for `target` against `others`.
    pub fn new(target: &Hypersphere, others: &'a [Hypersphere], c1: f64) -> Self {
        Self { pos_part: c1 * target.assignment_weight_total(), others }
    }

    /// `c1` times the target's total assignment weight.
    pub fn pos_part(&self) -> f64 {
        self.pos_part
    }

    /// Mean over other spheres of the summed squared distance from their
    /// assigned points to `center`. Zero without other spheres.
    pub fn neg_part(&self, center: &[f64]) -> f64 {
        if self.others.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .others
            .iter()
            .map(|hs| hs.assignments().iter().map(|a| squared_distance(&a.point, center)).sum::<f64>())
            .sum();
        total / self.others.len() as f64
    }

    /// Objective at `params = [radius, center…]`.
    pub fn value(&self, params: &[f64]) -> f64 {
        let radius = params[0];
        radius * radius + self.pos_part - self.neg_part(&params[1..])
    }
}

/// `[radius, center…]` for `hs`.
pub fn initial_params(hs: &Hypersphere) -> Vec<f64> {
    let mut params = Vec::with_capacity(hs.dim() + 1);
    params.push(hs.radius());
    params.extend_from_slice(hs.center());
    params
}

// ─── refine ─────────────────────────────────────────────────────────────────

/// Refine `target`'s radius and center with the quasi-Newton minimizer.
pub fn refine(
    target: &mut Hypersphere,
    others: &[Hypersphere],
    params: &RefineParams,
) -> HyperionResult<MinimizeOutcome> {
    refine_with(target, others, params, &params.bfgs())
}

/// Refine `target` with any [`Minimizer`].
///
/// On error the target is left untouched, including when the minimizer hands
/// back parameters of the wrong length or with non-finite entries.
pub fn refine_with<M: Minimizer + ?Sized>(
    target: &mut Hypersphere,
    others: &[Hypersphere],
    params: &RefineParams,
    minimizer: &M,
) -> HyperionResult<MinimizeOutcome> {
    params.validate()?;
    for hs in others {
        ensure_dim(target.dim(), hs.dim())?;
    }

    let objective = RefineObjective::new(target, others, params.c1);
    let outcome = minimizer.minimize(&|p: &[f64]| objective.value(p), &initial_params(target))?;

    let Some((radius, center)) = outcome.params.split_first() else {
        return Err(HyperionError::DimensionMismatch { expected: target.dim() + 1, found: 0 });
    };
    ensure_dim(target.dim(), center.len())?;
    if !outcome.params.iter().all(|v| v.is_finite()) {
        return Err(HyperionError::Numerical(format!(
            "minimizer returned non-finite parameters {:?}",
            outcome.params
        )));
    }

    target.set_radius(radius.abs())?;
    target.set_center(center.to_vec())?;

    tracing::debug!(
        iterations = outcome.iterations,
        converged = outcome.converged,
        value = outcome.value,
        radius = target.radius(),
        "refined hypersphere"
    );
    Ok(outcome)
}
