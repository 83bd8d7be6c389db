/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Derivative-free minimizers for smooth scalar objectives.
//!
//! Gradients are central differences from `finitediff`, so callers supply only
//! the objective. Two strategies implement [`Minimizer`]:
//!
//! - [`Bfgs`]: `argmin`'s BFGS solver with a More-Thuente line search. Stops
//!   when the objective changes by less than `tolerance` between iterations,
//!   when the gradient vanishes, when the objective reaches `min_value`, or at
//!   the iteration cap.
//! - [`GradientDescent`]: fixed-step steepest descent driven by
//!   `learning_rate`, with the same stopping rules.
//!
//! # Invariants
//!
//! - The objective is seen through a floor: values below `min_value` read as
//!   `min_value`, so the returned value is never below it.
//! - The returned parameters never evaluate to a larger objective than the
//!   initial guess. The best finite point evaluated is what gets returned.
//! - A non-finite value at the initial guess is an error.

use std::cell::RefCell;

use argmin::core::{
    CostFunction, Error as ArgminError, Executor, Gradient, State, TerminationReason,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::BFGS;
use argmin_math::{ArgminEye, ArgminL2Norm, ArgminScaledSub};
use finitediff::FiniteDiff;

use crate::error::{HyperionError, HyperionResult};

/// Longest step the line search may take along a search direction.
const MAX_STEP: f64 = 1e3;

/// Step halvings before gradient descent gives up on an iteration.
const MAX_BACKTRACKS: u32 = 60;

/// Gradient norm below which a point counts as stationary.
const GRADIENT_FLOOR: f64 = 1e-12;

/// Result of a minimization run.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimizeOutcome {
    /// Final parameter vector.
    pub params: Vec<f64>,
    /// Objective value at `params`, floored at the minimizer's `min_value`.
    pub value: f64,
    /// Iterations performed.
    pub iterations: u32,
    /// Whether a stopping rule fired before the iteration cap or a solver failure.
    pub converged: bool,
}

/// A strategy that minimizes a scalar objective over a real vector.
pub trait Minimizer {
    /// Minimize `objective` starting from `initial`.
    ///
    /// Fails when the settings are out of range or the objective is not
    /// finite at `initial`.
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial: &[f64],
    ) -> HyperionResult<MinimizeOutcome>;
}

fn check_settings(tolerance: f64, min_value: f64) -> HyperionResult<()> {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(HyperionError::InvalidParameter(format!(
            "tolerance must be finite and > 0, got {tolerance}"
        )));
    }
    if min_value.is_nan() || min_value == f64::INFINITY {
        return Err(HyperionError::InvalidParameter(format!(
            "min_value must be finite or -inf, got {min_value}"
        )));
    }
    Ok(())
}

// ─── Floored objective ──────────────────────────────────────────────────────

/// The caller's objective clamped from below at `floor`.
struct Floored<'a> {
    objective: &'a dyn Fn(&[f64]) -> f64,
    floor: f64,
}

impl Floored<'_> {
    fn value(&self, x: &[f64]) -> f64 {
        let v = (self.objective)(x);
        if v.is_nan() {
            v
        } else {
            v.max(self.floor)
        }
    }

    #[allow(clippy::ptr_arg)]
    fn gradient(&self, x: &Vec<f64>) -> Vec<f64> {
        x.central_diff(&|p: &Vec<f64>| self.value(p))
    }

    fn start(&self, x: &[f64]) -> HyperionResult<f64> {
        let v = self.value(x);
        if v.is_finite() {
            Ok(v)
        } else {
            Err(HyperionError::Numerical(format!("objective is {v} at the initial point")))
        }
    }
}

/// `argmin` problem that remembers the lowest finite point it evaluated.
struct Tracked<'a> {
    inner: &'a Floored<'a>,
    best: &'a RefCell<(Vec<f64>, f64)>,
}

impl CostFunction for Tracked<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, ArgminError> {
        let v = self.inner.value(p);
        let improved = v.is_finite() && v < self.best.borrow().1;
        if improved {
            *self.best.borrow_mut() = (p.clone(), v);
        }
        Ok(v)
    }
}

impl Gradient for Tracked<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, p: &Self::Param) -> Result<Self::Gradient, ArgminError> {
        Ok(self.inner.gradient(p))
    }
}

// ─── BFGS ───────────────────────────────────────────────────────────────────

/// Quasi-Newton minimizer with numerically approximated gradients.
#[derive(Clone, Debug, PartialEq)]
pub struct Bfgs {
    /// Stop once `|f_prev − f| < tolerance` (default: 1e-6).
    pub tolerance: f64,
    /// Iteration cap (default: 100).
    pub max_iterations: u32,
    /// Stop once the objective reaches this value (default: `-inf`).
    pub min_value: f64,
}

impl Default for Bfgs {
    fn default() -> Self {
        Self { tolerance: 1e-6, max_iterations: 100, min_value: f64::NEG_INFINITY }
    }
}

impl Bfgs {
    /// Create a minimizer with the given delta tolerance and iteration cap.
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self { tolerance, max_iterations, min_value: f64::NEG_INFINITY }
    }

    /// Stop as soon as the objective reaches `min_value`.
    pub fn with_min_value(mut self, min_value: f64) -> Self {
        self.min_value = min_value;
        self
    }
}

fn solver_error(err: ArgminError) -> HyperionError {
    HyperionError::InvalidParameter(err.to_string())
}

impl Minimizer for Bfgs {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial: &[f64],
    ) -> HyperionResult<MinimizeOutcome> {
        check_settings(self.tolerance, self.min_value)?;
        let floored = Floored { objective, floor: self.min_value };
        let start = floored.start(initial)?;
        if start <= self.min_value {
            return Ok(MinimizeOutcome {
                params: initial.to_vec(),
                value: start,
                iterations: 0,
                converged: true,
            });
        }

        let linesearch: MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64> =
            MoreThuenteLineSearch::new().with_bounds(f64::EPSILON.sqrt(), MAX_STEP).map_err(solver_error)?;
        let solver = BFGS::new(linesearch).with_tolerance_cost(self.tolerance).map_err(solver_error)?;
        let inv_hessian = <Vec<Vec<f64>> as ArgminEye>::eye(initial.len());

        let best = RefCell::new((initial.to_vec(), start));
        let problem = Tracked { inner: &floored, best: &best };
        let run = Executor::new(problem, solver)
            .configure(|state| {
                state
                    .param(initial.to_vec())
                    .inv_hessian(inv_hessian)
                    .max_iters(u64::from(self.max_iterations))
                    .target_cost(self.min_value)
            })
            .run();

        let (iterations, converged) = match &run {
            Ok(result) => {
                let state = result.state();
                let converged = matches!(
                    state.get_termination_reason(),
                    Some(TerminationReason::SolverConverged | TerminationReason::TargetCostReached)
                );
                (u32::try_from(state.get_iter()).unwrap_or(u32::MAX), converged)
            }
            Err(err) => {
                tracing::warn!(error = %err, "BFGS run failed, keeping best point seen");
                (0, false)
            }
        };
        drop(run);

        let (params, value) = best.into_inner();
        if !converged {
            tracing::warn!(iterations, value, "BFGS stopped before convergence");
        }
        tracing::trace!(iterations, value, "BFGS finished");
        Ok(MinimizeOutcome { params, value, iterations, converged })
    }
}

// ─── Gradient descent ───────────────────────────────────────────────────────

/// Steepest descent with a fixed learning rate.
///
/// A step that fails to decrease the objective (or leaves it non-finite) is
/// halved until it does; after repeated failure the run stops unconverged.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientDescent {
    /// Step multiplier on the gradient (default: 0.01).
    pub learning_rate: f64,
    /// Stop once `|f_prev − f| < tolerance` (default: 1e-6).
    pub tolerance: f64,
    /// Iteration cap (default: 1000).
    pub max_iterations: u32,
    /// Stop once the objective reaches this value (default: `-inf`).
    pub min_value: f64,
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            tolerance: 1e-6,
            max_iterations: 1000,
            min_value: f64::NEG_INFINITY,
        }
    }
}

impl Minimizer for GradientDescent {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial: &[f64],
    ) -> HyperionResult<MinimizeOutcome> {
        check_settings(self.tolerance, self.min_value)?;
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(HyperionError::InvalidParameter(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        let floored = Floored { objective, floor: self.min_value };
        let mut x = initial.to_vec();
        let mut fx = floored.start(&x)?;

        for iter in 0..self.max_iterations {
            if fx <= self.min_value {
                return Ok(MinimizeOutcome { params: x, value: fx, iterations: iter, converged: true });
            }
            let grad = floored.gradient(&x);
            let grad_norm: f64 = grad.l2_norm();
            if grad_norm < GRADIENT_FLOOR {
                return Ok(MinimizeOutcome { params: x, value: fx, iterations: iter, converged: true });
            }

            let mut step = self.learning_rate;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let trial: Vec<f64> = x.scaled_sub(&step, &grad);
                let ft = floored.value(&trial);
                if ft.is_finite() && ft <= fx {
                    accepted = Some((trial, ft));
                    break;
                }
                step *= 0.5;
            }
            let Some((x_new, f_new)) = accepted else {
                tracing::warn!(iteration = iter, value = fx, "gradient descent could not decrease objective");
                return Ok(MinimizeOutcome { params: x, value: fx, iterations: iter, converged: false });
            };

            let delta = fx - f_new;
            x = x_new;
            fx = f_new;
            tracing::trace!(iteration = iter, value = fx, delta, "gradient descent step");
            if delta.abs() < self.tolerance {
                return Ok(MinimizeOutcome { params: x, value: fx, iterations: iter + 1, converged: true });
            }
        }

        tracing::warn!(
            iterations = self.max_iterations,
            value = fx,
            "gradient descent stopped at iteration cap"
        );
        Ok(MinimizeOutcome { params: x, value: fx, iterations: self.max_iterations, converged: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bowl(p: &[f64]) -> f64 {
        (p[0] - 3.0).powi(2) + 2.0 * (p[1] + 1.0).powi(2) + 0.5 * (p[0] - 3.0) * (p[1] + 1.0)
    }

    fn rosenbrock(p: &[f64]) -> f64 {
        (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2)
    }

    #[test]
    fn test_bfgs_finds_quadratic_minimum() {
        let out = Bfgs::new(1e-10, 200).minimize(&bowl, &[0.0, 0.0]).expect("minimize");
        assert_abs_diff_eq!(out.params[0], 3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(out.params[1], -1.0, epsilon = 1e-4);
        assert!(out.value < 1e-8, "{:?}", out);
    }

    #[test]
    fn test_bfgs_rosenbrock() {
        let out = Bfgs::new(1e-14, 500).minimize(&rosenbrock, &[-1.2, 1.0]).expect("minimize");
        assert!(out.value < 1e-4, "rosenbrock value {}", out.value);
        assert_abs_diff_eq!(out.params[0], 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(out.params[1], 1.0, epsilon = 2e-2);
    }

    #[test]
    fn test_bfgs_already_optimal() {
        let out = Bfgs::default().minimize(&bowl, &[3.0, -1.0]).expect("minimize");
        assert!(out.converged);
        assert_eq!(out.params, vec![3.0, -1.0]);
        assert_eq!(out.value, 0.0);
    }

    #[test]
    fn test_bfgs_stops_at_min_value() {
        // -x² has no minimum: the floor ends the run at a finite point.
        let bfgs = Bfgs::new(1e-6, 50).with_min_value(-1.0);
        let out = bfgs.minimize(&|p: &[f64]| -p[0] * p[0], &[0.5]).expect("minimize");
        assert!(out.converged, "{:?}", out);
        assert_eq!(out.value, -1.0);
        assert!(out.params[0].abs() >= 1.0);
        assert!(out.params[0].abs() <= 0.5 + MAX_STEP, "step is bounded: {:?}", out.params);
    }

    #[test]
    fn test_bfgs_start_below_floor_returns_immediately() {
        let bfgs = Bfgs::default().with_min_value(10.0);
        let out = bfgs.minimize(&bowl, &[0.0, 0.0]).expect("minimize");
        assert_eq!(out.iterations, 0);
        assert_eq!(out.params, vec![0.0, 0.0]);
        assert!(out.converged);
    }

    #[test]
    fn test_non_finite_start_is_an_error() {
        let out = Bfgs::default().minimize(&|_: &[f64]| f64::NAN, &[1.0]);
        assert!(matches!(out, Err(HyperionError::Numerical(_))));
        let out = GradientDescent::default().minimize(&|_: &[f64]| f64::INFINITY, &[1.0]);
        assert!(matches!(out, Err(HyperionError::Numerical(_))));
    }

    #[test]
    fn test_bad_settings_are_rejected() {
        let out = Bfgs::new(0.0, 10).minimize(&bowl, &[0.0, 0.0]);
        assert!(matches!(out, Err(HyperionError::InvalidParameter(_))));
        let out = Bfgs::default().with_min_value(f64::NAN).minimize(&bowl, &[0.0, 0.0]);
        assert!(matches!(out, Err(HyperionError::InvalidParameter(_))));
        let gd = GradientDescent { learning_rate: -1.0, ..GradientDescent::default() };
        assert!(matches!(gd.minimize(&bowl, &[0.0, 0.0]), Err(HyperionError::InvalidParameter(_))));
    }

    #[test]
    fn test_gradient_descent_quadratic() {
        let gd = GradientDescent {
            learning_rate: 0.1,
            tolerance: 1e-12,
            max_iterations: 5000,
            ..GradientDescent::default()
        };
        let out = gd.minimize(&bowl, &[0.0, 0.0]).expect("minimize");
        assert!(out.converged, "{:?}", out);
        assert_abs_diff_eq!(out.params[0], 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out.params[1], -1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_gradient_descent_never_increases() {
        let gd = GradientDescent {
            learning_rate: 10.0,
            tolerance: 1e-9,
            max_iterations: 50,
            ..GradientDescent::default()
        };
        let start = [0.0, 0.0];
        let out = gd.minimize(&bowl, &start).expect("minimize");
        assert!(out.value <= bowl(&start));
    }

    #[test]
    fn test_gradient_descent_stops_at_min_value() {
        let gd = GradientDescent { learning_rate: 0.5, min_value: -1.0, ..GradientDescent::default() };
        let out = gd.minimize(&|p: &[f64]| -p[0] * p[0], &[0.5]).expect("minimize");
        assert!(out.converged);
        assert_eq!(out.value, -1.0);
        assert!(out.params[0].abs() < 10.0, "{:?}", out.params);
    }

    #[test]
    fn test_minimizer_trait_object() {
        let strategies: Vec<Box<dyn Minimizer>> = vec![
            Box::new(Bfgs::default()),
            Box::new(GradientDescent { learning_rate: 0.2, ..GradientDescent::default() }),
        ];
        for m in &strategies {
            let out = m.minimize(&|p: &[f64]| (p[0] - 1.5).powi(2), &[0.0]).expect("minimize");
            assert_abs_diff_eq!(out.params[0], 1.5, epsilon = 1e-2);
        }
    }
}
