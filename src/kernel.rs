/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Conformal kernel: squared distance, RBF, conformal factor and their composition.
//!
//! ```text
//! K̃(x, x') = G(x) · exp(−‖x − x'‖² / 2σ²) · G(x')
//! G(x)     = Σₑ exp(−‖e − x‖² / (‖ux − e‖² + ε))      e ∈ sphere.elements
//! ```
//!
//! All functions are pure. Vectors must share one dimension; a mismatch is a
//! caller error and panics rather than truncating. The engine entry points in
//! [`crate::classify`], [`crate::predict`] and [`crate::optimize`] validate
//! dimensions up front and never reach that panic.

use crate::hypersphere::Hypersphere;

/// Sum over dimensions of `(a_i − b_i)²`.
///
/// # Panics
///
/// If `a` and `b` have different lengths.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "squared_distance: dimension mismatch");
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Gaussian RBF kernel `exp(−‖a − b‖² / 2σ²)`.
///
/// `sigma` must be nonzero. `rbf(a, a, σ) == 1` for every `a`.
pub fn rbf(a: &[f64], b: &[f64], sigma: f64) -> f64 {
    (-squared_distance(a, b) / (2.0 * sigma * sigma)).exp()
}

/// Conformal factor `G(x)` of `x` relative to `sphere`'s anchoring elements.
///
/// Returns `0.0` when the sphere has no elements. With `epsilon == 0` an
/// element equal to the mean has a zero denominator; that term evaluates to
/// its limit, `1.0` when `x` coincides with the element and `0.0` otherwise.
pub fn conformal_factor(x: &[f64], sphere: &Hypersphere, epsilon: f64) -> f64 {
    let ux = sphere.mean();
    sphere
        .elements()
        .iter()
        .map(|e| {
            let spread = squared_distance(ux, e) + epsilon;
            let dist = squared_distance(e, x);
            if spread == 0.0 {
                if dist == 0.0 { 1.0 } else { 0.0 }
            } else {
                (-dist / spread).exp()
            }
        })
        .sum()
}

/// Conformal kernel between `x` and `x_prime` under `sphere`'s geometry.
///
/// Symmetric in `x` / `x_prime`: both factors use the same sphere.
pub fn conformal_kernel(
    x: &[f64],
    x_prime: &[f64],
    sphere: &Hypersphere,
    sigma: f64,
    epsilon: f64,
) -> f64 {
    conformal_factor(x, sphere, epsilon) * rbf(x, x_prime, sigma) * conformal_factor(x_prime, sphere, epsilon)
}

/// Kernel of `x` against the sphere's own center.
#[inline]
pub(crate) fn center_kernel(x: &[f64], sphere: &Hypersphere, sigma: f64, epsilon: f64) -> f64 {
    conformal_kernel(x, sphere.center(), sphere, sigma, epsilon)
}
