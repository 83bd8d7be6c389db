/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Batch label prediction by best class membership.
//!
//! Unlike [`crate::classify`], prediction reads the conformal kernel as a
//! *membership*: each class scores a point by its best-matching sphere (the
//! maximum kernel), and the higher class wins. Equal scores give
//! [`Label::Undecided`]. Nothing is mutated and no contribution is computed.
//!
//! Prediction always runs with `epsilon = 0`. An element sitting exactly on
//! its sphere's mean then contributes its limit value (see
//! [`crate::kernel::conformal_factor`]) instead of dividing by zero.
//!
//! With the `parallel` feature, points are scored on the rayon pool; output
//! order always matches input order.

use crate::classify::{check_sigma, check_spheres};
use crate::error::{ensure_dim, HyperionError, HyperionResult};
use crate::hypersphere::{Hypersphere, Label};
use crate::kernel::center_kernel;

/// Highest center kernel across `spheres`. Any non-finite kernel is an error.
fn best_membership(x: &[f64], spheres: &[Hypersphere], sigma: f64) -> HyperionResult<f64> {
    spheres.iter().enumerate().try_fold(f64::NEG_INFINITY, |best, (i, hs)| {
        let k = center_kernel(x, hs, sigma, 0.0);
        if !k.is_finite() {
            return Err(HyperionError::Numerical(format!("non-finite membership {k} at sphere {i}")));
        }
        Ok(best.max(k))
    })
}

fn membership_label(
    x: &[f64],
    positive: &[Hypersphere],
    negative: &[Hypersphere],
    sigma: f64,
) -> HyperionResult<Label> {
    let max_pos = best_membership(x, positive, sigma)?;
    let max_neg = best_membership(x, negative, sigma)?;
    Ok(if max_pos > max_neg {
        Label::Positive
    } else if max_neg > max_pos {
        Label::Negative
    } else {
        Label::Undecided
    })
}

/// Predict one point. Validates like [`predict_batch`].
pub fn predict_point(
    x: &[f64],
    positive: &[Hypersphere],
    negative: &[Hypersphere],
    sigma: f64,
) -> HyperionResult<Label> {
    check_sigma(sigma)?;
    check_spheres(x.len(), positive, negative)?;
    membership_label(x, positive, negative, sigma)
}

/// Predict a label for every point, preserving order.
///
/// Fails fast on an empty class, a zero or non-finite `sigma`, or any point or
/// sphere whose dimension differs from the first positive sphere's. A point
/// whose membership is not finite against any sphere fails the whole batch.
pub fn predict_batch<P>(
    points: &[P],
    positive: &[Hypersphere],
    negative: &[Hypersphere],
    sigma: f64,
) -> HyperionResult<Vec<Label>>
where
    P: AsRef<[f64]> + Sync,
{
    check_sigma(sigma)?;
    let dim = positive.first().map(Hypersphere::dim).unwrap_or_default();
    check_spheres(dim, positive, negative)?;
    for p in points {
        ensure_dim(dim, p.as_ref().len())?;
    }

    #[cfg(feature = "parallel")]
    let labels = {
        use rayon::prelude::*;
        points
            .par_iter()
            .map(|x| membership_label(x.as_ref(), positive, negative, sigma))
            .collect::<HyperionResult<Vec<_>>>()
    };
    #[cfg(not(feature = "parallel"))]
    let labels = points
        .iter()
        .map(|x| membership_label(x.as_ref(), positive, negative, sigma))
        .collect::<HyperionResult<Vec<_>>>();

    labels
}

/// [`predict_batch`] over a row-major buffer of `data.len() / dim` points.
pub fn predict_flat(
    data: &[f64],
    dim: usize,
    positive: &[Hypersphere],
    negative: &[Hypersphere],
    sigma: f64,
) -> HyperionResult<Vec<Label>> {
    if dim == 0 || data.len() % dim != 0 {
        return Err(HyperionError::DimensionMismatch { expected: dim, found: data.len() });
    }
    let rows: Vec<&[f64]> = data.chunks_exact(dim).collect();
    predict_batch(&rows, positive, negative, sigma)
}
