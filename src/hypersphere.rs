/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Hypersphere data model.
//!
//! - [`Hypersphere`]: center, radius, anchoring elements, their mean and an
//!   append-only assignment log.
//! - [`Assignment`]: one `(point, label, weight)` record in that log.
//! - [`Label`]: the two classes plus the undecided outcome.
//!
//! # Invariants
//!
//! - `center`, `mean` and every element share one dimension `D`, fixed at construction.
//! - `radius >= 0` and finite.
//! - `mean` is always the element-wise average of `elements` (zero vector when empty).
//!   Elements are immutable after construction, so the mean never goes stale.
//! - The assignment log grows only through classification and shrinks only via
//!   [`Hypersphere::clear_assignments`].

use core::fmt;

use crate::error::{ensure_dim, HyperionError, HyperionResult};

// ─── Label ──────────────────────────────────────────────────────────────────

/// Class label produced by classification and stored in assignments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Label {
    /// The positive class, `+1`.
    Positive,
    /// The negative class, `-1`.
    Negative,
    /// Exact tie between the classes, `0`. Never mapped to either class.
    Undecided,
}

impl Label {
    /// Numeric value: `+1`, `-1` or `0`.
    pub fn value(self) -> i8 {
        match self {
            Label::Positive => 1,
            Label::Negative => -1,
            Label::Undecided => 0,
        }
    }

    /// Parse a training label. Only `+1` and `-1` are accepted.
    pub fn from_class_value(value: i64) -> HyperionResult<Self> {
        match value {
            1 => Ok(Label::Positive),
            -1 => Ok(Label::Negative),
            other => Err(HyperionError::InvalidLabel(other)),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Label::Positive => "positive",
            Label::Negative => "negative",
            Label::Undecided => "undecided",
        })
    }
}

// ─── Assignment ─────────────────────────────────────────────────────────────

/// A point claimed by a hypersphere during classification.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    /// The classified point (owned copy).
    pub point: Vec<f64>,
    /// Predicted class, never [`Label::Undecided`].
    pub label: Label,
    /// Fuzzy contribution of the point, in `(−∞, 1)`.
    pub weight: f64,
}

// ─── Hypersphere ────────────────────────────────────────────────────────────

/// One class cluster: a sphere in feature space plus the training points
/// that shape its conformal geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Hypersphere {
    center: Vec<f64>,
    radius: f64,
    elements: Vec<Vec<f64>>,
    /// Element-wise mean of `elements` ("ux").
    mean: Vec<f64>,
    assignments: Vec<Assignment>,
}

impl Hypersphere {
    /// Build a hypersphere, taking ownership of its center and elements.
    ///
    /// The feature dimension is `center.len()`; every element must match it.
    /// Fails on an empty center, a negative or non-finite radius, a
    /// non-finite coordinate, or a mismatched element.
    pub fn new(center: Vec<f64>, radius: f64, elements: Vec<Vec<f64>>) -> HyperionResult<Self> {
        if center.is_empty() {
            return Err(HyperionError::InvalidParameter(
                "hypersphere center must have at least one coordinate".into(),
            ));
        }
        check_radius(radius)?;
        check_finite("center", &center)?;
        for e in &elements {
            ensure_dim(center.len(), e.len())?;
            check_finite("element", e)?;
        }
        let mean = element_mean(&elements, center.len());
        Ok(Self { center, radius, elements, mean, assignments: Vec::new() })
    }

    /// Build a hypersphere from a row-major buffer of `elements.len() / D` points.
    pub fn from_flat(center: Vec<f64>, radius: f64, flat_elements: &[f64]) -> HyperionResult<Self> {
        let dim = center.len();
        if dim == 0 || flat_elements.len() % dim != 0 {
            return Err(HyperionError::DimensionMismatch {
                expected: dim,
                found: flat_elements.len(),
            });
        }
        let elements = flat_elements.chunks_exact(dim).map(<[f64]>::to_vec).collect();
        Self::new(center, radius, elements)
    }

    /// Feature dimension `D`.
    pub fn dim(&self) -> usize {
        self.center.len()
    }

    /// Current center.
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    /// Current radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Anchoring elements.
    pub fn elements(&self) -> &[Vec<f64>] {
        &self.elements
    }

    /// Element-wise mean of the anchoring elements.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Assignment log, in recording order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Sum of the weights of every recorded assignment.
    pub fn assignment_weight_total(&self) -> f64 {
        self.assignments.iter().map(|a| a.weight).sum()
    }

    /// Replace the center. The new center must keep dimension `D` and be finite.
    pub fn set_center(&mut self, center: Vec<f64>) -> HyperionResult<()> {
        ensure_dim(self.dim(), center.len())?;
        check_finite("center", &center)?;
        self.center = center;
        Ok(())
    }

    /// Replace the radius. Must be finite and non-negative.
    pub fn set_radius(&mut self, radius: f64) -> HyperionResult<()> {
        check_radius(radius)?;
        self.radius = radius;
        Ok(())
    }

    /// Drop every recorded assignment.
    pub fn clear_assignments(&mut self) {
        self.assignments.clear();
    }

    /// Append to the log. Only the classification engine records assignments.
    pub(crate) fn record_assignment(&mut self, point: Vec<f64>, label: Label, weight: f64) {
        debug_assert_ne!(label, Label::Undecided);
        self.assignments.push(Assignment { point, label, weight });
    }
}

fn check_radius(radius: f64) -> HyperionResult<()> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(HyperionError::InvalidParameter(format!(
            "radius must be finite and non-negative, got {radius}"
        )))
    }
}

fn check_finite(what: &str, coords: &[f64]) -> HyperionResult<()> {
    match coords.iter().find(|v| !v.is_finite()) {
        None => Ok(()),
        Some(v) => Err(HyperionError::InvalidParameter(format!(
            "{what} coordinates must be finite, got {v}"
        ))),
    }
}

/// Coordinate-wise arithmetic mean; zero vector of length `dim` when empty.
fn element_mean(elements: &[Vec<f64>], dim: usize) -> Vec<f64> {
    let mut mean = vec![0.0; dim];
    if elements.is_empty() {
        return mean;
    }
    for e in elements {
        for (m, &v) in mean.iter_mut().zip(e) {
            *m += v;
        }
    }
    let n = elements.len() as f64;
    for m in mean.iter_mut() {
        *m /= n;
    }
    mean
}
