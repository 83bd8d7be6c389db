//! Python FFI bindings via PyO3.
//!
//! Exposes hyperspheres, the engine functions and the full classifier to
//! Python. Hyperspheres cross the boundary by value: engine calls work on
//! copies and write the changed sphere back into its Python handle.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from hyperion_fuzzy import HyperionFuzzy
//!
//! model = HyperionFuzzy(num_clusters=2, sigma=0.5)
//! model.train([[0.0, 0.1], [0.2, 0.0], [3.0, 3.1], [3.2, 3.0]], [1, 1, -1, -1])
//! print(model.predict([[0.1, 0.1], [3.1, 3.1]]))  # [1, -1]
//! ```

#![allow(non_snake_case)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::classify::{classify_and_contribute, FuzzyParams};
use crate::config::{FeatureMap, HyperionConfig};
use crate::error::HyperionError;
use crate::hypersphere::{Hypersphere, Label};
use crate::model::HyperionFuzzy;
use crate::optimize::{refine, RefineParams};
use crate::predict::predict_batch;

impl From<HyperionError> for PyErr {
    fn from(err: HyperionError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn snapshot(py: Python<'_>, handles: &[Py<PyHypersphere>]) -> Vec<Hypersphere> {
    handles.iter().map(|h| h.borrow(py).inner.clone()).collect()
}

// ── Hypersphere ───────────────────────────────────────────────────────────────

/// A class hypersphere: center, radius, anchoring elements and assignment log.
#[pyclass(name = "Hypersphere")]
#[derive(Clone)]
pub struct PyHypersphere {
    inner: Hypersphere,
}

#[pymethods]
impl PyHypersphere {
    /// Create a hypersphere.
    ///
    /// Args:
    ///     center:           list of floats, fixes the dimension
    ///     radius:           non-negative float
    ///     initial_elements: list of points with the center's dimension
    #[new]
    pub fn new(center: Vec<f64>, radius: f64, initial_elements: Vec<Vec<f64>>) -> PyResult<Self> {
        Ok(Self { inner: Hypersphere::new(center, radius, initial_elements)? })
    }

    /// Replace the center (same dimension).
    pub fn set_center(&mut self, new_center: Vec<f64>) -> PyResult<()> {
        Ok(self.inner.set_center(new_center)?)
    }

    /// Current center.
    pub fn get_center(&self) -> Vec<f64> {
        self.inner.center().to_vec()
    }

    /// Replace the radius (finite, non-negative).
    pub fn set_radius(&mut self, new_radius: f64) -> PyResult<()> {
        Ok(self.inner.set_radius(new_radius)?)
    }

    /// Current radius.
    pub fn get_radius(&self) -> f64 {
        self.inner.radius()
    }

    /// Mean of the anchoring elements.
    pub fn get_ux(&self) -> Vec<f64> {
        self.inner.mean().to_vec()
    }

    /// Anchoring elements.
    pub fn get_initial_elements(&self) -> Vec<Vec<f64>> {
        self.inner.elements().to_vec()
    }

    /// Append `(array, value, weight)` to the log. `value` must be +1 or -1.
    pub fn add_assignment(&mut self, array: Vec<f64>, value: i64, weight: f64) -> PyResult<()> {
        let label = Label::from_class_value(value)?;
        if array.len() != self.inner.dim() {
            return Err(HyperionError::DimensionMismatch {
                expected: self.inner.dim(),
                found: array.len(),
            }
            .into());
        }
        self.inner.record_assignment(array, label, weight);
        Ok(())
    }

    /// Drop every recorded assignment.
    pub fn clear_assignments(&mut self) {
        self.inner.clear_assignments();
    }

    /// Assignment log as `(point, label, weight)` tuples.
    pub fn get_assignments(&self) -> Vec<(Vec<f64>, i8, f64)> {
        self.inner
            .assignments()
            .iter()
            .map(|a| (a.point.clone(), a.label.value(), a.weight))
            .collect()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!(
            "Hypersphere(dim={}, radius={:.4}, elements={}, assignments={})",
            self.inner.dim(),
            self.inner.radius(),
            self.inner.elements().len(),
            self.inner.assignments().len(),
        )
    }
}

// ── Engine functions ──────────────────────────────────────────────────────────

/// Classify `x` and log it on the winning hypersphere.
///
/// Returns:
///     (assigned_class, contribution) with assigned_class in {1, -1, 0}
#[pyfunction]
#[pyo3(signature = (x, positive_hyperspheres, negative_hyperspheres, gamma, sigma, E))]
pub fn fuzzy_contribution(
    py: Python<'_>,
    x: Vec<f64>,
    positive_hyperspheres: Vec<Py<PyHypersphere>>,
    negative_hyperspheres: Vec<Py<PyHypersphere>>,
    gamma: f64,
    sigma: f64,
    E: f64,
) -> PyResult<(i8, f64)> {
    let mut positive = snapshot(py, &positive_hyperspheres);
    let mut negative = snapshot(py, &negative_hyperspheres);
    let outcome = classify_and_contribute(&x, &mut positive, &mut negative, &FuzzyParams::new(gamma, sigma, E))?;

    if let Some(idx) = outcome.winner {
        let (handles, spheres) = match outcome.label {
            Label::Positive => (&positive_hyperspheres, &positive),
            _ => (&negative_hyperspheres, &negative),
        };
        handles[idx].borrow_mut(py).inner = spheres[idx].clone();
    }
    Ok((outcome.label.value(), outcome.contribution))
}

/// Predict a label in {1, -1, 0} for each row of `transformed_data`.
#[pyfunction]
pub fn predict(
    transformed_data: Vec<Vec<f64>>,
    positive_hyperspheres: Vec<PyHypersphere>,
    negative_hyperspheres: Vec<PyHypersphere>,
    sigma: f64,
) -> PyResult<Vec<i8>> {
    let positive: Vec<Hypersphere> = positive_hyperspheres.into_iter().map(|h| h.inner).collect();
    let negative: Vec<Hypersphere> = negative_hyperspheres.into_iter().map(|h| h.inner).collect();
    let labels = predict_batch(&transformed_data, &positive, &negative, sigma)?;
    Ok(labels.into_iter().map(Label::value).collect())
}

/// Refine `hypersphere` in place against `other_hyperspheres`.
///
/// The run stops early once the objective reaches `min_value`.
///
/// Returns:
///     (objective_value, converged)
#[pyfunction]
#[pyo3(signature = (hypersphere, other_hyperspheres, c1, learning_rate, max_iterations, tolerance=1e-6, min_value=-1.0))]
pub fn optimize_hypersphere(
    py: Python<'_>,
    hypersphere: Py<PyHypersphere>,
    other_hyperspheres: Vec<Py<PyHypersphere>>,
    c1: f64,
    learning_rate: f64,
    max_iterations: u32,
    tolerance: f64,
    min_value: f64,
) -> PyResult<(f64, bool)> {
    let others = snapshot(py, &other_hyperspheres);
    let mut target = hypersphere.borrow(py).inner.clone();
    let params = RefineParams { c1, learning_rate, max_iterations, tolerance, min_value };
    let outcome = refine(&mut target, &others, &params)?;
    hypersphere.borrow_mut(py).inner = target;
    Ok((outcome.value, outcome.converged))
}

// ── HyperionFuzzy ─────────────────────────────────────────────────────────────

/// Twin-hypersphere fuzzy classifier.
///
/// Example::
///
///     model = HyperionFuzzy(num_clusters=2, sigma=0.5, epochs=5)
///     report = model.train(X, y)        # y in {1, -1}
///     labels = model.predict(X_test)    # values in {1, -1, 0}
#[pyclass(name = "HyperionFuzzy")]
pub struct PyHyperionFuzzy {
    inner: HyperionFuzzy,
}

#[pymethods]
impl PyHyperionFuzzy {
    /// Create an untrained classifier.
    ///
    /// Args:
    ///     num_clusters: hyperspheres per class (default 2)
    ///     gamma:        contribution regularizer (default 1.0)
    ///     sigma:        RBF width (default 0.005)
    ///     E:            conformal-factor guard (default 1e-7)
    ///     c1:           refinement weight on own assignments (default 1.0)
    ///     epochs:       training passes (default 5)
    ///     refine:       refine spheres after each pass (default True)
    ///     seed:         initialisation seed (default 42)
    ///     exp_features: apply exp() to inputs (default True)
    #[new]
    #[pyo3(signature = (
        num_clusters=2, gamma=1.0, sigma=0.005, E=1e-7, c1=1.0,
        epochs=5, refine=true, seed=42, exp_features=true
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        num_clusters: usize,
        gamma: f64,
        sigma: f64,
        E: f64,
        c1: f64,
        epochs: usize,
        refine: bool,
        seed: u64,
        exp_features: bool,
    ) -> PyResult<Self> {
        let config = HyperionConfig {
            num_clusters,
            gamma,
            sigma,
            epsilon: E,
            c1,
            epochs,
            refine,
            seed,
            feature_map: if exp_features { FeatureMap::Exp } else { FeatureMap::Identity },
            ..HyperionConfig::default()
        };
        Ok(Self { inner: HyperionFuzzy::new(config)? })
    }

    /// Fit on `data` with labels in {1, -1}.
    ///
    /// Returns:
    ///     (epochs, assigned, undecided, mean_contribution) for the last epoch
    pub fn train(&mut self, data: Vec<Vec<f64>>, labels: Vec<i64>) -> PyResult<(usize, usize, usize, f64)> {
        let labels = labels
            .into_iter()
            .map(Label::from_class_value)
            .collect::<Result<Vec<_>, _>>()?;
        let report = self.inner.train(&data, &labels)?;
        Ok((report.epochs, report.assigned, report.undecided, report.mean_contribution))
    }

    /// Predict a label in {1, -1, 0} per row.
    pub fn predict(&self, data: Vec<Vec<f64>>) -> PyResult<Vec<i8>> {
        Ok(self.inner.predict(&data)?.into_iter().map(Label::value).collect())
    }

    /// Copies of the positive-class hyperspheres.
    pub fn positive_hyperspheres(&self) -> Vec<PyHypersphere> {
        self.inner
            .positive_hyperspheres()
            .iter()
            .map(|hs| PyHypersphere { inner: hs.clone() })
            .collect()
    }

    /// Copies of the negative-class hyperspheres.
    pub fn negative_hyperspheres(&self) -> Vec<PyHypersphere> {
        self.inner
            .negative_hyperspheres()
            .iter()
            .map(|hs| PyHypersphere { inner: hs.clone() })
            .collect()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!(
            "HyperionFuzzy(num_clusters={}, trained={})",
            self.inner.config().num_clusters,
            self.inner.is_trained()
        )
    }
}

// ── Module entry point ────────────────────────────────────────────────────────

/// Conformal-kernel hypersphere fuzzy classifier bindings.
#[pymodule]
pub fn hyperion_fuzzy(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyHypersphere>()?;
    m.add_class::<PyHyperionFuzzy>()?;
    m.add_function(wrap_pyfunction!(fuzzy_contribution, m)?)?;
    m.add_function(wrap_pyfunction!(predict, m)?)?;
    m.add_function(wrap_pyfunction!(optimize_hypersphere, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
