/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Training and inference driver.
//!
//! [`HyperionFuzzy`] owns one collection of hyperspheres per class and runs
//! the full loop:
//!
//! ```text
//! inputs ──FeatureMap──► mapped points
//!   init:   per cluster, one random positive and one random negative point;
//!           radius = ‖p − n‖ / 2, elements = every point of the class
//!   epoch:  clear logs → classify_and_contribute(every point) → refine
//!   stop:   after `epochs`, or once a whole class recorded nothing
//! ```
//!
//! Initialisation draws from a [`ChaCha8Rng`] seeded with
//! [`HyperionConfig::seed`], so training is reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::classify::{check_spheres, classify_and_contribute, FuzzyOutcome};
use crate::config::HyperionConfig;
use crate::error::{ensure_dim, HyperionError, HyperionResult};
use crate::hypersphere::{Hypersphere, Label};
use crate::kernel::squared_distance;
use crate::minimize::Minimizer;
use crate::optimize::{refine_with, RefineParams};
use crate::predict::predict_batch;

/// Summary of a [`HyperionFuzzy::train`] run. Counts describe the last epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainReport {
    /// Epochs actually run.
    pub epochs: usize,
    /// Points logged on some hypersphere.
    pub assigned: usize,
    /// Points that tied exactly.
    pub undecided: usize,
    /// Mean contribution over assigned points (`0.0` when none).
    pub mean_contribution: f64,
    /// Training ended before `epochs` because a class recorded no assignments.
    pub stopped_early: bool,
}

/// Twin-hypersphere fuzzy classifier.
#[derive(Clone, Debug)]
pub struct HyperionFuzzy {
    config: HyperionConfig,
    positive: Vec<Hypersphere>,
    negative: Vec<Hypersphere>,
}

impl HyperionFuzzy {
    /// Untrained classifier. Fails if `config` does not validate.
    pub fn new(config: HyperionConfig) -> HyperionResult<Self> {
        config.validate()?;
        Ok(Self { config, positive: Vec::new(), negative: Vec::new() })
    }

    /// Classifier over existing hyperspheres (already in mapped feature space).
    pub fn from_hyperspheres(
        config: HyperionConfig,
        positive: Vec<Hypersphere>,
        negative: Vec<Hypersphere>,
    ) -> HyperionResult<Self> {
        config.validate()?;
        let dim = positive.first().map(Hypersphere::dim).unwrap_or_default();
        check_spheres(dim, &positive, &negative)?;
        Ok(Self { config, positive, negative })
    }

    /// Active configuration.
    pub fn config(&self) -> &HyperionConfig {
        &self.config
    }

    /// Positive-class hyperspheres.
    pub fn positive_hyperspheres(&self) -> &[Hypersphere] {
        &self.positive
    }

    /// Negative-class hyperspheres.
    pub fn negative_hyperspheres(&self) -> &[Hypersphere] {
        &self.negative
    }

    /// Whether both classes have hyperspheres.
    pub fn is_trained(&self) -> bool {
        !self.positive.is_empty() && !self.negative.is_empty()
    }

    /// Fit the classifier. Any previous hyperspheres are replaced.
    ///
    /// `labels[i]` is the class of `data[i]` and must not be
    /// [`Label::Undecided`]. Every class needs at least `num_clusters` points.
    /// Refinement uses the quasi-Newton minimizer from the configuration.
    pub fn train<P: AsRef<[f64]>>(&mut self, data: &[P], labels: &[Label]) -> HyperionResult<TrainReport> {
        let minimizer = self.config.refine_params().bfgs();
        self.train_with(data, labels, &minimizer)
    }

    /// [`HyperionFuzzy::train`] with a caller-chosen refinement minimizer.
    ///
    /// The new hyperspheres are built and trained on their own and replace
    /// the model's only when every epoch succeeds. On error the model keeps
    /// whatever it had before the call.
    pub fn train_with<P, M>(&mut self, data: &[P], labels: &[Label], minimizer: &M) -> HyperionResult<TrainReport>
    where
        P: AsRef<[f64]>,
        M: Minimizer + ?Sized,
    {
        if data.len() != labels.len() {
            return Err(HyperionError::InvalidParameter(format!(
                "{} points but {} labels",
                data.len(),
                labels.len()
            )));
        }
        let mapped = self.map_points(data)?;

        let mut pos_points = Vec::new();
        let mut neg_points = Vec::new();
        for (x, &label) in mapped.iter().zip(labels) {
            match label {
                Label::Positive => pos_points.push(x.clone()),
                Label::Negative => neg_points.push(x.clone()),
                Label::Undecided => return Err(HyperionError::InvalidLabel(0)),
            }
        }
        let (mut positive, mut negative) = self.init_hyperspheres(pos_points, neg_points)?;
        let report = run_epochs(&self.config, &mut positive, &mut negative, &mapped, minimizer)?;

        self.positive = positive;
        self.negative = negative;
        Ok(report)
    }

    /// One classification pass over `data` on fresh assignment logs.
    ///
    /// Returns one outcome per point, in order. Spheres are not refined.
    pub fn fuzzy_pass<P: AsRef<[f64]>>(&mut self, data: &[P]) -> HyperionResult<Vec<FuzzyOutcome>> {
        let mapped = self.map_points(data)?;
        pass(&self.config, &mut self.positive, &mut self.negative, &mapped)
    }

    /// Predict a label per point, preserving order.
    pub fn predict<P: AsRef<[f64]>>(&self, data: &[P]) -> HyperionResult<Vec<Label>> {
        let mapped = self.map_points(data)?;
        predict_batch(&mapped, &self.positive, &self.negative, self.config.sigma)
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    /// Apply the feature map; every point must share the first point's
    /// dimension and map to finite values.
    fn map_points<P: AsRef<[f64]>>(&self, data: &[P]) -> HyperionResult<Vec<Vec<f64>>> {
        let dim = data.first().map(|p| p.as_ref().len()).unwrap_or_default();
        data.iter()
            .map(|p| {
                ensure_dim(dim, p.as_ref().len())?;
                let x = self.config.feature_map.apply(p.as_ref());
                if x.iter().all(|v| v.is_finite()) {
                    Ok(x)
                } else {
                    Err(HyperionError::Numerical(format!("non-finite mapped point {x:?}")))
                }
            })
            .collect()
    }

    fn init_hyperspheres(
        &self,
        pos_points: Vec<Vec<f64>>,
        neg_points: Vec<Vec<f64>>,
    ) -> HyperionResult<(Vec<Hypersphere>, Vec<Hypersphere>)> {
        let k = self.config.num_clusters;
        for (label, found) in [(Label::Positive, pos_points.len()), (Label::Negative, neg_points.len())] {
            if found < k {
                return Err(HyperionError::InsufficientData { label, required: k, found });
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut positive = Vec::with_capacity(k);
        let mut negative = Vec::with_capacity(k);
        for _ in 0..k {
            let p = &pos_points[rng.gen_range(0..pos_points.len())];
            let n = &neg_points[rng.gen_range(0..neg_points.len())];
            let radius = squared_distance(p, n).sqrt() / 2.0;
            positive.push(Hypersphere::new(p.clone(), radius, pos_points.clone())?);
            negative.push(Hypersphere::new(n.clone(), radius, neg_points.clone())?);
        }
        tracing::debug!(clusters = k, dim = positive[0].dim(), "initialised hyperspheres");
        Ok((positive, negative))
    }
}

// ─── Epoch loop ─────────────────────────────────────────────────────────────

fn pass(
    config: &HyperionConfig,
    positive: &mut [Hypersphere],
    negative: &mut [Hypersphere],
    mapped: &[Vec<f64>],
) -> HyperionResult<Vec<FuzzyOutcome>> {
    let params = config.fuzzy_params();
    for hs in positive.iter_mut().chain(negative.iter_mut()) {
        hs.clear_assignments();
    }
    mapped
        .iter()
        .map(|x| classify_and_contribute(x, positive, negative, &params))
        .collect()
}

/// Refine every sphere of `own` that recorded something against `others`.
fn refine_class<M: Minimizer + ?Sized>(
    own: &mut [Hypersphere],
    others: &[Hypersphere],
    params: &RefineParams,
    minimizer: &M,
) -> HyperionResult<()> {
    for hs in own.iter_mut().filter(|hs| !hs.assignments().is_empty()) {
        refine_with(hs, others, params, minimizer)?;
    }
    Ok(())
}

fn run_epochs<M: Minimizer + ?Sized>(
    config: &HyperionConfig,
    positive: &mut [Hypersphere],
    negative: &mut [Hypersphere],
    mapped: &[Vec<f64>],
    minimizer: &M,
) -> HyperionResult<TrainReport> {
    let mut report = TrainReport {
        epochs: 0,
        assigned: 0,
        undecided: 0,
        mean_contribution: 0.0,
        stopped_early: false,
    };
    let refine_params = config.refine_params();

    for epoch in 0..config.epochs {
        let outcomes = pass(config, positive, negative, mapped)?;

        if config.refine {
            refine_class(positive, negative, &refine_params, minimizer)?;
            refine_class(negative, positive, &refine_params, minimizer)?;
        }

        let assigned: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.label != Label::Undecided)
            .map(|o| o.contribution)
            .collect();
        report.epochs = epoch + 1;
        report.assigned = assigned.len();
        report.undecided = outcomes.len() - assigned.len();
        report.mean_contribution = if assigned.is_empty() {
            0.0
        } else {
            assigned.iter().sum::<f64>() / assigned.len() as f64
        };
        tracing::info!(
            epoch = report.epochs,
            assigned = report.assigned,
            undecided = report.undecided,
            mean_contribution = report.mean_contribution,
            "fuzzy epoch complete"
        );

        let idle = |spheres: &[Hypersphere]| spheres.iter().all(|hs| hs.assignments().is_empty());
        if idle(positive) || idle(negative) {
            report.stopped_early = report.epochs < config.epochs;
            break;
        }
    }
    Ok(report)
}
