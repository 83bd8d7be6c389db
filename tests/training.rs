//! End-to-end tests: refinement and the full training loop.

use approx::assert_abs_diff_eq;
use hyperion_fuzzy::{
    refine, refine_with, squared_distance, FeatureMap, HyperionConfig, HyperionError,
    HyperionFuzzy, Hypersphere, Label, RefineParams,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ─── helpers ─────────────────────────────────────────────────────────────────

/// Two uniform blobs of `n` points each, around (0, 0) and (3, 3).
fn blobs(n: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<Label>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(2 * n);
    let mut labels = Vec::with_capacity(2 * n);
    for (origin, label) in [(0.0, Label::Positive), (3.0, Label::Negative)] {
        for _ in 0..n {
            data.push(vec![origin + rng.gen_range(-0.3..0.3), origin + rng.gen_range(-0.3..0.3)]);
            labels.push(label);
        }
    }
    (data, labels)
}

fn identity_config() -> HyperionConfig {
    HyperionConfig {
        sigma: 1.0,
        feature_map: FeatureMap::Identity,
        refine: false,
        ..HyperionConfig::default()
    }
}

// ─── refine ──────────────────────────────────────────────────────────────────

#[test]
fn test_refine_alone_drives_radius_to_zero() {
    let mut hs = Hypersphere::new(vec![0.5, -1.0, 2.0], 4.0, vec![vec![0.0, 0.0, 0.0]])
        .expect("valid sphere");
    let params = RefineParams { c1: 0.0, ..RefineParams::default() };

    let out = refine(&mut hs, &[], &params).expect("refine");

    assert!(out.converged, "objective r² must converge");
    assert!(hs.radius() < 1e-6, "radius should vanish, got {}", hs.radius());
    assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-9);
    assert_eq!(hs.center(), &[0.5, -1.0, 2.0], "center has zero gradient");
}

#[test]
fn test_refine_fallback_minimizer() {
    let mut hs = Hypersphere::new(vec![1.0], 2.0, Vec::new()).expect("valid sphere");
    let params = RefineParams {
        c1: 0.0,
        learning_rate: 0.1,
        max_iterations: 2000,
        tolerance: 1e-12,
        ..RefineParams::default()
    };

    let out = refine_with(&mut hs, &[], &params, &params.gradient_descent()).expect("refine");

    assert!(out.converged);
    assert!(hs.radius() < 1e-4, "radius {}", hs.radius());
}

// ─── training ────────────────────────────────────────────────────────────────

#[test]
fn test_separated_blobs_train_and_predict() {
    let (data, labels) = blobs(20, 3);
    let mut model = HyperionFuzzy::new(identity_config()).expect("valid config");

    let report = model.train(&data, &labels).expect("train");
    assert!(report.epochs >= 1 && report.epochs <= 5);
    assert_eq!(report.assigned + report.undecided, data.len());

    let predicted = model.predict(&data).expect("predict");
    assert_eq!(predicted, labels, "well-separated blobs must be recovered");
}

#[test]
fn test_training_with_refinement_stays_finite() {
    let (data, labels) = blobs(10, 5);
    let config = HyperionConfig { refine: true, refine_max_iterations: 25, ..identity_config() };
    let mut model = HyperionFuzzy::new(config).expect("valid config");

    let report = model.train(&data, &labels).expect("train");
    assert!(report.epochs >= 1);
    for hs in model.positive_hyperspheres().iter().chain(model.negative_hyperspheres()) {
        assert!(hs.radius().is_finite() && hs.radius() >= 0.0);
        assert!(hs.center().iter().all(|v| v.is_finite()));
    }
    assert_eq!(model.predict(&data).expect("predict").len(), data.len());
}

#[test]
fn test_refined_training_keeps_assigning() {
    let (data, labels) = blobs(10, 5);
    let config = HyperionConfig { refine: true, epochs: 2, ..identity_config() };
    let mut model = HyperionFuzzy::new(config).expect("valid config");

    let report = model.train(&data, &labels).expect("train");
    assert_eq!(report.epochs, 2, "refinement must not empty a class after one epoch");
    assert!(report.assigned > 0, "second epoch assigned nothing: {report:?}");
    for hs in model.positive_hyperspheres().iter().chain(model.negative_hyperspheres()) {
        let nearest = data
            .iter()
            .map(|x| squared_distance(x, hs.center()))
            .fold(f64::INFINITY, f64::min);
        assert!(nearest.sqrt() < 20.0, "center left the data: {:?}", hs.center());
    }
}

#[test]
fn test_default_exp_feature_map_trains() {
    let (data, labels) = blobs(8, 9);
    let config = HyperionConfig { sigma: 5.0, refine: false, ..HyperionConfig::default() };
    let mut model = HyperionFuzzy::new(config).expect("valid config");
    model.train(&data, &labels).expect("train");

    // spheres live in mapped space: every center is exp() of a training point
    for hs in model.positive_hyperspheres() {
        assert!(hs.center().iter().all(|&v| v > 0.0));
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = HyperionConfig { sigma: 0.0, ..HyperionConfig::default() };
    assert!(matches!(HyperionFuzzy::new(config), Err(HyperionError::Config(_))));
}

#[test]
fn test_too_few_points_per_class() {
    let data = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
    let labels = vec![Label::Positive, Label::Positive, Label::Negative];
    let mut model = HyperionFuzzy::new(identity_config()).expect("valid config");
    assert_eq!(
        model.train(&data, &labels),
        Err(HyperionError::InsufficientData { label: Label::Negative, required: 2, found: 1 })
    );
}
