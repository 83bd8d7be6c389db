//! # Two-cluster walkthrough
//!
//! Trains the classifier on two noisy 2-D clusters, reports the per-epoch
//! progress through `tracing`, then scores a held-out grid.
//!
//! Run with: `RUST_LOG=hyperion_fuzzy=debug cargo run --example two_clusters`

use hyperion_fuzzy::{FeatureMap, HyperionConfig, HyperionFuzzy, HyperionResult, Label};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

fn cluster(rng: &mut ChaCha8Rng, n: usize, cx: f64, cy: f64) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| vec![cx + rng.gen_range(-0.6..0.6), cy + rng.gen_range(-0.6..0.6)])
        .collect()
}

fn main() -> HyperionResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let pos = cluster(&mut rng, 40, 0.0, 0.0);
    let neg = cluster(&mut rng, 40, 2.5, 2.0);

    let data: Vec<Vec<f64>> = pos.iter().chain(&neg).cloned().collect();
    let labels: Vec<Label> = std::iter::repeat(Label::Positive)
        .take(pos.len())
        .chain(std::iter::repeat(Label::Negative).take(neg.len()))
        .collect();

    let config = HyperionConfig {
        num_clusters: 3,
        sigma: 1.0,
        feature_map: FeatureMap::Identity,
        ..HyperionConfig::default()
    };
    let mut model = HyperionFuzzy::new(config)?;
    let report = model.train(&data, &labels)?;
    println!(
        "trained {} epoch(s): {} assigned, {} undecided, mean contribution {:.4}{}",
        report.epochs,
        report.assigned,
        report.undecided,
        report.mean_contribution,
        if report.stopped_early { " (stopped early)" } else { "" },
    );

    for (name, spheres) in [
        ("positive", model.positive_hyperspheres()),
        ("negative", model.negative_hyperspheres()),
    ] {
        for (i, hs) in spheres.iter().enumerate() {
            println!(
                "  {name}[{i}] center=({:.3}, {:.3}) radius={:.4}",
                hs.center()[0],
                hs.center()[1],
                hs.radius()
            );
        }
    }

    let predicted = model.predict(&data)?;
    let correct = predicted.iter().zip(&labels).filter(|(p, l)| p == l).count();
    println!("training accuracy: {correct}/{}", labels.len());

    println!("\ngrid (+ positive, - negative, . undecided):");
    for row in 0..9 {
        let y = 3.5 - 0.5 * row as f64;
        let line: Vec<Vec<f64>> = (0..11).map(|col| vec![-1.0 + 0.45 * col as f64, y]).collect();
        let marks: String = model
            .predict(&line)?
            .into_iter()
            .map(|l| match l {
                Label::Positive => '+',
                Label::Negative => '-',
                Label::Undecided => '.',
            })
            .collect();
        println!("  {marks}");
    }
    Ok(())
}
