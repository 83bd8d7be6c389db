//! Criterion benchmarks for the kernel, classification and batch prediction paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use hyperion_fuzzy::{
    classify_and_contribute, conformal_kernel, predict_batch, FuzzyParams, Hypersphere,
};

const DIM: usize = 8;

fn points(rng: &mut ChaCha8Rng, n: usize, offset: f64) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| (0..DIM).map(|_| offset + rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

fn spheres(rng: &mut ChaCha8Rng, k: usize, n_elements: usize, offset: f64) -> Vec<Hypersphere> {
    (0..k)
        .map(|_| {
            let elements = points(rng, n_elements, offset);
            let center = elements[0].clone();
            Hypersphere::new(center, 1.0, elements).expect("valid sphere")
        })
        .collect()
}

// ── conformal_kernel ────────────────────────────────────────────────

fn bench_conformal_kernel(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let hs = spheres(&mut rng, 1, 64, 0.0).remove(0);
    let x = points(&mut rng, 1, 0.0).remove(0);
    c.bench_function("conformal_kernel_64el", |b| {
        b.iter(|| conformal_kernel(black_box(&x), hs.center(), &hs, 1.0, 1e-7))
    });
}

// ── classify_and_contribute ─────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let pos = spheres(&mut rng, 4, 32, 0.0);
    let neg = spheres(&mut rng, 4, 32, 2.0);
    let x = points(&mut rng, 1, 1.0).remove(0);
    let params = FuzzyParams::new(1.0, 1.0, 1e-7);
    c.bench_function("classify_4x4_spheres", |b| {
        b.iter_batched(
            || (pos.clone(), neg.clone()),
            |(mut p, mut n)| classify_and_contribute(black_box(&x), &mut p, &mut n, &params),
            criterion::BatchSize::SmallInput,
        )
    });
}

// ── predict_batch ───────────────────────────────────────────────────

fn bench_predict_batch(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let pos = spheres(&mut rng, 4, 32, 0.0);
    let neg = spheres(&mut rng, 4, 32, 2.0);
    let batch = points(&mut rng, 1000, 1.0);
    c.bench_function("predict_batch_1000", |b| {
        b.iter(|| predict_batch(black_box(&batch), &pos, &neg, 1.0))
    });
}

criterion_group!(benches, bench_conformal_kernel, bench_classify, bench_predict_batch);
criterion_main!(benches);
