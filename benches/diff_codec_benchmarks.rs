use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lef::diff::{encode_layer_diff, DiffContext};
use lef::format::LayerKind;

fn synthetic_layer(len: usize, seed: u32) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let x = (i as u32).wrapping_mul(2654435761).wrapping_add(seed);
            (x % 1000) as f32 / 1000.0 - 0.5
        })
        .collect()
}

fn bench_encode_layer_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_layer_diff");
    let base = synthetic_layer(4096, 1);

    for level in 1..=5u8 {
        let ctx = DiffContext::optimization_level_to_params(level, 1e-4);
        let mut speaker = base.clone();
        for (i, v) in speaker.iter_mut().enumerate() {
            if i % 3 == 0 {
                *v += 0.1;
            }
        }

        group.bench_with_input(BenchmarkId::new("level", level), &level, |b, _| {
            b.iter(|| {
                encode_layer_diff(black_box(&base), black_box(&speaker), LayerKind::Linear, black_box(&ctx))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_encode_identical_layer_short_circuits(c: &mut Criterion) {
    let base = synthetic_layer(16384, 7);
    let ctx = DiffContext::optimization_level_to_params(3, 1e-4);

    c.bench_function("encode_layer_diff_skipped_identical", |b| {
        b.iter(|| encode_layer_diff(black_box(&base), black_box(&base), LayerKind::Linear, black_box(&ctx)).unwrap())
    });
}

criterion_group!(benches, bench_encode_layer_diff, bench_encode_identical_layer_short_circuits);
criterion_main!(benches);
