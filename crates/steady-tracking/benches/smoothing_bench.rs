use criterion::{black_box, criterion_group, criterion_main, Criterion};
use steady_core::RigidMotion;
use steady_tracking::trajectory::corrective_motions;

fn bench_corrective_motions(c: &mut Criterion) {
    let motions: Vec<RigidMotion> = (0..10_000)
        .map(|i| {
            let t = i as f32 * 0.1;
            RigidMotion::new(t.sin() * 2.0, t.cos() * 1.5, (t * 0.3).sin() * 0.01)
        })
        .collect();

    c.bench_function("corrective_motions_10k_window_30", |b| {
        b.iter(|| corrective_motions(black_box(&motions), 30))
    });
}

criterion_group!(benches, bench_corrective_motions);
criterion_main!(benches);
