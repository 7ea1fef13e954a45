use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use rflock::{Engine, FlockParams, RunConfig, Variant};

const STEPS: usize = 20;

fn bench_variants(c: &mut Criterion) {
    let params = FlockParams::default();
    let mut group = c.benchmark_group("flock_steps");
    group.sample_size(10);

    for &flock_size in &[50_usize, 200, 800] {
        for variant in Variant::ALL {
            let run = RunConfig {
                flock_size,
                steps: STEPS,
                ..RunConfig::default()
            };
            group.bench_with_input(BenchmarkId::new(variant.id(), flock_size), &run, |b, run| {
                b.iter_batched(
                    || Engine::seeded(variant, &params, run).expect("engine"),
                    |mut engine| {
                        for _ in 0..STEPS {
                            engine.step();
                        }
                        engine
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_entry_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    group.sample_size(10);
    group.bench_function("brute_force", |b| {
        b.iter(|| rflock::simulate_brute_force(100, STEPS).expect("history"))
    });
    group.bench_function("grid", |b| b.iter(|| rflock::simulate_grid(100, STEPS).expect("history")));
    group.bench_function("kdtree", |b| b.iter(|| rflock::simulate_kdtree(100, STEPS).expect("history")));
    group.finish();
}

criterion_group!(benches, bench_variants, bench_entry_points);
criterion_main!(benches);
