//! # Nearest Waypoint Benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use wpt_lib::{
    loc::Pose,
    localiser::find_nearest_index,
    nearest::SearchStrategy,
    path::{Waypoint, WaypointPath},
};

fn nearest_benchmark(c: &mut Criterion) {
    // ---- Build random paths and queries ----

    let mut rng = StdRng::seed_from_u64(7);

    let queries: Vec<Pose> = (0..100)
        .map(|_| {
            Pose::from_xy_heading(
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-3.1..3.1),
            )
        })
        .collect();

    let mut group = c.benchmark_group("find_nearest_index");

    for &n in &[100usize, 1_000, 10_000] {
        let path: WaypointPath = (0..n)
            .map(|_| {
                Waypoint::new(
                    rng.gen_range(-500.0..500.0),
                    rng.gen_range(-500.0..500.0),
                    0.0,
                    10.0,
                )
            })
            .collect::<Vec<_>>()
            .into();

        for &strategy in &[SearchStrategy::LinearScan, SearchStrategy::KdTree] {
            let finder = strategy.build(path.positions()).unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), n),
                &queries,
                |b, queries| {
                    b.iter(|| {
                        for pose in queries {
                            black_box(find_nearest_index(pose, &*finder).unwrap());
                        }
                    })
                },
            );
        }

        // Building the tree happens once per path
        group.bench_with_input(BenchmarkId::new("KdTree::build", n), &path, |b, path| {
            b.iter(|| SearchStrategy::KdTree.build(path.positions()).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, nearest_benchmark);
criterion_main!(benches);
