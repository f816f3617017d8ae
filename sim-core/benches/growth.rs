use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use diffline_core::{
    config::Config,
    geom::Rect,
    line::DifferentialLine,
    quadtree::QuadTree,
    seed,
};
use glam::DVec2;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::hint::black_box;

fn canvas() -> Rect {
    Rect::new(0.0, 0.0, 1000.0, 1000.0)
}

fn random_points(count: usize, seed: u64) -> Vec<DVec2> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| DVec2::new(rng.random_range(0.0..1000.0), rng.random_range(0.0..1000.0)))
        .collect()
}

fn bench_quadtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree");
    for &n in &[1_000usize, 10_000] {
        let points = random_points(n, 11);

        group.bench_with_input(BenchmarkId::new("build", n), &points, |b, points| {
            b.iter(|| {
                let mut tree = QuadTree::new(canvas(), 4).unwrap();
                tree.extend(points.iter().copied());
                black_box(tree.len())
            })
        });

        let mut tree = QuadTree::new(canvas(), 4).unwrap();
        tree.extend(points.iter().copied());
        group.bench_with_input(BenchmarkId::new("query", n), &points, |b, points| {
            b.iter(|| {
                let mut total = 0;
                for p in points.iter().take(100) {
                    total += tree.query_around(*p, 100.0, 100.0).len();
                }
                black_box(total)
            })
        });
    }
    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("differential_line");
    for &n in &[200usize, 2_000] {
        group.bench_function(BenchmarkId::new("step", n), |b| {
            b.iter_batched(
                || {
                    let points = seed::ring(DVec2::new(500.0, 500.0), 150.0, n);
                    let cfg = Config::default().with_closed(true);
                    DifferentialLine::new(points, canvas(), cfg).unwrap()
                },
                |mut line| black_box(line.step().len()),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_quadtree, bench_step);
criterion_main!(benches);
