use criterion::{criterion_group, criterion_main, Criterion};
use bbopt::{
    algo::{EvolutionStrategy, NoisyAnnealing, PatternSearch},
    testing::*,
    Options, Problem,
};

const MAX_EVALUATIONS: usize = 20_000;
const THRESHOLD: f64 = 1e-10;

fn options() -> Options {
    let mut options = Options::default();
    options
        .set_max_function_evaluations(Some(MAX_EVALUATIONS))
        .set_fitness_threshold(Some(THRESHOLD))
        .set_verbose(0);
    options
}

fn sphere(c: &mut Criterion) {
    let f = Sphere::new(5);
    let dom = f.domain();
    let x = f.initials()[0].as_slice().to_vec();

    c.bench_function("MA-ES sphere", |b| {
        b.iter(|| {
            optimize(&f, EvolutionStrategy::new(&f, &dom), Some(x.clone()), options())
                .expect("no optimizer error")
        })
    });

    c.bench_function("pattern search sphere", |b| {
        b.iter(|| {
            optimize(&f, PatternSearch::new(&f, &dom), Some(x.clone()), options())
                .expect("no optimizer error")
        })
    });

    c.bench_function("noisy annealing sphere", |b| {
        b.iter(|| {
            optimize(&f, NoisyAnnealing::new(&f, &dom), Some(x.clone()), options())
                .expect("no optimizer error")
        })
    });
}

fn rosenbrock(c: &mut Criterion) {
    let f = Rosenbrock::new(2);
    let dom = f.domain();
    let x = f.initials()[0].as_slice().to_vec();

    c.bench_function("MA-ES rosenbrock", |b| {
        b.iter(|| {
            optimize(&f, EvolutionStrategy::new(&f, &dom), Some(x.clone()), options())
                .expect("no optimizer error")
        })
    });

    c.bench_function("pattern search rosenbrock", |b| {
        b.iter(|| {
            optimize(&f, PatternSearch::new(&f, &dom), Some(x.clone()), options())
                .expect("no optimizer error")
        })
    });
}

fn ellipsoid(c: &mut Criterion) {
    let f = Ellipsoid::new(10);
    let dom = f.domain();
    let x = f.initials()[0].as_slice().to_vec();

    c.bench_function("MA-ES ellipsoid", |b| {
        b.iter(|| {
            optimize(&f, EvolutionStrategy::new(&f, &dom), Some(x.clone()), options())
                .expect("no optimizer error")
        })
    });
}

criterion_group!(optimizers, sphere, rosenbrock, ellipsoid);
criterion_main!(optimizers);
