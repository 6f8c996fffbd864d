use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn init() {
    racah::global_init(2 * 1000, 9);
}

fn bench_three_j_small(c: &mut Criterion) {
    init();
    c.bench_function("three_j(j=5 family)", |b| {
        b.iter(|| {
            racah::three_j(
                black_box(10),
                black_box(10),
                black_box(10),
                black_box(2),
                black_box(-4),
                black_box(2),
            )
        });
    });
}

fn bench_three_j_large(c: &mut Criterion) {
    init();
    c.bench_function("three_j(j=400/80/480)", |b| {
        b.iter(|| {
            racah::three_j(
                black_box(800),
                black_box(160),
                black_box(960),
                black_box(2),
                black_box(-2),
                black_box(0),
            )
        });
    });
}

fn bench_six_j(c: &mut Criterion) {
    init();
    c.bench_function("six_j(j=20 equilateral)", |b| {
        b.iter(|| {
            racah::six_j(
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
            )
        });
    });
}

fn bench_nine_j(c: &mut Criterion) {
    init();
    c.bench_function("nine_j(j=20 equilateral)", |b| {
        b.iter(|| {
            racah::nine_j(
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
                black_box(40),
            )
        });
    });
}

fn bench_cg(c: &mut Criterion) {
    init();
    c.bench_function("cg(j=1000/50 family)", |b| {
        b.iter(|| {
            racah::cg(
                black_box(2000),
                black_box(100),
                black_box(100),
                black_box(20),
                black_box(1950),
                black_box(120),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_three_j_small,
    bench_three_j_large,
    bench_six_j,
    bench_nine_j,
    bench_cg,
);
criterion_main!(benches);
