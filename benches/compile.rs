use criterion::{criterion_group, criterion_main, Criterion};
use ryacc::spec::samples;

fn bench_compile(c: &mut Criterion) {
    let arithmetic = samples::arithmetic();
    c.bench_function("compile_arithmetic", |b| {
        b.iter(|| ryacc::compile(&arithmetic).unwrap());
    });

    let dangling_else = samples::dangling_else();
    c.bench_function("compile_dangling_else", |b| {
        b.iter(|| ryacc::compile(&dangling_else).unwrap());
    });
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
