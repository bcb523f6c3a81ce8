use criterion::{criterion_group, criterion_main, Criterion};
use std::{hint::black_box, path::Path};
use ucode::{
    config::AnalyzerConfig,
    lexer::{tokenize, LexOptions},
    parser::parse,
    pipeline::analyze_document,
};

static INPUT: &str = include_str!("../../samples/wifi-stats.uc");

fn no_files(_: &Path) -> bool {
    false
}

fn criterion_benchmark(c: &mut Criterion) {
    let tokens = tokenize(INPUT, LexOptions::default());
    c.bench_function("parser", |b| {
        b.iter(|| black_box(parse(black_box(INPUT), &tokens)));
    });

    let config = AnalyzerConfig::default();
    c.bench_function("pipeline", |b| {
        b.iter(|| black_box(analyze_document(black_box(INPUT), &config, &no_files)));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
