use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use ucode::{
    lexer::{lex, LexOptions, SUGGESTED_TOKENS_CAPACITY},
    token::TokenKind,
};

static INPUT: &str = include_str!("../../samples/wifi-stats.uc");

fn lexer(input: &str, tokens: &mut Vec<ucode::token::Token>) {
    lex(input, LexOptions::default(), tokens);
    let valid = tokens
        .iter()
        .filter(|token| !matches!(token.kind, TokenKind::Error(_)))
        .count();
    black_box(valid);
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);

    c.bench_function("lexer", |b| {
        b.iter(|| {
            tokens.clear();
            lexer(black_box(INPUT), &mut tokens);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
