#![allow(clippy::unwrap_used)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use num_bigint::BigInt;
use num_rational::BigRational;
use rpncalc::radix::{self, Radix};
use rpncalc::{Engine, Session};

const LITERAL_SIMPLE: &str = "42";
const LITERAL_FRACTION: &str = "-355/113";
const LITERAL_POSITIONAL: &str = "3.14159265358979E-3";

const LINE_ARITHMETIC: &str = "1 2 + 3 * 4 /";
const LINE_FOLD: &str = "1 100 r *$";
const LINE_MACROS: &str = "(1 20 r 3 *.) +$ total= total? 16 b";

fn bench_literals(c: &mut Criterion) {
    let mut group = c.benchmark_group("Literals");
    let decimal = Radix::DECIMAL;
    let hex = Radix::new(16).unwrap();

    group.bench_function("Parse Integer", |b| {
        b.iter(|| radix::parse_rational(black_box(LITERAL_SIMPLE), decimal))
    });

    group.bench_function("Parse Fraction", |b| {
        b.iter(|| radix::parse_rational(black_box(LITERAL_FRACTION), decimal))
    });

    group.bench_function("Parse Positional", |b| {
        b.iter(|| radix::parse_rational(black_box(LITERAL_POSITIONAL), decimal))
    });

    group.bench_function("Reject Operator Name", |b| {
        b.iter(|| radix::parse_rational(black_box("swap"), hex))
    });

    group.finish();
}

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("Formatting");
    let third = BigRational::new(BigInt::from(1), BigInt::from(3));
    let big = BigRational::from_integer(BigInt::from(7).pow(200));

    group.bench_function("Fraction Base 10", |b| {
        b.iter(|| radix::format_rational(black_box(&third), Radix::DECIMAL, true, 16))
    });

    group.bench_function("Positional Base 10", |b| {
        b.iter(|| radix::format_rational(black_box(&third), Radix::DECIMAL, false, 16))
    });

    group.bench_function("Large Integer Base 36", |b| {
        let radix = Radix::new(36).unwrap();
        b.iter(|| radix::format_rational(black_box(&big), radix, true, 16))
    });

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Evaluation");

    group.bench_function("Tokens Arithmetic", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            for token in black_box(LINE_ARITHMETIC).split_whitespace() {
                engine.parse(token).unwrap();
            }
            engine
        })
    });

    group.bench_function("Line Fold", |b| {
        b.iter(|| Session::default().run_line(black_box(LINE_FOLD)))
    });

    group.bench_function("Line Macros", |b| {
        b.iter(|| Session::default().run_line(black_box(LINE_MACROS)))
    });

    group.finish();
}

criterion_group!(benches, bench_literals, bench_formatting, bench_evaluation);
criterion_main!(benches);
