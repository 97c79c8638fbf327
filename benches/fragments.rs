//! Benchmarks for the three hot paths: fragment parsing, template
//! construction, and structural matching.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use metatree::{matching, quote, Template};

const DECLARATIONS: &str = "\
-module(sample). \
f(0) -> zero; f(N) when N > 0 -> g(N - 1). \
g(N) -> case N of 0 -> done; M -> {next, M} end.";

const PATTERN: &str = "call(_@fn, _@@args)";
const SUBJECT: &str = "call(foo, 1, 2, 3, {4, 5}, [6 | T])";

fn bench_quote(c: &mut Criterion) {
    let mut group = c.benchmark_group("quote");
    group.bench_function("declarations", |b| {
        b.iter(|| quote(black_box(DECLARATIONS)).unwrap())
    });
    group.bench_function("expression_fallback", |b| {
        b.iter(|| quote(black_box(SUBJECT)).unwrap())
    });
    group.bench_function("clause_fallback", |b| {
        b.iter(|| quote(black_box("(X) -> X; (0) -> 0")).unwrap())
    });
    group.finish();
}

fn bench_template_build(c: &mut Criterion) {
    let pattern = quote(PATTERN).unwrap().remove(0);
    c.bench_function("template_build", |b| {
        b.iter(|| Template::build(black_box(&pattern)).unwrap())
    });
}

fn bench_match(c: &mut Criterion) {
    let pattern = Template::build(&quote(PATTERN).unwrap()[0]).unwrap();
    let subject = quote(SUBJECT).unwrap().remove(0);
    c.bench_function("match", |b| {
        b.iter(|| matching::match_template(black_box(&pattern), black_box(&subject)).unwrap())
    });
}

criterion_group!(benches, bench_quote, bench_template_build, bench_match);
criterion_main!(benches);
