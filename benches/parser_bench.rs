use criterion::{black_box, criterion_group, criterion_main, Criterion};

use xpathoxide::xpath::lexer::Lexer;
use xpathoxide::xpath::{parse, ParseCache};

const SIMPLE: &str = "//book/title";
const COMPLEX: &str = "//book[@genre='fiction' and number(price) > 20]/title | /library/shelf[last()]/book[position() mod 2 = 0]";

/// Builds a long expression with many steps and predicates.
fn make_large_expression() -> String {
    (0..200)
        .map(|i| format!("ns:step{i}[@id = {i} or text() = 'v{i}']"))
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Lexing benchmarks
// ---------------------------------------------------------------------------

fn bench_lex_complex(c: &mut Criterion) {
    c.bench_function("lex_complex", |b| {
        b.iter(|| Lexer::new(black_box(COMPLEX)).tokenize().expect("lex failed"));
    });
}

// ---------------------------------------------------------------------------
// Parsing benchmarks
// ---------------------------------------------------------------------------

fn bench_parse_simple(c: &mut Criterion) {
    c.bench_function("parse_simple", |b| {
        b.iter(|| parse(black_box(SIMPLE)).expect("parse failed"));
    });
}

fn bench_parse_complex(c: &mut Criterion) {
    c.bench_function("parse_complex", |b| {
        b.iter(|| parse(black_box(COMPLEX)).expect("parse failed"));
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let expression = make_large_expression();
    c.bench_function("parse_large", |b| {
        b.iter(|| parse(black_box(&expression)).expect("parse failed"));
    });
}

// ---------------------------------------------------------------------------
// Cache benchmarks
// ---------------------------------------------------------------------------

fn bench_cache_hit(c: &mut Criterion) {
    let cache = ParseCache::new(16);
    cache.get_or_parse(COMPLEX).expect("parse failed");
    c.bench_function("cache_hit", |b| {
        b.iter(|| cache.get_or_parse(black_box(COMPLEX)).expect("parse failed"));
    });
}

fn bench_cache_churn(c: &mut Criterion) {
    let expressions: Vec<String> = (0..64).map(|i| format!("item[{i}]/name")).collect();
    let cache = ParseCache::new(32);
    c.bench_function("cache_churn", |b| {
        b.iter(|| {
            for expression in &expressions {
                cache
                    .get_or_parse(black_box(expression))
                    .expect("parse failed");
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(lexing, bench_lex_complex);
criterion_group!(
    parsing,
    bench_parse_simple,
    bench_parse_complex,
    bench_parse_large
);
criterion_group!(caching, bench_cache_hit, bench_cache_churn);

criterion_main!(lexing, parsing, caching);
