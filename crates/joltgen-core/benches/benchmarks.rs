//! Criterion benchmarks for the joltgen-core generation pipeline.
//!
//! Fixtures are pre-parsed outside the benchmark loop to measure only
//! classification and spec generation, not JSON parsing or file I/O.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Map};
use std::fs;
use std::path::Path;

use joltgen_core::{
    build_request_spec, classify, generate, set_nested_value, Category, Field, GenerateOptions,
    GenerateRequest, MappingType, ParsedRequest,
};

/// Load and parse a fixture from the shared test fixtures directory.
fn load_fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
    let fixtures_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/fixtures");
    let path = Path::new(fixtures_dir).join(name);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

fn bench_generate_books(c: &mut Criterion) {
    let request: GenerateRequest = load_fixture("books_with_menu.json");
    let options = GenerateOptions::default();

    c.bench_function("generate/books_with_menu", |b| {
        b.iter(|| generate(black_box(&request), black_box(&options)).unwrap())
    });
}

fn bench_classify_login(c: &mut Criterion) {
    let request: ParsedRequest = load_fixture("login_request.json");

    c.bench_function("classify/login_request", |b| {
        b.iter(|| classify(black_box(&request)).unwrap())
    });
}

fn bench_request_spec_wide(c: &mut Criterion) {
    // 200 fields spread across every resolution branch.
    let fields: Vec<Field> = (0..200)
        .map(|i| match i % 4 {
            0 => Field::new(format!("q{i}"), Category::Query, MappingType::Dynamic, json!(""))
                .with_store_attribute(format!("Q{i}")),
            1 => Field::new(format!("q{i}"), Category::Query, MappingType::Static, json!(i)),
            2 => Field::new(format!("body.level{}.f{i}", i % 7), Category::Body, MappingType::Dynamic, json!(""))
                .with_store_attribute(format!("B{i}")),
            _ => Field::new(format!("items[{}].v", i % 5), Category::Body, MappingType::Static, json!(i)),
        })
        .collect();
    let static_fields = Map::new();

    c.bench_function("request_spec/wide_200", |b| {
        b.iter(|| {
            build_request_spec(black_box(&fields), "WIDE", None, black_box(&static_fields)).unwrap()
        })
    });
}

fn bench_deep_path_write(c: &mut Criterion) {
    let path = "a.b[3].c.d[1].e.f.g[0].h";

    c.bench_function("path/deep_write", |b| {
        b.iter(|| {
            let mut root = Map::new();
            set_nested_value(&mut root, black_box(path), json!("v"));
            root
        })
    });
}

criterion_group!(
    benches,
    bench_generate_books,
    bench_classify_login,
    bench_request_spec_wide,
    bench_deep_path_write
);
criterion_main!(benches);
