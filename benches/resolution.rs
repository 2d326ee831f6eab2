//! Benchmarks for the hot paths of configuration loading.
//!
//! Layer merging and expression evaluation run on every load, module
//! resolution runs once per entry module. The filesystem fixture mirrors a
//! small front-end project with a populated `node_modules` directory.

use asset_composer::config::{load, LoadOptions};
use asset_composer::defaults::packaged_layers;
use asset_composer::evaluate::{evaluate_dynamic_data_structure, EvaluationContext};
use asset_composer::merge::merge;
use asset_composer::resolver::{AliasTable, ModuleResolver};
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Creates a project with sources and a few installed packages.
fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "package.json", r#"{"name": "bench"}"#);
    write(root, "source/index.js", "");
    for i in 0..30 {
        write(root, &format!("source/component{}/index.js", i), "");
        write(root, &format!("source/component{}/style.css", i), "");
    }
    for i in 0..20 {
        write(
            root,
            &format!("node_modules/package{}/package.json", i),
            r#"{"main": "lib/main.js"}"#,
        );
        write(root, &format!("node_modules/package{}/lib/main.js", i), "");
    }
    temp
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let layers = packaged_layers().unwrap();

    group.bench_function("default_debug_library", |b| {
        b.iter(|| merge(black_box(&layers.default), &[&layers.debug, &layers.library]).unwrap())
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let context = EvaluationContext::new("/project", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let tree = json!({
        "path": {"base": "/project/", "source": {"base": {"__evaluate__": "self.path.base + 'source/'"}}},
        "name": {"__evaluate__": "path.basename(self.path.source.base)"},
        "stamp": {"__evaluate__": "nowUTCTimestamp"},
        "flags": [{"__evaluate__": "debug"}, {"__evaluate__": "!debug"}]
    });

    group.bench_function("chained_references", |b| {
        b.iter(|| evaluate_dynamic_data_structure(black_box(&tree), &context).unwrap())
    });

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let project = create_project();
    let resolver = ModuleResolver::new(project.path())
        .with_aliases(AliasTable::from_pairs([("components", "./source")]));

    group.bench_function("relative", |b| {
        b.iter(|| resolver.resolve(black_box("./source/component7/index")))
    });
    group.bench_function("aliased", |b| {
        b.iter(|| resolver.resolve(black_box("components/component7")))
    });
    group.bench_function("package_main", |b| {
        b.iter(|| resolver.resolve(black_box("package13")))
    });
    group.bench_function("unresolvable", |b| {
        b.iter(|| resolver.resolve(black_box("missing-package")))
    });

    group.finish();
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    group.sample_size(20);
    let project = create_project();
    let options = LoadOptions::new(project.path()).with_debug(false);

    group.bench_function("auto_discovery", |b| b.iter(|| load(black_box(&options)).unwrap()));

    group.finish();
}

criterion_group!(benches, bench_merge, bench_evaluate, bench_resolve, bench_load);
criterion_main!(benches);
