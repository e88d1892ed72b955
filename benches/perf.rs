use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use pgplan::catalog::{RelationName, enrich};
use pgplan::plan::{parse, render, tokenize};

const SELECT_FROM_TABLE: &str = include_str!("../tests/fixtures/select_from_table.plan");
const HASH_JOIN: &str = include_str!("../tests/fixtures/hash_join.plan");

// repeat a join subtree to get a deep plan
fn deep_plan(levels: usize) -> String {
    let mut tree = String::from("{SEQSCAN :scan.plan.lefttree <> :scan.scanrelid 1}");
    for _ in 0..levels {
        tree = format!(
            "{{NESTLOOP :join.plan.targetlist ({{TARGETENTRY :resno 1}}) \
             :join.plan.lefttree {} :join.plan.righttree {{SEQSCAN :scan.scanrelid 2}}}}",
            tree
        );
    }
    format!(
        "{{PLANNEDSTMT :planTree {} \
         :rtable ({{RANGETBLENTRY :relid 16424}} {{RANGETBLENTRY :relid 16390}})}}",
        tree
    )
}

fn bench_plan_suites(c: &mut Criterion) {
    let deep = deep_plan(200);
    let lookup = vec![RelationName::new(16424, "flight"), RelationName::new(16390, "aircraft")];

    // --- group 1: tokenizer ---
    let mut g1 = c.benchmark_group("Tokenize");
    g1.measurement_time(Duration::from_secs(5));
    g1.bench_function("select_from_table", |b| {
        b.iter(|| tokenize(black_box(SELECT_FROM_TABLE)));
    });
    g1.bench_function("deep_nestloop", |b| {
        b.iter(|| tokenize(black_box(&deep)));
    });
    g1.finish();

    // --- group 2: parse, enrich, render ---
    let mut g2 = c.benchmark_group("Parse-Render");
    g2.measurement_time(Duration::from_secs(5));
    let join_tokens = tokenize(HASH_JOIN);
    let deep_tokens = tokenize(&deep);
    g2.bench_function("parse_hash_join", |b| {
        b.iter(|| parse(black_box(&join_tokens)));
    });
    g2.bench_function("parse_deep_nestloop", |b| {
        b.iter(|| parse(black_box(&deep_tokens)));
    });
    g2.bench_function("enrich_render_deep_nestloop", |b| {
        let stmt = parse(&deep_tokens);
        b.iter(|| {
            let mut stmt = stmt.clone();
            enrich(&mut stmt, black_box(&lookup));
            render(&stmt)
        });
    });
    g2.finish();
}

criterion_group!(benches, bench_plan_suites);
criterion_main!(benches);
