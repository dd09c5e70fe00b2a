use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rmxml::special::Table;
use rmxml::{from_tree, generate, parse, to_tree, FieldMap, Value};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
struct Actor {
    id: u32,
    name: String,
    level: u32,
    equips: Vec<u16>,
}

fn actor_record(id: i64) -> Value {
    let actor = Value::object("Actor", FieldMap::new());
    actor.set_field("id", Value::from(id));
    actor.set_field("name", Value::from(format!("Actor {}", id)));
    actor.set_field("level", Value::from(id % 99));
    actor
}

/// A party whose members all point at one shared troop record, and back.
fn shared_graph(size: usize) -> Value {
    let troop = Value::object("Troop", FieldMap::new());
    let members: Vec<Value> = (0..size as i64)
        .map(|id| {
            let actor = actor_record(id);
            actor.set_field("troop", troop.clone());
            actor
        })
        .collect();
    troop.set_field("members", Value::Array(members.clone()));
    Value::Array(members)
}

fn benchmark_generate_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_graph");

    for size in [10, 100, 1000].iter() {
        let graph = shared_graph(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| generate(black_box(&graph)))
        });
    }
    group.finish();
}

fn benchmark_parse_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_graph");

    for size in [10, 100, 1000].iter() {
        let tree = generate(&shared_graph(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| parse(black_box(tree)))
        });
    }
    group.finish();
}

fn benchmark_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("table");
    let mut table = Table::new_3d(64, 64, 4);
    for z in 0..4 {
        for y in 0..64 {
            for x in 0..64 {
                table.set(x, y, z, (x * y + z) as i16);
            }
        }
    }
    let value = Value::special(table);
    let tree = generate(&value).unwrap();

    group.bench_function("generate", |b| b.iter(|| generate(black_box(&value))));
    group.bench_function("parse", |b| b.iter(|| parse(black_box(&tree))));
    group.finish();
}

fn benchmark_serde_bridge(c: &mut Criterion) {
    let actors: Vec<Actor> = (0..100)
        .map(|id| Actor {
            id,
            name: format!("Actor {}", id),
            level: id % 99,
            equips: vec![1, 2, 3, 4, 5],
        })
        .collect();
    let tree = to_tree(&actors).unwrap();

    let mut group = c.benchmark_group("serde_bridge");
    group.bench_function("to_tree", |b| b.iter(|| to_tree(black_box(&actors))));
    group.bench_function("from_tree", |b| {
        b.iter(|| from_tree::<Vec<Actor>>(black_box(&tree)))
    });
    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let tree = generate(&shared_graph(100)).unwrap();
    let json = serde_json::to_string(&tree).unwrap();

    let mut group = c.benchmark_group("comparison");
    group.bench_function("tree_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&tree)))
    });
    group.bench_function("json_to_graph", |b| {
        b.iter(|| {
            let tree: rmxml::TreeNode = serde_json::from_str(black_box(&json)).unwrap();
            parse(&tree)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_generate_graph,
    benchmark_parse_graph,
    benchmark_table,
    benchmark_serde_bridge,
    benchmark_comparison_with_json
);
criterion_main!(benches);
