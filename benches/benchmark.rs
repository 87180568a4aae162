use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pagewise::construct::{Attribute, Collection, Record, Schema};
use pagewise::datatype::ValueKind;
use pagewise::persist::{PersistenceMode, Persistor};
use pagewise::{FilterCriteria, PageRequest, Predicate, QueryEngine, SortSpec};

const COLORS: [&str; 5] = ["Black", "Red", "Silver", "Yellow", "Blue"];

fn products(n: i64) -> Collection {
    let schema = Schema::new(
        "Product",
        "ProductID",
        vec![
            Attribute::new("Name", ValueKind::Text),
            Attribute::new("Color", ValueKind::Text),
            Attribute::new("ListPrice", ValueKind::Integer),
        ],
    )
    .unwrap();
    let records = (0..n).map(|i| {
        Record::new(i)
            .with("Name", format!("Road-{} Frame", i % 997))
            .with("Color", COLORS[(i % 5) as usize])
            .with("ListPrice", (i * 37) % 3500)
    });
    Collection::with_records(schema, records).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let engine = QueryEngine::new();
    let collection = products(10_000);
    let page = PageRequest::new(3, 25).unwrap();
    let by_name = SortSpec::ascending("Name");
    let filter = FilterCriteria::new()
        .contains("Name", "frame")
        .with("Color", Predicate::exact("Red"))
        .between("ListPrice", 100, 2000);

    c.bench_function("page 10k unfiltered", |b| {
        b.iter(|| engine.query(black_box(&collection), None, None, page).unwrap())
    });
    c.bench_function("page 10k sorted", |b| {
        b.iter(|| engine.query(black_box(&collection), None, Some(&by_name), page).unwrap())
    });
    c.bench_function("page 10k filtered sorted", |b| {
        b.iter(|| engine.query(black_box(&collection), Some(&filter), Some(&by_name), page).unwrap())
    });

    let persistor = Persistor::new(PersistenceMode::InMemory).unwrap();
    persistor.persist_collection(&products(1_000)).unwrap();
    let source = persistor.entity_source("Product").unwrap();
    c.bench_function("page 1k sqlite filtered sorted", |b| {
        b.iter(|| engine.query(black_box(&source), Some(&filter), Some(&by_name), page).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
