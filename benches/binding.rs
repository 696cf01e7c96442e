use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::net::Ipv4Addr;
use treebind::{Bind, Binder, Codec, JsonCodec, ProcessorOptions, RegistryBuilder, Schema, UuidMode};
use uuid::Uuid;

#[derive(Clone, Default)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

impl Bind for Product {}

#[derive(Clone, Default)]
struct Metadata {
    created: String,
    version: u32,
}

impl Bind for Metadata {}

#[derive(Clone, Default)]
struct Record {
    id: Uuid,
    origin: Option<Ipv4Addr>,
    metadata: Metadata,
    tags: Vec<String>,
}

impl Bind for Record {}

fn binder() -> Binder {
    Binder::builder()
        .schema(
            Schema::<Product>::new()
                .field("sku", |p| &p.sku, |p| &mut p.sku)
                .field("name", |p| &p.name, |p| &mut p.name)
                .field("price", |p| &p.price, |p| &mut p.price)
                .field("quantity", |p| &p.quantity, |p| &mut p.quantity),
        )
        .schema(
            Schema::<Metadata>::new()
                .field("created", |m| &m.created, |m| &mut m.created)
                .field("version", |m| &m.version, |m| &mut m.version),
        )
        .schema(
            Schema::<Record>::new()
                .field("id", |r| &r.id, |r| &mut r.id)
                .field("origin", |r| &r.origin, |r| &mut r.origin)
                .field("metadata", |r| &r.metadata, |r| &mut r.metadata)
                .field("tags", |r| &r.tags, |r| &mut r.tags),
        )
        .build()
        .unwrap()
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn record() -> Record {
    Record {
        id: Uuid::new_v4(),
        origin: Some(Ipv4Addr::new(10, 0, 0, 7)),
        metadata: Metadata {
            created: "2023-01-01T00:00:00Z".to_string(),
            version: 3,
        },
        tags: vec![
            "important".to_string(),
            "verified".to_string(),
            "production".to_string(),
        ],
    }
}

fn benchmark_to_element_array(c: &mut Criterion) {
    let binder = binder();
    let mut group = c.benchmark_group("to_element_array");

    for size in [10, 50, 100, 500].iter() {
        let items = products(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| binder.to_element(black_box(&items)))
        });
    }
    group.finish();
}

fn benchmark_to_object_array(c: &mut Criterion) {
    let binder = binder();
    let mut group = c.benchmark_group("to_object_array");

    for size in [10, 50, 100, 500].iter() {
        let tree = binder.to_element(&products(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| binder.to_object::<Vec<Product>>(black_box(tree)))
        });
    }
    group.finish();
}

fn benchmark_nested_record(c: &mut Criterion) {
    let binder = binder();
    let data = record();
    let tree = binder.to_element(&data).unwrap();

    c.bench_function("to_element_nested", |b| {
        b.iter(|| binder.to_element(black_box(&data)))
    });
    c.bench_function("to_object_nested", |b| {
        b.iter(|| binder.to_object::<Record>(black_box(&tree)))
    });
}

fn benchmark_uuid_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("uuid_modes");
    let id = Uuid::new_v4();

    for (label, mode) in [
        ("string", UuidMode::String),
        ("long_array", UuidMode::LongArray),
        ("number", UuidMode::Number),
    ] {
        let binder = Binder::builder()
            .with_registry(RegistryBuilder::new(ProcessorOptions::new().with_uuid_mode(mode)))
            .build()
            .unwrap();
        let tree = binder.to_element(&id).unwrap();
        group.bench_function(label, |b| {
            b.iter(|| binder.to_object::<Uuid>(black_box(&tree)))
        });
    }
    group.finish();
}

fn benchmark_json_codec(c: &mut Criterion) {
    let binder = binder();
    let codec = JsonCodec::new();
    let tree = binder.to_element(&products(100)).unwrap();
    let bytes = codec.encode(&tree).unwrap();

    c.bench_function("json_encode_100", |b| b.iter(|| codec.encode(black_box(&tree))));
    c.bench_function("json_decode_100", |b| b.iter(|| codec.decode(black_box(&bytes))));
}

fn benchmark_registry_build(c: &mut Criterion) {
    c.bench_function("binder_build", |b| b.iter(binder));
}

criterion_group!(
    benches,
    benchmark_to_element_array,
    benchmark_to_object_array,
    benchmark_nested_record,
    benchmark_uuid_modes,
    benchmark_json_codec,
    benchmark_registry_build
);
criterion_main!(benches);
