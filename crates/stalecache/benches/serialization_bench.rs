use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use stalecache::{Codec, Serializer};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Address {
    street: String,
    city: String,
    zip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Line {
    sku: String,
    quantity: u32,
    price_cents: u64,
    attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u64,
    customer: String,
    shipping: Address,
    lines: Vec<Line>,
}

/// Crea una orden de prueba con N lineas y M atributos por linea
fn create_order(num_lines: usize, num_attributes: usize) -> Order {
    Order {
        id: 42,
        customer: "customer-42".to_string(),
        shipping: Address {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            zip: "12345".to_string(),
        },
        lines: (0..num_lines)
            .map(|i| Line {
                sku: format!("sku-{}", i),
                quantity: i as u32 + 1,
                price_cents: 1_000 + i as u64,
                attributes: (0..num_attributes)
                    .map(|j| (format!("attr-{}", j), format!("value-{}-{}", i, j)))
                    .collect(),
            })
            .collect(),
    }
}

/// Benchmark: encode por codec
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for (lines, attrs) in [(5, 2), (50, 5), (500, 5)].iter() {
        let order = create_order(*lines, *attrs);

        group.throughput(Throughput::Elements(*lines as u64));
        for codec in [Codec::Msgpack, Codec::Json] {
            group.bench_with_input(
                BenchmarkId::new(codec.name(), format!("{}x{}", lines, attrs)),
                &order,
                |b, order| {
                    b.iter(|| {
                        let bytes = codec.serialize(order).unwrap();
                        std::hint::black_box(bytes)
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark: decode por codec
fn bench_deserialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize");

    for (lines, attrs) in [(5, 2), (50, 5), (500, 5)].iter() {
        let order = create_order(*lines, *attrs);

        for codec in [Codec::Msgpack, Codec::Json] {
            let bytes = codec.serialize(&order).unwrap();

            group.throughput(Throughput::Bytes(bytes.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(codec.name(), format!("{}x{}", lines, attrs)),
                &bytes,
                |b, bytes| {
                    b.iter(|| {
                        let order: Order = codec.deserialize(bytes).unwrap();
                        std::hint::black_box(order)
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark: Tamaño del payload
fn bench_payload_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_size");

    for num_lines in [10, 100, 1000].iter() {
        let order = create_order(*num_lines, 3);

        group.throughput(Throughput::Elements(*num_lines as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_lines),
            &order,
            |b, order| {
                b.iter(|| {
                    let msgpack = Codec::Msgpack.serialize(order).unwrap().len();
                    let json = Codec::Json.serialize(order).unwrap().len();
                    std::hint::black_box((msgpack, json))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_serialize, bench_deserialize, bench_payload_size);

criterion_main!(benches);
