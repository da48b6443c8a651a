//! Ring item construction and decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringitem_bench::random_data;
use ringitem_core::{ItemType, ReserveConfig, WireFormat, V11};
use ringitem_storage::{InMemoryStream, RingBuffer};

/// Benchmark building an owned item and setting its body header afterwards,
/// which slides the body.
fn bench_build_with_slide(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_with_slide");

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let body = random_data(size);
            b.iter(|| {
                let mut item = V11::new_item(ItemType::PHYSICS_EVENT, size).unwrap();
                item.append(black_box(&body)).unwrap();
                item.set_body_header(1, 2, 0).unwrap();
                black_box(item.size());
            });
        });
    }

    group.finish();
}

/// Benchmark building items in place inside a ring buffer.
fn bench_zero_copy_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("zero_copy_commit");
    let config = ReserveConfig::default();

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let body = random_data(size);
            let mut ring = RingBuffer::new(1 << 20);

            b.iter(|| {
                let mut item =
                    V11::new_zero_copy(ItemType::PHYSICS_EVENT, size, &mut ring, &config).unwrap();
                item.set_body_header(1, 2, 0).unwrap();
                item.append(black_box(&body)).unwrap();
                let written = item.commit().unwrap();
                ring.skip(written).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark decoding items back out of a stream.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut item = V11::new_item(ItemType::PHYSICS_EVENT, size).unwrap();
            item.append(&random_data(size)).unwrap();
            item.set_body_header(1, 2, 0).unwrap();
            let mut stream = InMemoryStream::new();
            item.commit_to(&mut stream).unwrap();
            let bytes = stream.data().to_vec();

            b.iter(|| {
                let decoded = V11::decode(black_box(&bytes)).unwrap();
                black_box(decoded.body_size());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build_with_slide,
    bench_zero_copy_commit,
    bench_decode,
);

criterion_main!(benches);
