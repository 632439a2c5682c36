use criterion::{black_box, criterion_group, criterion_main, Criterion};
use icnspack::block::IconBlock;
use icnspack::catalog::icns_catalog;
use icnspack::container::{encode_container, parse_container, write_container};
use tempfile::tempdir;

fn synthetic_blocks(payload_len: usize) -> Vec<IconBlock> {
    icns_catalog()
        .into_iter()
        .map(|spec| IconBlock {
            tag: spec.tag,
            payload: vec![0xAB; payload_len],
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let blocks = synthetic_blocks(64 * 1024);

    c.bench_function("encode_11_blocks_64k", |b| {
        b.iter(|| encode_container(black_box(&blocks)).unwrap())
    });
}

fn bench_parse(c: &mut Criterion) {
    let data = encode_container(&synthetic_blocks(64 * 1024)).unwrap();

    c.bench_function("parse_11_blocks_64k", |b| {
        b.iter(|| parse_container(black_box(&data)).unwrap())
    });
}

fn bench_write_atomic(c: &mut Criterion) {
    let blocks = synthetic_blocks(16 * 1024);
    let dir = tempdir().unwrap();
    let output = dir.path().join("bench.icns");

    c.bench_function("write_11_blocks_16k_atomic", |b| {
        b.iter(|| write_container(black_box(&blocks), &output).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_parse, bench_write_atomic);
criterion_main!(benches);
