use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use nibble_smt::{Dsha256, SparseMerkleTree};
use sha2::Sha256;

pub fn generate_random_value() -> Vec<u8> {
    let mut value = Vec::with_capacity(32);
    for _ in 0..32 {
        value.push(rand::random());
    }
    value
}

fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sparse Merkle Tree Insertion");

    group.bench_function("Sha256 Tree", |b| {
        b.iter(|| {
            let mut tree = SparseMerkleTree::<32, Sha256>::default();
            for _ in 0..100 {
                tree.update(&generate_random_value()).unwrap();
            }
        })
    });

    group.bench_function("Dsha256 Tree", |b| {
        b.iter(|| {
            let mut tree = SparseMerkleTree::<32, Dsha256>::default();
            for _ in 0..100 {
                tree.update(&generate_random_value()).unwrap();
            }
        })
    });

    // One insertion into a tree that already holds 10_000 keys
    let mut populated = SparseMerkleTree::<32, Sha256>::default();
    for _ in 0..10_000 {
        populated.update(&generate_random_value()).unwrap();
    }
    group.bench_function("Populated Sha256 Tree", |b| {
        b.iter_batched(
            || (populated.clone(), generate_random_value()),
            |(mut tree, value)| tree.update(&value).unwrap(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_insertion);
criterion_main!(benches);
