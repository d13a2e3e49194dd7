use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nibble_smt::SparseMerkleTree;
use sha2::Sha256;

pub fn generate_random_value() -> Vec<u8> {
    let mut value = Vec::with_capacity(32);
    for _ in 0..32 {
        value.push(rand::random());
    }
    value
}

fn setup_tree(num_leaves: usize) -> (SparseMerkleTree<32, Sha256>, Vec<[u8; 32]>) {
    let mut tree = SparseMerkleTree::<32, Sha256>::default();
    let mut keys = Vec::with_capacity(num_leaves);

    for _ in 0..num_leaves {
        let value = generate_random_value();
        tree.update(&value).unwrap();
        keys.push(tree.hash(&value));
    }

    (tree, keys)
}

fn bench_proof_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sparse Merkle Tree Proof Generation");

    // Setup tree with 100 leaves
    let (tree, keys) = setup_tree(100);

    group.bench_function("Proof", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(tree.merkle_proof(key)).unwrap();
            }
        })
    });

    group.bench_function("Compressed Proof", |b| {
        b.iter(|| {
            for key in &keys {
                let proof = tree.merkle_proof(key).unwrap();
                black_box(proof.compress(tree.default_hashes()));
            }
        })
    });

    group.finish();
}

fn bench_proof_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sparse Merkle Tree Proof Verification");

    // Setup tree with 100 leaves
    let (tree, keys) = setup_tree(100);

    // Generate proofs for all keys
    let proofs: Vec<_> = keys
        .iter()
        .map(|key| tree.merkle_proof(key).unwrap())
        .collect();
    let root_hash = tree.root_hash();

    group.bench_function("Proof", |b| {
        b.iter(|| {
            for (key, proof) in keys.iter().zip(proofs.iter()) {
                black_box(proof.verify(tree.hasher(), key, *key, root_hash)).unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_proof_generation, bench_proof_verification);
criterion_main!(benches);
