use criterion::{criterion_group, criterion_main, Criterion};
use preimage::{bits, DagSolver, SymHash};
use preimage_hashes::Sha256;

fn symbolic_circuit(c: &mut Criterion) {
    c.bench_function("sha256_symbolic_d8_64bit", |b| {
        b.iter(|| Sha256::with_difficulty(8).symbolic(64))
    });
}

fn preimage_search(c: &mut Criterion) {
    let mut hasher = Sha256::with_difficulty(6);
    let problem = hasher.symbolic(64);
    let input = bits::bits_from_bytes(&0xCAFE_BABE_DEAD_BEEF_u64.to_le_bytes());
    let digest = hasher.call(&input);
    let observed = problem.observe_output(&digest).unwrap();

    c.bench_function("sha256_preimage_d6_64bit", |b| {
        b.iter(|| {
            let mut solver = DagSolver::new();
            solver.solve(&problem, &observed).unwrap()
        })
    });
}

criterion_group!(benches, symbolic_circuit, preimage_search);
criterion_main!(benches);
