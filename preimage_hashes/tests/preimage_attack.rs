//! End-to-end preimage recovery on reduced-round hash circuits.

use preimage::{DagSolver, SymHash};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const INPUT_BITS: usize = 64;
const SAMPLES_PER_DIFFICULTY: usize = 5;

/// Builds the symbolic circuit once, then checks that solving for a
/// random digest yields an input reproducing that digest.
fn recovers_preimages(hasher: &mut dyn SymHash, difficulty: usize, rng: &mut ChaCha20Rng) {
    let problem = hasher.symbolic(INPUT_BITS);

    for sample in 0..SAMPLES_PER_DIFFICULTY {
        let input: Vec<bool> = (0..INPUT_BITS).map(|_| rng.gen()).collect();
        let digest = hasher.call(&input);

        let observed = problem.observe_output(&digest).unwrap();
        let mut solver = DagSolver::new();
        let solution = solver.solve(&problem, &observed).unwrap_or_else(|e| {
            panic!(
                "{} difficulty {difficulty} sample {sample}: {e}",
                hasher.name()
            )
        });

        let preimage = problem.recover_input(&solution);
        assert_eq!(
            hasher.call(&preimage),
            digest,
            "{} difficulty {difficulty} sample {sample}: digest mismatch",
            hasher.name()
        );
    }
}

#[test]
fn sha256_preimages_at_low_difficulty() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5AA5);
    for difficulty in 4..=8 {
        let mut hasher = preimage_hashes::Sha256::with_difficulty(difficulty);
        recovers_preimages(&mut hasher, difficulty, &mut rng);
    }
}

#[test]
fn md5_preimages_at_low_difficulty() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xD155);
    for difficulty in 8..=12 {
        let mut hasher = preimage_hashes::Md5::with_difficulty(difficulty);
        recovers_preimages(&mut hasher, difficulty, &mut rng);
    }
}

#[test]
fn ripemd160_preimages_at_low_difficulty() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x41FE);
    for difficulty in 8..=12 {
        let mut hasher = preimage_hashes::Ripemd160::with_difficulty(difficulty);
        recovers_preimages(&mut hasher, difficulty, &mut rng);
    }
}
