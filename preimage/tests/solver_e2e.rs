use std::collections::HashMap;

use preimage::{DagSolver, Error, Lit, SymBitVec, SymHash, SymRepresentation};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A lossy toy hash: wide enough to need real search, small enough to
/// solve instantly.
struct MiniHash {
    rounds: usize,
}

impl SymHash for MiniHash {
    fn name(&self) -> &'static str {
        "Mini"
    }

    fn default_difficulty(&self) -> usize {
        3
    }

    fn hash(&mut self, input: &SymBitVec) -> SymBitVec {
        let mut state = input.clone();
        for _ in 0..self.rounds {
            let mixed = &state.rotr(7) + &state;
            let gated = state.rotr(3) & &state.rotr(12);
            state = SymBitVec::xor3(&mixed, &gated, &state.rotr(9));
        }
        state
    }
}

fn random_bits(rng: &mut ChaCha20Rng, len: usize) -> Vec<bool> {
    (0..len).map(|_| rng.gen()).collect()
}

#[test]
fn recovered_preimages_reproduce_the_digest() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    for width in [16usize, 32] {
        for rounds in [2usize, 3] {
            let mut hasher = MiniHash { rounds };
            let problem = hasher.symbolic(width);

            for _ in 0..5 {
                let input = random_bits(&mut rng, width);
                let digest = hasher.call(&input);

                let observed = problem.observe_output(&digest).unwrap();
                let mut solver = DagSolver::new();
                let solution = solver.solve(&problem, &observed).unwrap();

                // The assignment is total and satisfies every gate.
                assert_eq!(solution.len(), problem.num_vars());
                for gate in problem.gates() {
                    assert!(gate.eval(&solution).unwrap());
                }
                for (&var, &value) in &observed {
                    assert_eq!(solution[&var], value);
                }

                // The recovered input hashes to the same digest, even if
                // it differs from the one we started from.
                let preimage = problem.recover_input(&solution);
                assert_eq!(hasher.call(&preimage), digest);
            }
        }
    }
}

#[test]
fn unsatisfiable_observations_are_reported_as_unsat() {
    // Variables 3 and 4 both compute 1 ^ 2, so observing them with
    // opposite values is infeasible and must exhaust the search.
    let gates = vec!["X 3 1 2".parse().unwrap(), "X 4 1 2".parse().unwrap()];
    let problem = SymRepresentation::new(gates, vec![1, 2], vec![3, 4]);
    let observed: HashMap<Lit, bool> = [(3, true), (4, false)].into_iter().collect();
    let mut solver = DagSolver::new();
    assert_eq!(solver.solve(&problem, &observed), Err(Error::Unsat));
}

#[test]
fn solver_agrees_with_cnf_scoring() {
    let mut hasher = MiniHash { rounds: 2 };
    let problem = hasher.symbolic(16);
    let cnf = problem.to_cnf();
    assert!(cnf.num_clauses() > 0);

    let mut rng = ChaCha20Rng::seed_from_u64(11);
    let input = random_bits(&mut rng, 16);
    let digest = hasher.call(&input);

    let observed = problem.observe_output(&digest).unwrap();
    let mut solver = DagSolver::new();
    let solution = solver.solve(&problem, &observed).unwrap();

    // A satisfying assignment scores a perfect approximation ratio.
    assert_eq!(cnf.approximation_ratio(&solution).unwrap(), 1.0);
    assert_eq!(cnf.num_sat_clauses(&solution).unwrap(), cnf.num_clauses());

    // Flipping a gate output violates that gate, and the score sees it.
    let last_gate = &problem.gates()[problem.gates().len() - 1];
    let mut corrupted = solution.clone();
    corrupted.insert(last_gate.output, !solution[&last_gate.output]);
    assert!(cnf.approximation_ratio(&corrupted).unwrap() < 1.0);
}
