//! Driving symbolic hash executions.

use tracing::debug;

use crate::bit::{self, SymBit};
use crate::bitvec::SymBitVec;
use crate::representation::SymRepresentation;
use crate::Lit;

/// A hash function expressed through [`SymBitVec`] operations.
///
/// Implementors provide only the hash body; the provided methods drive a
/// run over constants ([`call`](SymHash::call)) or over fresh unknowns
/// ([`symbolic`](SymHash::symbolic)). Both reset the thread-local gate
/// registry first, so at most one run may be in flight per thread, and
/// two concurrent runs must live on separate threads.
pub trait SymHash {
    /// Human-readable algorithm name.
    fn name(&self) -> &'static str;

    /// The round count a hasher uses when none is configured.
    fn default_difficulty(&self) -> usize;

    /// The hash body. Must be written purely in terms of [`SymBitVec`]
    /// operations, with no other side effects.
    fn hash(&mut self, input: &SymBitVec) -> SymBitVec;

    /// Runs the hash over a concrete input and returns the digest bits.
    ///
    /// Every operation folds, so the registry stays empty; this is the
    /// ordinary forward evaluation of the hash.
    fn call(&mut self, input: &[bool]) -> Vec<bool> {
        SymBit::reset();
        let input = SymBitVec::from_bits(input);
        self.hash(&input).bits()
    }

    /// Runs the hash over `num_input_bits` fresh unknowns and captures
    /// the resulting constraint DAG.
    ///
    /// The returned representation is pruned to the gates the output
    /// actually depends on and reindexed to contiguous variables. Output
    /// positions that folded to constants are recorded as index 0.
    fn symbolic(&mut self, num_input_bits: usize) -> SymRepresentation {
        SymBit::reset();
        let input = SymBitVec::unknown(num_input_bits);
        let input_indices: Vec<Lit> = (0..input.len()).map(|i| input.bit(i).index()).collect();
        let output = self.hash(&input);
        let output_indices: Vec<Lit> = (0..output.len()).map(|i| output.bit(i).index()).collect();
        let gates = bit::take_gates();
        debug!(
            name = self.name(),
            num_inputs = input_indices.len(),
            num_outputs = output_indices.len(),
            num_gates = gates.len(),
            "completed symbolic run"
        );
        SymRepresentation::new(gates, input_indices, output_indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adds a rotated copy of the input to itself; enough structure to
    /// exercise the driver without a real hash.
    struct MixHash;

    impl SymHash for MixHash {
        fn name(&self) -> &'static str {
            "Mix"
        }

        fn default_difficulty(&self) -> usize {
            1
        }

        fn hash(&mut self, input: &SymBitVec) -> SymBitVec {
            let rotated = input.rotr(3);
            (input + &rotated) ^ &(input & &rotated)
        }
    }

    #[test]
    fn concrete_calls_record_no_gates() {
        let input = crate::bits::bits_from_bytes(&[0xA5]);
        let digest = MixHash.call(&input);
        assert_eq!(digest.len(), 8);
        assert_eq!(crate::bit::num_recorded_gates(), 0);
    }

    #[test]
    fn symbolic_runs_are_deterministic() {
        let a = MixHash.symbolic(16);
        let b = MixHash.symbolic(16);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn symbolic_and_concrete_runs_agree() {
        let rep = MixHash.symbolic(8);
        assert_eq!(rep.input_indices().len(), 8);
        assert_eq!(rep.output_indices().len(), 8);
        assert!(rep.num_vars() > 0);

        let input = crate::bits::bits_from_bytes(&[0x5B]);
        let digest = MixHash.call(&input);
        assert_eq!(digest.len(), 8);
    }

    #[test]
    fn parallel_runs_do_not_interleave() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| MixHash.symbolic(16).fingerprint()))
            .collect();
        let baseline = MixHash.symbolic(16).fingerprint();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), baseline);
        }
    }
}
