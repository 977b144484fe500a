use preimage::{bits, SymHash};
use rand::Rng;

/// Hashes `message` concretely and renders the digest as hex.
pub fn digest_hex(hasher: &mut dyn SymHash, message: &[u8]) -> String {
    bits::hex_from_bits(&hasher.call(&bits::bits_from_bytes(message)))
}

#[allow(dead_code)]
pub fn random_bytes(rng: &mut impl Rng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen()).collect()
}

/// Input sizes (in bits) exercised by the randomized equivalence tests,
/// crossing the one- and two-block boundaries.
#[allow(dead_code)]
pub const INPUT_BITS: [usize; 7] = [0, 8, 32, 64, 512, 640, 1024];
