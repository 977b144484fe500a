mod common;

use common::{digest_hex, random_bytes, INPUT_BITS};
use md5::{Digest, Md5 as RefMd5};
use preimage_hashes::Md5;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[test]
fn fixed_strings_match_the_published_vectors() {
    let mut hasher = Md5::new();
    assert_eq!(
        digest_hex(&mut hasher, b""),
        "d41d8cd98f00b204e9800998ecf8427e"
    );
    assert_eq!(
        digest_hex(&mut hasher, b"abc"),
        "900150983cd24fb0d6963f7d28e17f72"
    );
    assert_eq!(
        digest_hex(&mut hasher, b"message digest"),
        "f96b697d7cb7938d525a2f31aaf161d0"
    );
}

#[test]
fn random_inputs_match_the_reference_implementation() {
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let mut hasher = Md5::new();
    for num_bits in INPUT_BITS {
        for _ in 0..3 {
            let message = random_bytes(&mut rng, num_bits / 8);
            let expected = hex::encode(RefMd5::digest(&message));
            assert_eq!(
                digest_hex(&mut hasher, &message),
                expected,
                "mismatch at {num_bits} input bits"
            );
        }
    }
}
