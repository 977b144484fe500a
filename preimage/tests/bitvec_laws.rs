use preimage::SymBitVec;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const WIDTHS: [usize; 4] = [1, 8, 32, 64];

fn mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

#[test]
fn bitwise_ops_match_concrete_arithmetic() {
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    for width in WIDTHS {
        let m = mask(width);
        for _ in 0..20 {
            let a = rng.gen::<u64>() & m;
            let b = rng.gen::<u64>() & m;
            let va = SymBitVec::from_u64(a, width);
            let vb = SymBitVec::from_u64(b, width);

            assert_eq!((!&va).uint(), !a & m);
            assert_eq!((&va & &vb).uint(), a & b);
            assert_eq!((&va | &vb).uint(), a | b);
            assert_eq!((&va ^ &vb).uint(), a ^ b);
            assert_eq!((&va + &vb).uint(), a.wrapping_add(b) & m);
        }
    }
}

#[test]
fn shifts_and_rotations_match_concrete_arithmetic() {
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    for width in WIDTHS {
        let m = mask(width);
        for _ in 0..20 {
            let a = rng.gen::<u64>() & m;
            let va = SymBitVec::from_u64(a, width);
            let n = rng.gen_range(0..width);

            assert_eq!((&va << n).uint(), (a << n) & m);
            assert_eq!((&va >> n).uint(), a >> n);

            // rotr rotates the bit array right, i.e. the value left.
            let rotated = if n == 0 {
                a
            } else {
                ((a << n) | (a >> (width - n))) & m
            };
            assert_eq!(va.rotr(n).uint(), rotated);
        }
    }
}

#[test]
fn extract_resize_and_concat_match_concrete_arithmetic() {
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    for width in WIDTHS {
        let m = mask(width);
        for _ in 0..20 {
            let a = rng.gen::<u64>() & m;
            let b = rng.gen::<u64>() & m;
            let va = SymBitVec::from_u64(a, width);
            let vb = SymBitVec::from_u64(b, width);

            let lo = rng.gen_range(0..width);
            let hi = rng.gen_range(lo..=width);
            assert_eq!(va.extract(lo, hi).uint(), (a >> lo) & mask(hi - lo));

            let shorter = width / 2;
            assert_eq!(va.resize(shorter).uint(), a & mask(shorter));
            let longer = (width + 8).min(64);
            assert_eq!(va.resize(longer).uint(), a);

            if width <= 32 {
                assert_eq!(va.concat(&vb).uint(), a | (b << width));
            }
        }
    }
}

#[test]
fn ternary_combinators_match_concrete_arithmetic() {
    let mut rng = ChaCha20Rng::seed_from_u64(4);
    for width in WIDTHS {
        let m = mask(width);
        for _ in 0..20 {
            let a = rng.gen::<u64>() & m;
            let b = rng.gen::<u64>() & m;
            let c = rng.gen::<u64>() & m;
            let va = SymBitVec::from_u64(a, width);
            let vb = SymBitVec::from_u64(b, width);
            let vc = SymBitVec::from_u64(c, width);

            assert_eq!(SymBitVec::xor3(&va, &vb, &vc).uint(), a ^ b ^ c);
            assert_eq!(
                SymBitVec::majority3(&va, &vb, &vc).uint(),
                (a & b) | (a & c) | (b & c)
            );
        }
    }
}

#[test]
fn algebraic_identities_hold_for_unknown_vectors() {
    for width in WIDTHS {
        let a = SymBitVec::unknown(width);
        let ones = mask(width);

        assert_eq!(!!&a, a);
        assert_eq!((&a ^ &a).uint(), 0);
        assert_eq!((&a & &(!&a)).uint(), 0);
        assert_eq!((&a | &(!&a)).uint(), ones);
        assert_eq!(&a + &SymBitVec::from_u64(0, width), a);
    }
}

#[test]
fn shift_round_trip_clears_the_top_bits() {
    let mut rng = ChaCha20Rng::seed_from_u64(5);
    for width in WIDTHS {
        let m = mask(width);
        for _ in 0..20 {
            let a = rng.gen::<u64>() & m;
            let va = SymBitVec::from_u64(a, width);
            let n = rng.gen_range(0..width);
            assert_eq!(((&va << n) >> n).uint(), a & (m >> n));
        }
    }
}
