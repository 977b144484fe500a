//! Symbolic RIPEMD-160.

use preimage::{SymBitVec, SymHash};

const NUM_SUBROUNDS: usize = 160;

const H0: [u32; 5] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476, 0xc3d2e1f0];

/// Round constants for the left and right lines.
const KL: [u32; 5] = [0, 0x5a827999, 0x6ed9eba1, 0x8f1bbcdc, 0xa953fd4e];
const KR: [u32; 5] = [0x50a28be6, 0x5c4dd124, 0x6d703ef3, 0x7a6d76e9, 0];

/// Message-word selection, left line.
#[rustfmt::skip]
const RL: [usize; 80] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
    7, 4, 13, 1, 10, 6, 15, 3, 12, 0, 9, 5, 2, 14, 11, 8,
    3, 10, 14, 4, 9, 15, 8, 1, 2, 7, 0, 6, 13, 11, 5, 12,
    1, 9, 11, 10, 0, 8, 12, 4, 13, 3, 7, 15, 14, 5, 6, 2,
    4, 0, 5, 9, 7, 12, 2, 10, 14, 1, 3, 8, 11, 6, 15, 13,
];

/// Message-word selection, right line.
#[rustfmt::skip]
const RR: [usize; 80] = [
    5, 14, 7, 0, 9, 2, 11, 4, 13, 6, 15, 8, 1, 10, 3, 12,
    6, 11, 3, 7, 0, 13, 5, 10, 14, 15, 8, 12, 4, 9, 1, 2,
    15, 5, 1, 3, 7, 14, 6, 9, 11, 8, 12, 2, 10, 0, 4, 13,
    8, 6, 4, 1, 3, 11, 15, 0, 5, 12, 2, 13, 9, 7, 10, 14,
    12, 15, 10, 4, 1, 5, 8, 7, 6, 2, 13, 14, 0, 3, 9, 11,
];

/// Left-rotation amounts, left line.
#[rustfmt::skip]
const SL: [usize; 80] = [
    11, 14, 15, 12, 5, 8, 7, 9, 11, 13, 14, 15, 6, 7, 9, 8,
    7, 6, 8, 13, 11, 9, 7, 15, 7, 12, 15, 9, 11, 7, 13, 12,
    11, 13, 6, 7, 14, 9, 13, 15, 14, 8, 13, 6, 5, 12, 7, 5,
    11, 12, 14, 15, 14, 15, 9, 8, 9, 14, 5, 6, 8, 6, 5, 12,
    9, 15, 5, 11, 6, 8, 13, 12, 5, 12, 13, 14, 11, 8, 5, 6,
];

/// Left-rotation amounts, right line.
#[rustfmt::skip]
const SR: [usize; 80] = [
    8, 9, 9, 11, 13, 15, 15, 5, 7, 7, 8, 11, 14, 14, 12, 6,
    9, 13, 15, 7, 12, 8, 9, 11, 7, 7, 12, 7, 6, 15, 13, 11,
    9, 7, 15, 11, 8, 6, 6, 14, 12, 13, 5, 14, 13, 13, 7, 5,
    15, 5, 8, 11, 14, 14, 6, 14, 6, 9, 12, 9, 12, 5, 15, 8,
    8, 5, 12, 9, 12, 5, 14, 6, 8, 13, 6, 5, 15, 13, 11, 11,
];

/// Symbolic RIPEMD-160 with an adjustable subround count.
///
/// The difficulty counts subrounds across both lines: values up to 80
/// run only (part of) the left line, 160 runs the full compression.
pub struct Ripemd160 {
    difficulty: usize,
    /// Chaining state, five 32-bit words.
    state: Vec<SymBitVec>,
    /// The sixteen 32-bit message words of the current block.
    x: Vec<SymBitVec>,
}

impl Ripemd160 {
    /// A full-round (160 subrounds) hasher.
    pub fn new() -> Self {
        Self::with_difficulty(NUM_SUBROUNDS)
    }

    /// Limits every compression to its first `difficulty` subrounds.
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            difficulty,
            state: Vec::new(),
            x: Vec::new(),
        }
    }

    fn reset_state(&mut self) {
        self.state = H0
            .iter()
            .map(|&word| SymBitVec::from_u64(word as u64, 32))
            .collect();
        self.x = (0..16).map(|_| SymBitVec::from_u64(0, 32)).collect();
    }

    fn transform(&mut self) {
        let mut left = self.state.clone();
        let mut right = self.state.clone();

        let total = self.difficulty.min(NUM_SUBROUNDS);
        let left_steps = total.min(80);
        let right_steps = total.saturating_sub(80);
        self.line(&mut left, left_steps, &KL, &RL, &SL, false);
        self.line(&mut right, right_steps, &KR, &RR, &SR, true);

        let mixed = vec![
            &self.state[1] + &left[2] + &right[3],
            &self.state[2] + &left[3] + &right[4],
            &self.state[3] + &left[4] + &right[0],
            &self.state[4] + &left[0] + &right[1],
            &self.state[0] + &left[1] + &right[2],
        ];
        self.state = mixed;
    }

    /// Runs `steps` subrounds of one compression line in place.
    fn line(
        &self,
        regs: &mut [SymBitVec],
        steps: usize,
        k: &[u32; 5],
        r: &[usize; 80],
        s: &[usize; 80],
        reversed_rounds: bool,
    ) {
        for step in 0..steps {
            let round = step / 16;
            let func = if reversed_rounds { 4 - round } else { round };
            // Register roles rotate one slot per subround.
            let a = (5 - (step % 5)) % 5;
            let (b, c, d, e) = ((a + 1) % 5, (a + 2) % 5, (a + 3) % 5, (a + 4) % 5);

            let f = {
                let (x_, y_, z_) = (&regs[b], &regs[c], &regs[d]);
                match func {
                    0 => SymBitVec::xor3(x_, y_, z_),
                    1 => z_ ^ &(x_ & &(y_ ^ z_)),
                    2 => (x_ | &(!y_)) ^ z_,
                    3 => y_ ^ &(z_ & &(x_ ^ y_)),
                    _ => x_ ^ &(y_ | &(!z_)),
                }
            };
            let kc = SymBitVec::from_u64(k[round] as u64, 32);
            let sum = &regs[a] + f + &self.x[r[step]] + kc;
            let stepped = rotl32(&sum, s[step]) + &regs[e];
            regs[a] = stepped;
            let rotated = rotl32(&regs[c], 10);
            regs[c] = rotated;
        }
    }

    fn finalize(&mut self, input: &SymBitVec, mut bit_index: usize, lo: usize) {
        let hi = 0usize;
        for i in 0..16 {
            self.x[i] = SymBitVec::from_u64(0, 32);
        }

        // Fold the trailing bytes of the message into the word array.
        for i in 0..(lo & 63) {
            let byte = input.extract(bit_index, bit_index + 8).resize(32) << (8 * (i & 3));
            let folded = &self.x[i >> 2] ^ &byte;
            self.x[i >> 2] = folded;
            bit_index += 8;
        }

        // The 0x80 padding marker lands right after the message.
        let marker = SymBitVec::from_u64(1u64 << (8 * (lo & 3) + 7), 32);
        let terminated = &self.x[(lo >> 2) & 15] ^ &marker;
        self.x[(lo >> 2) & 15] = terminated;

        if (lo & 63) > 55 {
            // No room for the length; it goes into an extra block.
            self.transform();
            for i in 0..16 {
                self.x[i] = SymBitVec::from_u64(0, 32);
            }
        }

        self.x[14] = SymBitVec::from_u64((lo as u64) << 3, 32);
        self.x[15] = SymBitVec::from_u64(((lo >> 29) | (hi << 3)) as u64, 32);
        self.transform();
    }
}

impl Default for Ripemd160 {
    fn default() -> Self {
        Self::new()
    }
}

impl SymHash for Ripemd160 {
    fn name(&self) -> &'static str {
        "RIPEMD160"
    }

    fn default_difficulty(&self) -> usize {
        NUM_SUBROUNDS
    }

    /// # Panics
    /// Panics if the input width is not a multiple of 8.
    fn hash(&mut self, input: &SymBitVec) -> SymBitVec {
        assert!(
            input.len() % 8 == 0,
            "RIPEMD-160 input must be byte-aligned, got {} bits",
            input.len()
        );
        let num_bytes = input.len() / 8;
        self.reset_state();

        let mut bit_index = 0;
        let mut remaining = num_bytes;
        while remaining > 63 {
            for i in 0..16 {
                self.x[i] = input.extract(bit_index, bit_index + 32);
                bit_index += 32;
            }
            self.transform();
            remaining -= 64;
        }
        self.finalize(input, bit_index, num_bytes);

        let mut bytes: Vec<SymBitVec> = Vec::with_capacity(20);
        for word in &self.state {
            bytes.push(word.extract(0, 8));
            bytes.push((word >> 8).extract(0, 8));
            bytes.push((word >> 16).extract(0, 8));
            bytes.push((word >> 24).extract(0, 8));
        }
        let mut combined = SymBitVec::default();
        for piece in &bytes {
            combined = piece.concat(&combined);
        }
        combined
    }
}

/// Rotates the 32-bit value left by `n`.
fn rotl32(x: &SymBitVec, n: usize) -> SymBitVec {
    (x << n) | &(x >> (32 - n))
}
