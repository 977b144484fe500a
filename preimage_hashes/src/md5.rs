//! Symbolic MD5.

use preimage::{SymBitVec, SymHash};

const BLOCK_SIZE: usize = 64;
const NUM_STEPS: usize = 64;

#[rustfmt::skip]
const K: [u32; 64] = [
    0xd76aa478, 0xe8c7b756, 0x242070db, 0xc1bdceee, 0xf57c0faf, 0x4787c62a, 0xa8304613,
    0xfd469501, 0x698098d8, 0x8b44f7af, 0xffff5bb1, 0x895cd7be, 0x6b901122, 0xfd987193,
    0xa679438e, 0x49b40821, 0xf61e2562, 0xc040b340, 0x265e5a51, 0xe9b6c7aa, 0xd62f105d,
    0x02441453, 0xd8a1e681, 0xe7d3fbc8, 0x21e1cde6, 0xc33707d6, 0xf4d50d87, 0x455a14ed,
    0xa9e3e905, 0xfcefa3f8, 0x676f02d9, 0x8d2a4c8a, 0xfffa3942, 0x8771f681, 0x6d9d6122,
    0xfde5380c, 0xa4beea44, 0x4bdecfa9, 0xf6bb4b60, 0xbebfbc70, 0x289b7ec6, 0xeaa127fa,
    0xd4ef3085, 0x04881d05, 0xd9d4d039, 0xe6db99e5, 0x1fa27cf8, 0xc4ac5665, 0xf4292244,
    0x432aff97, 0xab9423a7, 0xfc93a039, 0x655b59c3, 0x8f0ccc92, 0xffeff47d, 0x85845dd1,
    0x6fa87e4f, 0xfe2ce6e0, 0xa3014314, 0x4e0811a1, 0xf7537e82, 0xbd3af235, 0x2ad7d2bb,
    0xeb86d391,
];

/// Per-round left-rotation amounts.
const S: [[usize; 4]; 4] = [
    [7, 12, 17, 22],
    [5, 9, 14, 20],
    [4, 11, 16, 23],
    [6, 10, 15, 21],
];

const H0: [u32; 4] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476];

/// Symbolic MD5 with an adjustable step count per block.
pub struct Md5 {
    difficulty: usize,
    /// Bit count as two 32-bit halves, low first.
    count: [u32; 2],
    /// Chaining state, four 32-bit words.
    state: Vec<SymBitVec>,
    /// Bytes that did not fill a 64-byte block yet.
    buffer: Vec<SymBitVec>,
}

impl Md5 {
    /// A full-round (64 steps) hasher.
    pub fn new() -> Self {
        Self::with_difficulty(NUM_STEPS)
    }

    /// Limits every block transform to its first `difficulty` steps.
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            difficulty,
            count: [0, 0],
            state: Vec::new(),
            buffer: Vec::new(),
        }
    }

    fn reset_state(&mut self) {
        self.count = [0, 0];
        self.state = H0
            .iter()
            .map(|&word| SymBitVec::from_u64(word as u64, 32))
            .collect();
        self.buffer = (0..BLOCK_SIZE)
            .map(|_| SymBitVec::from_u64(0, 8))
            .collect();
    }

    fn update(&mut self, input: &[SymBitVec]) {
        let len = input.len();
        let mut index = (self.count[0] as usize / 8) % BLOCK_SIZE;

        let added_bits = (len as u32).wrapping_shl(3);
        self.count[0] = self.count[0].wrapping_add(added_bits);
        if self.count[0] < added_bits {
            self.count[1] = self.count[1].wrapping_add(1);
        }
        self.count[1] = self.count[1].wrapping_add((len as u32) >> 29);

        let first_part = BLOCK_SIZE - index;
        let mut consumed = 0;
        if len >= first_part {
            for i in 0..first_part {
                self.buffer[index + i] = input[i].clone();
            }
            let block = self.buffer.clone();
            self.transform(&block);

            consumed = first_part;
            while consumed + BLOCK_SIZE <= len {
                let block = input[consumed..consumed + BLOCK_SIZE].to_vec();
                self.transform(&block);
                consumed += BLOCK_SIZE;
            }
            index = 0;
        }

        for i in 0..len - consumed {
            self.buffer[index + i] = input[consumed + i].clone();
        }
    }

    fn transform(&mut self, block: &[SymBitVec]) {
        let x = decode(block);
        // Register names a, b, c, d; each step writes a rotating slot.
        let mut v = self.state.clone();

        for step in 0..NUM_STEPS.min(self.difficulty) {
            let round = step / 16;
            let msg = match round {
                0 => step,
                1 => (5 * step + 1) % 16,
                2 => (3 * step + 5) % 16,
                _ => (7 * step) % 16,
            };
            let a = (4 - (step % 4)) % 4;
            let (b, c, d) = ((a + 1) % 4, (a + 2) % 4, (a + 3) % 4);

            let f = {
                let (x_, y_, z_) = (&v[b], &v[c], &v[d]);
                match round {
                    0 => (x_ & y_) | &((!x_) & z_),
                    1 => (x_ & z_) | &(y_ & &(!z_)),
                    2 => SymBitVec::xor3(x_, y_, z_),
                    _ => y_ ^ &(x_ | &(!z_)),
                }
            };
            let ki = SymBitVec::from_u64(K[step] as u64, 32);
            let sum = &v[a] + f + &x[msg] + ki;
            let stepped = rotl32(&sum, S[round][step % 4]) + &v[b];
            v[a] = stepped;
        }

        for i in 0..4 {
            let chained = &self.state[i] + &v[i];
            self.state[i] = chained;
        }
    }

    fn finalize(&mut self) -> Vec<SymBitVec> {
        // Save the bit count before padding mutates it.
        let length_bytes = encode(&[
            SymBitVec::from_u64(self.count[0] as u64, 32),
            SymBitVec::from_u64(self.count[1] as u64, 32),
        ]);

        let mut padding: Vec<SymBitVec> = (0..BLOCK_SIZE)
            .map(|_| SymBitVec::from_u64(0, 8))
            .collect();
        padding[0] = SymBitVec::from_u64(0x80, 8);

        // Pad out to 56 mod 64, then append the length.
        let index = (self.count[0] as usize / 8) % BLOCK_SIZE;
        let pad_len = if index < 56 { 56 - index } else { 120 - index };
        self.update(&padding[..pad_len]);
        self.update(&length_bytes);

        let state = self.state.clone();
        encode(&state)
    }
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl SymHash for Md5 {
    fn name(&self) -> &'static str {
        "MD5"
    }

    fn default_difficulty(&self) -> usize {
        NUM_STEPS
    }

    /// # Panics
    /// Panics if the input width is not a multiple of 8.
    fn hash(&mut self, input: &SymBitVec) -> SymBitVec {
        assert!(
            input.len() % 8 == 0,
            "MD5 input must be byte-aligned, got {} bits",
            input.len()
        );
        let num_bytes = input.len() / 8;
        let bytes: Vec<SymBitVec> = (0..num_bytes)
            .map(|i| input.extract(i * 8, (i + 1) * 8))
            .collect();

        self.reset_state();
        self.update(&bytes);
        let digest = self.finalize();

        let mut combined = SymBitVec::default();
        for piece in &digest {
            combined = piece.concat(&combined);
        }
        combined
    }
}

/// Packs 8-bit vectors into 32-bit words, little-endian.
fn decode(bytes: &[SymBitVec]) -> Vec<SymBitVec> {
    bytes
        .chunks(4)
        .map(|chunk| {
            chunk[0].resize(32)
                | (chunk[1].resize(32) << 8)
                | (chunk[2].resize(32) << 16)
                | (chunk[3].resize(32) << 24)
        })
        .collect()
}

/// Splits 32-bit words into 8-bit vectors, little-endian.
fn encode(words: &[SymBitVec]) -> Vec<SymBitVec> {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        bytes.push(word.extract(0, 8));
        bytes.push((word >> 8).extract(0, 8));
        bytes.push((word >> 16).extract(0, 8));
        bytes.push((word >> 24).extract(0, 8));
    }
    bytes
}

/// Rotates the 32-bit value left by `n`.
fn rotl32(x: &SymBitVec, n: usize) -> SymBitVec {
    (x << n) | &(x >> (32 - n))
}
