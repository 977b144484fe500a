//! Symbolic SHA-256, MD5 and RIPEMD-160 on top of the [`preimage`]
//! engine.
//!
//! Each hasher runs the published algorithm over
//! [`SymBitVec`](preimage::SymBitVec) values, so a single code path
//! yields both concrete digests (constant inputs fold completely) and
//! constraint DAGs (unknown inputs record gates). A `difficulty`
//! parameter caps the number of rounds per compression, which keeps
//! reduced-round preimage problems within reach of the DAG solver;
//! the default difficulty runs the full algorithm.
//!
//! Inputs must be byte-aligned bit strings. Digest bit vectors render to
//! the conventional hex form via
//! [`SymBitVec::hex`](preimage::SymBitVec::hex).

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod md5;
mod ripemd160;
mod sha256;

pub use crate::md5::Md5;
pub use crate::ripemd160::Ripemd160;
pub use crate::sha256::Sha256;
