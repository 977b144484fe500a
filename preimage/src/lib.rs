//! Symbolic execution of hash functions into boolean gate DAGs, and a
//! backtracking solver that recovers preimages from observed digests.
//!
//! A hash function written against [`SymBitVec`] can be run in two modes.
//! Over constant bits, every operation folds immediately and the digest
//! comes out as a plain bit string. Over unknown bits, each operation that
//! cannot be folded allocates a fresh variable and records a typed gate
//! (AND, OR, XOR, XOR3, MAJ3) in a thread-local registry, producing a DAG
//! that relates the unknown input bits to the output bits. The pruned and
//! reindexed DAG is captured as a [`SymRepresentation`], which can be
//! persisted, converted to CNF for external solvers, or handed together
//! with observed output bits to the built-in [`DagSolver`].
//!
//! Variables are addressed by signed literals: `+i` is variable `i`, `-i`
//! its negation, and `0` marks "absent" in input/output index vectors.
//! Negation never allocates a gate; it only flips the sign of a literal.
//!
//! # Examples
//!
//! ```
//! use preimage::{DagSolver, Error, Gate, SymRepresentation};
//! use std::collections::HashMap;
//!
//! fn main() -> Result<(), Error> {
//!     // A single gate: variable 3 is the AND of variable 1 and NOT 2.
//!     let gate: Gate = "A 3 1 -2".parse()?;
//!     let problem = SymRepresentation::new(vec![gate], vec![1, -2], vec![3]);
//!
//!     // Observing the output forces both inputs through unit propagation.
//!     let mut observed = HashMap::new();
//!     observed.insert(3, true);
//!
//!     let mut solver = DagSolver::new();
//!     let solution = solver.solve(&problem, &observed)?;
//!     assert_eq!(solution[&1], true);
//!     assert_eq!(solution[&2], false);
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod bit;
mod bitvec;
mod cnf;
mod gate;
mod hash;
mod representation;
mod solver;

pub mod bits;
pub mod config;

pub use bit::SymBit;
pub use bitvec::SymBitVec;
pub use cnf::{Cnf, Simplification};
pub use gate::{Gate, GateKind};
pub use hash::SymHash;
pub use representation::SymRepresentation;
pub use solver::DagSolver;

/// A signed variable reference: `+i` is variable `i`, `-i` its negation.
///
/// Zero never denotes a variable; it is reserved for "unused" slots in
/// input/output index vectors.
pub type Lit = i32;

/// Errors surfaced while building, persisting or solving gate DAGs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The search space is exhausted, or the given observations contradict
    /// the gate DAG. The problem is infeasible rather than malformed.
    Unsat,
    /// An observation map referenced a zero or negative variable index.
    ObservationIndex(Lit),
    /// A clause was scored under an assignment missing one of its literals.
    MissingAssignment(Lit),
    /// A bit string did not match the expected width.
    WidthMismatch {
        /// The width required by the operation.
        expected: usize,
        /// The width actually supplied.
        got: usize,
    },
    /// A gate line could not be parsed, or violates the gate invariants.
    InvalidGate(String),
    /// A DAG file is structurally malformed.
    InvalidDag(String),
    /// A CNF file is structurally malformed.
    InvalidCnf(String),
    /// A hex string contained a non-hexadecimal character.
    InvalidHex(String),
    /// An underlying I/O operation failed.
    Io(String),
    /// The binary representation format could not be (de)serialized.
    Bincode,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Unsat => f.write_str("The problem is unsatisfiable"),
            Error::ObservationIndex(lit) => write!(
                f,
                "Observations must use positive variable indices (got {lit})"
            ),
            Error::MissingAssignment(lit) => write!(
                f,
                "No assignment given for variable {lit} while scoring a clause"
            ),
            Error::WidthMismatch { expected, got } => write!(
                f,
                "Expected a bit string of width {expected} but got {got}"
            ),
            Error::InvalidGate(msg) => write!(f, "Invalid gate: {msg}"),
            Error::InvalidDag(msg) => write!(f, "Invalid DAG: {msg}"),
            Error::InvalidCnf(msg) => write!(f, "Invalid CNF: {msg}"),
            Error::InvalidHex(s) => write!(f, "Not a hexadecimal string: {s:?}"),
            Error::Io(msg) => write!(f, "I/O error: {msg}"),
            Error::Bincode => {
                f.write_str("The representation could not be serialized to / deserialized from bincode")
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(_: bincode::Error) -> Self {
        Self::Bincode
    }
}
