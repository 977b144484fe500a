//! Thread-local knobs for symbolic execution.
//!
//! Like the gate registry itself, configuration is per-thread: changing a
//! flag never affects symbolic runs on other threads.

use std::cell::Cell;

thread_local! {
    static ONLY_AND_GATES: Cell<bool> = Cell::new(false);
}

/// Restricts gate emission to AND gates (plus free negation).
///
/// While enabled, OR, XOR, XOR3 and MAJ3 are rewritten into compositions
/// of AND and NOT instead of allocating primitive gates. The computed
/// digest is unchanged; only the shape of the recorded DAG differs.
pub fn set_only_and_gates(enabled: bool) {
    ONLY_AND_GATES.with(|flag| flag.set(enabled));
}

/// Whether gate emission is currently restricted to AND gates.
pub fn only_and_gates() -> bool {
    ONLY_AND_GATES.with(|flag| flag.get())
}
