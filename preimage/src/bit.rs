//! Scalar symbolic bits and the thread-local gate registry.

use std::cell::{Cell, RefCell};
use std::ops::{BitAnd, BitOr, BitXor, Not};

use crate::config;
use crate::gate::{Gate, GateKind};
use crate::Lit;

thread_local! {
    static NEXT_INDEX: Cell<Lit> = Cell::new(1);
    static GATES: RefCell<Vec<Gate>> = RefCell::new(Vec::new());
}

/// Allocates the next variable index. Indices are 1-based; zero means
/// "constant" inside [`SymBit`] and "unused" in index vectors.
pub(crate) fn fresh_index() -> Lit {
    NEXT_INDEX.with(|counter| {
        let index = counter.get();
        counter.set(index + 1);
        index
    })
}

pub(crate) fn record_gate(gate: Gate) {
    GATES.with(|gates| gates.borrow_mut().push(gate));
}

/// Removes and returns all gates recorded on this thread so far.
pub(crate) fn take_gates() -> Vec<Gate> {
    GATES.with(|gates| std::mem::take(&mut *gates.borrow_mut()))
}

#[cfg(test)]
pub(crate) fn num_recorded_gates() -> usize {
    GATES.with(|gates| gates.borrow().len())
}

/// A single symbolic bit: either a known constant, or a signed reference
/// into the thread-local gate registry.
///
/// Operations fold constants eagerly and apply the usual boolean
/// identities (`x & x = x`, `x ^ x = 0`, `x & !x = 0`, ...), so a gate is
/// only recorded when the result is genuinely a new unknown. Negation is
/// free: it flips the sign of the stored index without touching the
/// registry, which is why no NOT gate kind exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymBit {
    val: bool,
    index: Lit,
}

impl SymBit {
    /// The constant 0.
    pub fn zero() -> Self {
        Self::constant(false)
    }

    /// The constant 1.
    pub fn one() -> Self {
        Self::constant(true)
    }

    /// A known constant bit.
    pub fn constant(val: bool) -> Self {
        Self { val, index: 0 }
    }

    /// Allocates a fresh variable without recording a gate.
    ///
    /// Only hash inputs do this; every other unknown bit is introduced as
    /// the output of a gate.
    pub fn unknown() -> Self {
        Self {
            val: false,
            index: fresh_index(),
        }
    }

    /// Allocates the output bit of a freshly recorded gate.
    fn fresh(val: bool) -> Self {
        Self {
            val,
            index: fresh_index(),
        }
    }

    /// Whether this bit refers to a registry variable rather than a
    /// constant.
    pub fn is_unknown(&self) -> bool {
        self.index != 0
    }

    /// The concrete value. Only meaningful when the bit is a constant.
    pub fn value(&self) -> bool {
        self.val
    }

    /// The signed variable index, or 0 for a constant.
    pub fn index(&self) -> Lit {
        self.index
    }

    /// Resets the thread-local registry: the variable counter returns to 1
    /// and the gate log is cleared.
    ///
    /// Every symbolic run must start from a reset registry; interleaving
    /// two runs on one thread produces intermixed gate logs and is not
    /// supported.
    pub fn reset() {
        NEXT_INDEX.with(|counter| counter.set(1));
        GATES.with(|gates| gates.borrow_mut().clear());
    }

    /// Three-way exclusive or.
    pub fn xor3(a: SymBit, b: SymBit, c: SymBit) -> SymBit {
        let mut knowns = Vec::new();
        let mut unknowns = Vec::new();
        for bit in [a, b, c] {
            if bit.is_unknown() {
                unknowns.push(bit);
            } else {
                knowns.push(bit.val);
            }
        }

        match knowns.len() {
            0 => {
                // Two equal operands cancel; two opposite operands invert.
                if a.index == b.index {
                    return c;
                }
                if a.index == c.index {
                    return b;
                }
                if b.index == c.index {
                    return a;
                }
                if a.index == -b.index {
                    return !c;
                }
                if a.index == -c.index {
                    return !b;
                }
                if b.index == -c.index {
                    return !a;
                }
                if config::only_and_gates() {
                    return a ^ b ^ c;
                }
                let result = SymBit::fresh(a.val ^ b.val ^ c.val);
                record_gate(Gate {
                    kind: GateKind::Xor3,
                    output: result.index,
                    inputs: vec![a.index, b.index, c.index],
                });
                result
            }
            1 => {
                if knowns[0] {
                    !(unknowns[0] ^ unknowns[1])
                } else {
                    unknowns[0] ^ unknowns[1]
                }
            }
            2 => unknowns[0] ^ SymBit::constant(knowns[0] ^ knowns[1]),
            _ => SymBit::constant(a.val ^ b.val ^ c.val),
        }
    }

    /// Majority vote of three bits.
    pub fn majority3(a: SymBit, b: SymBit, c: SymBit) -> SymBit {
        let mut knowns = Vec::new();
        let mut unknowns = Vec::new();
        for bit in [a, b, c] {
            if bit.is_unknown() {
                unknowns.push(bit);
            } else {
                knowns.push(bit.val);
            }
        }

        match knowns.len() {
            0 => {
                // Two equal operands hold the majority outright; two
                // opposite operands leave the decision to the third.
                if a.index == b.index {
                    return a;
                }
                if a.index == c.index {
                    return a;
                }
                if b.index == c.index {
                    return b;
                }
                if a.index == -b.index {
                    return c;
                }
                if a.index == -c.index {
                    return b;
                }
                if b.index == -c.index {
                    return a;
                }
                if config::only_and_gates() {
                    return !(!a & !b) & !(!a & !c) & !(!b & !c);
                }
                let sum = a.val as u8 + b.val as u8 + c.val as u8;
                let result = SymBit::fresh(sum > 1);
                record_gate(Gate {
                    kind: GateKind::Maj3,
                    output: result.index,
                    inputs: vec![a.index, b.index, c.index],
                });
                result
            }
            1 => {
                // A known 0 reduces Maj3 to AND of the rest, a known 1 to
                // OR of the rest.
                if knowns[0] {
                    unknowns[0] | unknowns[1]
                } else {
                    unknowns[0] & unknowns[1]
                }
            }
            2 => {
                if knowns[0] == knowns[1] {
                    SymBit::constant(knowns[0])
                } else {
                    unknowns[0]
                }
            }
            _ => {
                let sum = a.val as u8 + b.val as u8 + c.val as u8;
                SymBit::constant(sum > 1)
            }
        }
    }

    /// Half adder: returns `(sum, carry_out)`.
    pub fn half_add(a: SymBit, b: SymBit) -> (SymBit, SymBit) {
        Self::full_add(a, b, SymBit::zero())
    }

    /// Full adder: returns `(sum, carry_out)`.
    ///
    /// Composed as `sum = xor3(a, b, carry_in)` and
    /// `carry_out = majority3(a, b, carry_in)` so a single addition step
    /// costs at most two gates.
    pub fn full_add(a: SymBit, b: SymBit, carry_in: SymBit) -> (SymBit, SymBit) {
        let sum = SymBit::xor3(a, b, carry_in);
        let carry_out = SymBit::majority3(a, b, carry_in);
        (sum, carry_out)
    }
}

impl Not for SymBit {
    type Output = SymBit;

    fn not(self) -> SymBit {
        SymBit {
            val: !self.val,
            index: -self.index,
        }
    }
}

impl BitAnd for SymBit {
    type Output = SymBit;

    fn bitand(self, b: SymBit) -> SymBit {
        let a = self;
        // A constant 0 absorbs regardless of the other operand.
        if !a.is_unknown() && !a.val {
            return SymBit::zero();
        }
        if !b.is_unknown() && !b.val {
            return SymBit::zero();
        }

        match (a.is_unknown(), b.is_unknown()) {
            (true, true) => {
                if a.index == b.index {
                    return a;
                }
                if a.index == -b.index {
                    return SymBit::zero();
                }
                let result = SymBit::fresh(a.val & b.val);
                record_gate(Gate {
                    kind: GateKind::And,
                    output: result.index,
                    inputs: vec![a.index, b.index],
                });
                result
            }
            // The constant operand is 1 here, the identity element.
            (true, false) => a,
            (false, true) => b,
            (false, false) => SymBit::constant(a.val & b.val),
        }
    }
}

impl BitOr for SymBit {
    type Output = SymBit;

    fn bitor(self, b: SymBit) -> SymBit {
        let a = self;
        // A constant 1 absorbs regardless of the other operand.
        if !a.is_unknown() && a.val {
            return SymBit::one();
        }
        if !b.is_unknown() && b.val {
            return SymBit::one();
        }

        match (a.is_unknown(), b.is_unknown()) {
            (true, true) => {
                if a.index == b.index {
                    return a;
                }
                if a.index == -b.index {
                    return SymBit::one();
                }
                if config::only_and_gates() {
                    return !(!a & !b);
                }
                let result = SymBit::fresh(a.val | b.val);
                record_gate(Gate {
                    kind: GateKind::Or,
                    output: result.index,
                    inputs: vec![a.index, b.index],
                });
                result
            }
            // The constant operand is 0 here, the identity element.
            (true, false) => a,
            (false, true) => b,
            (false, false) => SymBit::constant(a.val | b.val),
        }
    }
}

impl BitXor for SymBit {
    type Output = SymBit;

    fn bitxor(self, b: SymBit) -> SymBit {
        let a = self;
        match (a.is_unknown(), b.is_unknown()) {
            (true, true) => {
                if a.index == b.index {
                    return SymBit::zero();
                }
                if a.index == -b.index {
                    return SymBit::one();
                }
                if config::only_and_gates() {
                    return !(a & b) & !(!a & !b);
                }
                let result = SymBit::fresh(a.val ^ b.val);
                record_gate(Gate {
                    kind: GateKind::Xor,
                    output: result.index,
                    inputs: vec![a.index, b.index],
                });
                result
            }
            // XOR with 0 passes through, XOR with 1 inverts.
            (true, false) => {
                if b.val {
                    !a
                } else {
                    a
                }
            }
            (false, true) => {
                if a.val {
                    !b
                } else {
                    b
                }
            }
            (false, false) => SymBit::constant(a.val ^ b.val),
        }
    }
}
