//! Typed boolean gates over signed literals.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Lit};

/// The relation a [`Gate`] encodes between its inputs and its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// 2-input AND.
    And,
    /// 2-input OR.
    Or,
    /// 2-input XOR.
    Xor,
    /// 3-input XOR.
    Xor3,
    /// 3-input majority.
    Maj3,
}

impl GateKind {
    /// Number of inputs a gate of this kind takes.
    pub fn arity(self) -> usize {
        match self {
            GateKind::And | GateKind::Or | GateKind::Xor => 2,
            GateKind::Xor3 | GateKind::Maj3 => 3,
        }
    }

    /// One-letter tag used by the textual gate form.
    pub fn tag(self) -> char {
        match self {
            GateKind::And => 'A',
            GateKind::Or => 'O',
            GateKind::Xor => 'X',
            GateKind::Xor3 => 'Z',
            GateKind::Maj3 => 'M',
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "A" => Some(GateKind::And),
            "O" => Some(GateKind::Or),
            "X" => Some(GateKind::Xor),
            "Z" => Some(GateKind::Xor3),
            "M" => Some(GateKind::Maj3),
            _ => None,
        }
    }
}

/// A typed n-ary relation among signed literals with one designated
/// output.
///
/// The output literal is always positive and unique within a DAG; input
/// literals are signed and never zero. Negation is encoded inline in the
/// literal signs, so there is no NOT gate kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// The boolean relation this gate encodes.
    pub kind: GateKind,
    /// The output literal.
    pub output: Lit,
    /// The input literals, `kind.arity()` of them.
    pub inputs: Vec<Lit>,
}

impl Gate {
    /// Creates a gate, checking arity and literal invariants.
    pub fn new(kind: GateKind, output: Lit, inputs: Vec<Lit>) -> Result<Self, Error> {
        if output <= 0 {
            return Err(Error::InvalidGate(format!(
                "gate output must be positive, got {output}"
            )));
        }
        if inputs.len() != kind.arity() {
            return Err(Error::InvalidGate(format!(
                "gate {} takes {} input(s) but got {}",
                kind.tag(),
                kind.arity(),
                inputs.len()
            )));
        }
        if inputs.iter().any(|&lit| lit == 0) {
            return Err(Error::InvalidGate(
                "gate inputs must be nonzero literals".to_string(),
            ));
        }
        Ok(Self {
            kind,
            output,
            inputs,
        })
    }

    /// CNF clauses equivalent to this gate.
    pub fn cnf(&self) -> Vec<Vec<Lit>> {
        let o = self.output;
        let x = self.inputs[0];
        let y = self.inputs[1];
        match self.kind {
            GateKind::And => vec![vec![-o, x], vec![-o, y], vec![o, -x, -y]],
            GateKind::Or => vec![vec![o, -x], vec![o, -y], vec![-o, x, y]],
            GateKind::Xor => vec![
                vec![o, x, -y],
                vec![o, -x, y],
                vec![-o, x, y],
                vec![-o, -x, -y],
            ],
            GateKind::Xor3 => {
                let z = self.inputs[2];
                vec![
                    vec![o, x, y, -z],
                    vec![o, x, -y, z],
                    vec![o, -x, y, z],
                    vec![o, -x, -y, -z],
                    vec![-o, x, y, z],
                    vec![-o, x, -y, -z],
                    vec![-o, -x, y, -z],
                    vec![-o, -x, -y, z],
                ]
            }
            GateKind::Maj3 => {
                let z = self.inputs[2];
                vec![
                    vec![-o, x, y],
                    vec![-o, x, z],
                    vec![-o, y, z],
                    vec![o, -x, -y],
                    vec![o, -x, -z],
                    vec![o, -y, -z],
                ]
            }
        }
    }

    /// Whether the gate relation holds under a total assignment keyed by
    /// positive variable indices.
    pub fn eval(&self, assignment: &HashMap<Lit, bool>) -> Result<bool, Error> {
        let lookup = |lit: Lit| -> Result<bool, Error> {
            match assignment.get(&lit.abs()) {
                Some(&value) => Ok(if lit < 0 { !value } else { value }),
                None => Err(Error::MissingAssignment(lit.abs())),
            }
        };
        let out = lookup(self.output)?;
        let mut inputs = Vec::with_capacity(self.inputs.len());
        for &lit in &self.inputs {
            inputs.push(lookup(lit)?);
        }
        let expected = match self.kind {
            GateKind::And => inputs[0] & inputs[1],
            GateKind::Or => inputs[0] | inputs[1],
            GateKind::Xor => inputs[0] ^ inputs[1],
            GateKind::Xor3 => inputs[0] ^ inputs[1] ^ inputs[2],
            GateKind::Maj3 => inputs.iter().filter(|&&b| b).count() > 1,
        };
        Ok(out == expected)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.tag(), self.output)?;
        for input in &self.inputs {
            write!(f, " {input}")?;
        }
        Ok(())
    }
}

impl FromStr for Gate {
    type Err = Error;

    /// Parses the one-line form `T out in1 [in2 [in3]]`.
    fn from_str(line: &str) -> Result<Self, Error> {
        let mut tokens = line.split_whitespace();
        let kind = tokens
            .next()
            .and_then(GateKind::from_tag)
            .ok_or_else(|| Error::InvalidGate(format!("unrecognized gate line: {line:?}")))?;
        let mut numbers = Vec::new();
        for token in tokens {
            let lit: Lit = token
                .parse()
                .map_err(|_| Error::InvalidGate(format!("bad literal {token:?} in {line:?}")))?;
            numbers.push(lit);
        }
        if numbers.len() != 1 + kind.arity() {
            return Err(Error::InvalidGate(format!(
                "gate {} expects {} literals, got {} in {line:?}",
                kind.tag(),
                1 + kind.arity(),
                numbers.len()
            )));
        }
        let output = numbers[0];
        Gate::new(kind, output, numbers[1..].to_vec())
    }
}
