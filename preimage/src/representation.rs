//! Pruned, reindexed snapshots of a symbolic run.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cnf::Cnf;
use crate::gate::Gate;
use crate::{Error, Lit};

/// An immutable gate DAG together with its input and output literal
/// vectors.
///
/// Construction prunes every gate no output depends on and compacts the
/// surviving variables to `1..=num_vars`, preserving their relative
/// order. Because gates are emitted with strictly increasing output
/// indices, the stored gate list stays topologically sorted: each gate's
/// inputs have a smaller absolute index than its output.
///
/// Index vectors use signed literals; a 0 entry marks a position whose
/// bit folded to a constant and was optimized away.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymRepresentation {
    num_vars: usize,
    gates: Vec<Gate>,
    input_indices: Vec<Lit>,
    output_indices: Vec<Lit>,
}

impl SymRepresentation {
    /// Builds a representation from raw gates and I/O index vectors,
    /// pruning and reindexing in the process.
    ///
    /// # Panics
    /// Panics if a gate output is not positive.
    pub fn new(gates: Vec<Gate>, input_indices: Vec<Lit>, output_indices: Vec<Lit>) -> Self {
        let mut rep = Self {
            num_vars: 0,
            gates,
            input_indices,
            output_indices,
        };
        rep.prune();
        rep.reindex();
        rep
    }

    /// Number of variables; all literals lie in `1..=num_vars`.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// The gates, topologically ordered.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Signed variable indices of the hash input bits; 0 where the input
    /// bit is not referenced by any surviving gate or output.
    pub fn input_indices(&self) -> &[Lit] {
        &self.input_indices
    }

    /// Signed variable indices of the hash output bits; 0 where the
    /// output bit folded to a constant.
    pub fn output_indices(&self) -> &[Lit] {
        &self.output_indices
    }

    /// Drops every gate that is not an ancestor of some output bit.
    fn prune(&mut self) {
        let num_before = self.gates.len();
        let mut by_output: HashMap<Lit, Gate> = HashMap::with_capacity(num_before);
        for gate in self.gates.drain(..) {
            assert!(gate.output > 0, "gate outputs must be positive");
            by_output.insert(gate.output, gate);
        }

        let mut queue: VecDeque<Lit> = self
            .output_indices
            .iter()
            .filter(|&&index| index != 0)
            .map(|index| index.abs())
            .collect();
        let mut seen: BTreeSet<Lit> = BTreeSet::new();
        // Keyed by output index, so iteration recovers emission order.
        let mut useful: BTreeMap<Lit, Gate> = BTreeMap::new();

        while let Some(var) = queue.pop_front() {
            if !seen.insert(var) {
                continue;
            }
            if let Some(gate) = by_output.remove(&var) {
                for &input in &gate.inputs {
                    if !seen.contains(&input.abs()) {
                        queue.push_back(input.abs());
                    }
                }
                useful.insert(var, gate);
            }
        }

        self.gates = useful.into_values().collect();
        if num_before > self.gates.len() {
            debug!(
                before = num_before,
                after = self.gates.len(),
                "pruned gates with no path to an output"
            );
        }
    }

    /// Relabels the surviving variables as consecutive indices starting
    /// at 1, preserving signs and relative order.
    fn reindex(&mut self) {
        let mut old_indices: BTreeSet<Lit> = BTreeSet::new();
        for &output in &self.output_indices {
            if output != 0 {
                old_indices.insert(output.abs());
            }
        }
        for gate in &self.gates {
            old_indices.insert(gate.output);
            for &input in &gate.inputs {
                old_indices.insert(input.abs());
            }
        }

        let relabel: HashMap<Lit, Lit> = old_indices
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new as Lit + 1))
            .collect();
        let map = |lit: Lit| -> Lit {
            match relabel.get(&lit.abs()) {
                Some(&new) => lit.signum() * new,
                None => 0,
            }
        };

        for gate in &mut self.gates {
            gate.output = map(gate.output);
            for input in &mut gate.inputs {
                *input = map(*input);
            }
        }
        for index in &mut self.input_indices {
            *index = map(*index);
        }
        for index in &mut self.output_indices {
            *index = map(*index);
        }
        self.num_vars = relabel.len();
    }

    /// Checks the structural invariants of a loaded representation.
    fn validate(&self) -> Result<(), Error> {
        let num_vars = self.num_vars as Lit;
        let mut outputs_seen: BTreeSet<Lit> = BTreeSet::new();
        for gate in &self.gates {
            if gate.output <= 0 || gate.output > num_vars {
                return Err(Error::InvalidDag(format!(
                    "gate output {} outside 1..={num_vars}",
                    gate.output
                )));
            }
            if !outputs_seen.insert(gate.output) {
                return Err(Error::InvalidDag(format!(
                    "two gates share output {}",
                    gate.output
                )));
            }
            for &input in &gate.inputs {
                if input == 0 || input.abs() > num_vars {
                    return Err(Error::InvalidDag(format!(
                        "gate input {input} outside the variable range"
                    )));
                }
                if input.abs() >= gate.output {
                    return Err(Error::InvalidDag(format!(
                        "gate input {input} does not precede output {}",
                        gate.output
                    )));
                }
            }
        }
        for &index in self.input_indices.iter().chain(&self.output_indices) {
            if index.abs() > num_vars {
                return Err(Error::InvalidDag(format!(
                    "index {index} outside the variable range"
                )));
            }
        }
        Ok(())
    }

    /// Writes the representation in the textual DAG format.
    ///
    /// The header carries `num_inputs num_outputs num_vars num_gates`,
    /// followed by the input index row, the output index row and one gate
    /// per line.
    pub fn write_dag<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writeln!(
            writer,
            "{} {} {} {}",
            self.input_indices.len(),
            self.output_indices.len(),
            self.num_vars,
            self.gates.len()
        )?;
        writeln!(writer, "{}", join_indices(&self.input_indices))?;
        writeln!(writer, "{}", join_indices(&self.output_indices))?;
        for gate in &self.gates {
            writeln!(writer, "{gate}")?;
        }
        Ok(())
    }

    /// Saves the textual DAG format to `path`.
    pub fn to_dag<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        self.write_dag(BufWriter::new(file))
    }

    /// Reads the textual DAG format.
    ///
    /// Lines starting with `#` are comments, surrounding whitespace is
    /// tolerated, and the loaded structure is validated against the DAG
    /// invariants. The gates are taken as-is; no pruning is re-applied,
    /// so a load returns exactly what was stored.
    pub fn read_dag<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut lines = reader.lines();
        let mut next_line = |skip_blank: bool| -> Result<String, Error> {
            for line in lines.by_ref() {
                let line = line?;
                let trimmed = line.trim();
                if trimmed.starts_with('#') {
                    continue;
                }
                if trimmed.is_empty() && skip_blank {
                    continue;
                }
                return Ok(trimmed.to_string());
            }
            Err(Error::InvalidDag("unexpected end of file".to_string()))
        };

        let header = parse_indices(&next_line(true)?)?;
        if header.len() != 4 || header.iter().any(|&n| n < 0) {
            return Err(Error::InvalidDag(format!(
                "expected header \"num_inputs num_outputs num_vars num_gates\", got {header:?}"
            )));
        }
        let (num_inputs, num_outputs) = (header[0] as usize, header[1] as usize);
        let (num_vars, num_gates) = (header[2] as usize, header[3] as usize);

        let input_indices = parse_indices(&next_line(num_inputs > 0)?)?;
        if input_indices.len() != num_inputs {
            return Err(Error::InvalidDag(format!(
                "expected {num_inputs} input indices, got {}",
                input_indices.len()
            )));
        }
        let output_indices = parse_indices(&next_line(num_outputs > 0)?)?;
        if output_indices.len() != num_outputs {
            return Err(Error::InvalidDag(format!(
                "expected {num_outputs} output indices, got {}",
                output_indices.len()
            )));
        }

        let mut gates = Vec::with_capacity(num_gates);
        for _ in 0..num_gates {
            gates.push(next_line(true)?.parse::<Gate>()?);
        }

        let rep = Self {
            num_vars,
            gates,
            input_indices,
            output_indices,
        };
        rep.validate()?;
        Ok(rep)
    }

    /// Loads the textual DAG format from `path`.
    pub fn from_dag<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::read_dag(BufReader::new(file))
    }

    /// Serializes to the compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserializes the output of [`to_bytes`](Self::to_bytes),
    /// validating the DAG invariants.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let rep: Self = bincode::deserialize(bytes)?;
        rep.validate()?;
        Ok(rep)
    }

    /// Expands every gate into its CNF clauses.
    pub fn to_cnf(&self) -> Cnf {
        Cnf::from_gates(&self.gates)
    }

    /// A blake3 content hash, usable to compare representations cheaply.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.num_vars as u64).to_be_bytes());
        for gate in &self.gates {
            hasher.update(&[gate.kind.tag() as u8]);
            hasher.update(&gate.output.to_be_bytes());
            for &input in &gate.inputs {
                hasher.update(&input.to_be_bytes());
            }
        }
        hasher.update(&(self.input_indices.len() as u64).to_be_bytes());
        for &index in self.input_indices.iter().chain(&self.output_indices) {
            hasher.update(&index.to_be_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    /// Turns observed output bits into a solver observation map.
    ///
    /// Constant output positions are skipped; a negated output literal
    /// inverts the observed bit, so the map only ever holds positive
    /// variable indices.
    pub fn observe_output(&self, bits: &[bool]) -> Result<HashMap<Lit, bool>, Error> {
        if bits.len() != self.output_indices.len() {
            return Err(Error::WidthMismatch {
                expected: self.output_indices.len(),
                got: bits.len(),
            });
        }
        let mut observed = HashMap::new();
        for (position, &index) in self.output_indices.iter().enumerate() {
            if index < 0 {
                observed.insert(-index, !bits[position]);
            } else if index > 0 {
                observed.insert(index, bits[position]);
            }
        }
        Ok(observed)
    }

    /// Reads the input bits back out of a solver assignment.
    ///
    /// Input positions the assignment does not constrain default to
    /// `false`; any value works for them.
    pub fn recover_input(&self, assignment: &HashMap<Lit, bool>) -> Vec<bool> {
        self.input_indices
            .iter()
            .map(|&index| {
                if index < 0 {
                    assignment.get(&-index).map(|&v| !v).unwrap_or(false)
                } else if index > 0 {
                    assignment.get(&index).copied().unwrap_or(false)
                } else {
                    false
                }
            })
            .collect()
    }
}

fn join_indices(indices: &[Lit]) -> String {
    indices
        .iter()
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_indices(line: &str) -> Result<Vec<Lit>, Error> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<Lit>()
                .map_err(|_| Error::InvalidDag(format!("bad index {token:?}")))
        })
        .collect()
}
