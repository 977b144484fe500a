//! Clause sets derived from gate DAGs.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::gate::Gate;
use crate::{Error, Lit};

/// A conjunction of disjunctive clauses over signed literals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cnf {
    /// The largest referenced variable index.
    pub num_vars: usize,
    /// Clauses as sets of nonzero literals.
    pub clauses: Vec<BTreeSet<Lit>>,
}

/// The outcome of [`Cnf::simplify`]: the reduced clause set plus the
/// bookkeeping needed to translate its solutions back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Simplification {
    /// The reduced clause set, variables compacted to `1..=num_vars`.
    pub cnf: Cnf,
    /// Mapping from compacted variable index back to the original one.
    pub lit_new_to_old: HashMap<Lit, Lit>,
    /// Every assignment known after unit propagation, keyed by original
    /// positive variable index. Includes the initial assignments.
    pub assignments: HashMap<Lit, bool>,
}

impl Cnf {
    /// Expands `gates` through the per-gate clause table.
    pub fn from_gates(gates: &[Gate]) -> Self {
        let mut num_vars = 0usize;
        let mut clauses = Vec::new();
        for gate in gates {
            for clause in gate.cnf() {
                for &lit in &clause {
                    num_vars = num_vars.max(lit.unsigned_abs() as usize);
                }
                clauses.push(clause.into_iter().collect());
            }
        }
        Self { num_vars, clauses }
    }

    /// Number of clauses.
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Counts clauses satisfied under an assignment keyed by positive
    /// variable index.
    ///
    /// The assignment may be partial, but every clause must be decidable
    /// from it: encountering an unassigned literal before a satisfying
    /// one is an error.
    pub fn num_sat_clauses(&self, assignment: &HashMap<Lit, bool>) -> Result<usize, Error> {
        let mut num_sat = 0;
        for clause in &self.clauses {
            for &lit in clause {
                let value = assignment
                    .get(&lit.abs())
                    .ok_or(Error::MissingAssignment(lit.abs()))?;
                if *value == (lit > 0) {
                    num_sat += 1;
                    break;
                }
            }
        }
        Ok(num_sat)
    }

    /// The fraction of satisfied clauses; 1.0 exactly when the assignment
    /// is a model.
    pub fn approximation_ratio(&self, assignment: &HashMap<Lit, bool>) -> Result<f64, Error> {
        if self.clauses.is_empty() {
            return Ok(1.0);
        }
        Ok(self.num_sat_clauses(assignment)? as f64 / self.clauses.len() as f64)
    }

    /// Propagates initial assignments through the clause set.
    ///
    /// A literal fixed to true removes its clauses; one fixed to false is
    /// deleted from its clauses. A clause reduced to a single literal
    /// forces that literal and the process repeats. Emptying a clause or
    /// forcing a variable both ways yields [`Error::Unsat`]. Surviving
    /// variables are compacted to `1..=k` in order of first appearance.
    pub fn simplify(&self, initial: &HashMap<Lit, bool>) -> Result<Simplification, Error> {
        let mut clauses: Vec<Option<BTreeSet<Lit>>> =
            self.clauses.iter().cloned().map(Some).collect();
        let mut lit2clauses: HashMap<Lit, Vec<usize>> = HashMap::new();
        for (index, clause) in self.clauses.iter().enumerate() {
            for &lit in clause {
                lit2clauses.entry(lit).or_insert_with(Vec::new).push(index);
            }
        }

        let mut known: HashMap<Lit, bool> = HashMap::new();
        let mut queue: Vec<(Lit, bool)> = Vec::new();
        for (&var, &value) in initial {
            if var <= 0 {
                return Err(Error::ObservationIndex(var));
            }
            queue.push((var, value));
        }
        queue.sort_unstable();

        while let Some((var, value)) = queue.pop() {
            match known.insert(var, value) {
                Some(previous) if previous != value => return Err(Error::Unsat),
                Some(_) => continue,
                None => {}
            }

            // Clauses containing the literal that came out true are
            // satisfied and disappear.
            let true_lit = if value { var } else { -var };
            if let Some(indices) = lit2clauses.get(&true_lit) {
                for &index in indices {
                    clauses[index] = None;
                }
            }

            // The opposite literal is deleted wherever it appears.
            if let Some(indices) = lit2clauses.get(&-true_lit) {
                for &index in indices {
                    let mut forced = None;
                    if let Some(clause) = clauses[index].as_mut() {
                        clause.remove(&-true_lit);
                        if clause.is_empty() {
                            return Err(Error::Unsat);
                        }
                        if clause.len() == 1 {
                            forced = clause.iter().next().copied();
                        }
                    }
                    if let Some(last) = forced {
                        queue.push((last.abs(), last > 0));
                        clauses[index] = None;
                    }
                }
            }
        }

        let mut old2new: HashMap<Lit, Lit> = HashMap::new();
        let mut next_var: Lit = 1;
        let mut new_clauses = Vec::new();
        for clause in clauses.into_iter().flatten() {
            let mut mapped = BTreeSet::new();
            for lit in clause {
                let new = *old2new.entry(lit.abs()).or_insert_with(|| {
                    let var = next_var;
                    next_var += 1;
                    var
                });
                mapped.insert(lit.signum() * new);
            }
            new_clauses.push(mapped);
        }

        let lit_new_to_old = old2new.iter().map(|(&old, &new)| (new, old)).collect();
        Ok(Simplification {
            cnf: Cnf {
                num_vars: (next_var - 1) as usize,
                clauses: new_clauses,
            },
            lit_new_to_old,
            assignments: known,
        })
    }

    /// Writes the DIMACS-like text form: a `p cnf` header, then one
    /// zero-terminated clause per line.
    pub fn write_dimacs<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writeln!(writer, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(writer, "{lit} ")?;
            }
            writeln!(writer, "0")?;
        }
        Ok(())
    }

    /// Saves the DIMACS-like text form to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        self.write_dimacs(BufWriter::new(file))
    }

    /// Reads the DIMACS-like text form.
    ///
    /// Lines starting with `c` or `#` are comments; blank lines and
    /// surrounding whitespace are ignored. Literals must stay within the
    /// variable count announced by the header.
    pub fn read_dimacs<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut header: Option<(usize, usize)> = None;
        let mut clauses = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('c') || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with('p') {
                let fields: Vec<&str> = trimmed.split_whitespace().collect();
                if fields.len() != 4 || fields[1] != "cnf" {
                    return Err(Error::InvalidCnf(format!("bad problem line: {trimmed:?}")));
                }
                let num_vars = fields[2]
                    .parse()
                    .map_err(|_| Error::InvalidCnf(format!("bad variable count {:?}", fields[2])))?;
                let num_clauses = fields[3]
                    .parse()
                    .map_err(|_| Error::InvalidCnf(format!("bad clause count {:?}", fields[3])))?;
                header = Some((num_vars, num_clauses));
                continue;
            }
            let (num_vars, _) = header
                .ok_or_else(|| Error::InvalidCnf("clause before the p cnf header".to_string()))?;
            let mut clause = BTreeSet::new();
            let mut terminated = false;
            for token in trimmed.split_whitespace() {
                let lit: Lit = token
                    .parse()
                    .map_err(|_| Error::InvalidCnf(format!("bad literal {token:?}")))?;
                if lit == 0 {
                    terminated = true;
                    break;
                }
                if lit.unsigned_abs() as usize > num_vars {
                    return Err(Error::InvalidCnf(format!(
                        "literal {lit} exceeds the {num_vars} declared variables"
                    )));
                }
                clause.insert(lit);
            }
            if !terminated {
                return Err(Error::InvalidCnf(format!(
                    "clause without terminating 0: {trimmed:?}"
                )));
            }
            clauses.push(clause);
        }
        match header {
            Some((num_vars, num_clauses)) => {
                if clauses.len() != num_clauses {
                    return Err(Error::InvalidCnf(format!(
                        "header declared {num_clauses} clauses but found {}",
                        clauses.len()
                    )));
                }
                Ok(Self { num_vars, clauses })
            }
            None => Err(Error::InvalidCnf("missing p cnf header".to_string())),
        }
    }

    /// Loads the DIMACS-like text form from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::read_dimacs(BufReader::new(file))
    }
}
