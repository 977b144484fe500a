//! Backtracking search directly over a gate DAG.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::Instant;

use tracing::debug;

use crate::gate::{Gate, GateKind};
use crate::representation::SymRepresentation;
use crate::{Error, Lit};

/// Per-variable usefulness statistics driving the static decision order.
#[derive(Clone, Copy, Debug)]
struct LitStats {
    lit: Lit,
    /// Truth value tried first for this variable. Currently always
    /// `false`; kept as a hook for smarter heuristics.
    preferred_assignment: bool,
    num_referenced_gates: usize,
}

impl LitStats {
    fn score(&self) -> usize {
        self.num_referenced_gates
    }
}

/// One decision-stack frame: a guessed literal plus every variable that
/// propagation forced after the guess.
#[derive(Debug, Default)]
struct Frame {
    lit_guess: Lit,
    implied: BTreeSet<Lit>,
    second_try: bool,
}

/// Marker for a contradiction discovered during propagation.
struct Conflict;

/// A chronological backtracking solver that works on the gate DAG
/// itself, without converting to CNF.
///
/// Each decision assigns one variable and runs unit propagation through
/// partially evaluated gates; conflicts flip the most recent first-try
/// decision. Observations are pinned below the search and are never
/// flipped: exhausting the space above them reports [`Error::Unsat`].
#[derive(Debug, Default)]
pub struct DagSolver {
    num_vars: usize,
    /// Per-variable assignment: -1 false, 0 unknown, +1 true. Slot 0 is
    /// unused.
    literals: Vec<i8>,
    stack: Vec<Frame>,
    literal_ordering: Vec<LitStats>,
    /// For each variable, the indices of the gates referencing it.
    lit2gates: Vec<BTreeSet<usize>>,
}

impl DagSolver {
    /// Creates a solver. All per-problem state is rebuilt by
    /// [`solve`](Self::solve).
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a total assignment satisfying every gate of `problem` and
    /// agreeing with `observed`, or reports [`Error::Unsat`].
    ///
    /// `observed` maps positive variable indices (typically obtained from
    /// [`SymRepresentation::observe_output`]) to truth values; zero or
    /// negative keys are a caller error, reported as
    /// [`Error::ObservationIndex`]. On success the returned map assigns
    /// every variable in `1..=num_vars`.
    pub fn solve(
        &mut self,
        problem: &SymRepresentation,
        observed: &HashMap<Lit, bool>,
    ) -> Result<HashMap<Lit, bool>, Error> {
        let gates = problem.gates();
        self.initialize(problem.num_vars(), gates);

        let mut observations: Vec<(Lit, bool)> = observed.iter().map(|(&l, &v)| (l, v)).collect();
        observations.sort_unstable();
        for &(lit, value) in &observations {
            if lit <= 0 || lit as usize > self.num_vars {
                return Err(Error::ObservationIndex(lit));
            }
            match self.literals[lit as usize] {
                0 => {
                    self.push_frame(lit, value, false);
                    if self.propagate(lit, gates).is_err() {
                        return Err(Error::Unsat);
                    }
                }
                assigned => {
                    if value != (assigned > 0) {
                        return Err(Error::Unsat);
                    }
                }
            }
        }
        // Backtracking below this depth would flip an observation.
        let base = self.stack.len();

        let mut num_decisions: u64 = 0;
        let mut num_conflicts: u64 = 0;
        while let Some((lit, value)) = self.pick_literal() {
            num_decisions += 1;
            self.push_frame(lit, value, false);
            let mut conflict = self.propagate(lit, gates).is_err();
            while conflict {
                num_conflicts += 1;
                while self.stack.last().map_or(false, |frame| frame.second_try) {
                    self.pop_frame();
                }
                if self.stack.len() <= base {
                    return Err(Error::Unsat);
                }
                let (flip_lit, tried) = self.pop_frame();
                self.push_frame(flip_lit, !tried, true);
                conflict = self.propagate(flip_lit, gates).is_err();
            }
        }
        debug!(num_decisions, num_conflicts, "search complete");

        let mut solution = HashMap::with_capacity(self.num_vars);
        for var in 1..=self.num_vars {
            if self.literals[var] != 0 {
                solution.insert(var as Lit, self.literals[var] > 0);
            }
        }
        Ok(solution)
    }

    fn initialize(&mut self, num_vars: usize, gates: &[Gate]) {
        let start = Instant::now();
        self.num_vars = num_vars;
        self.literals = vec![0; num_vars + 1];
        self.stack.clear();

        self.lit2gates = vec![BTreeSet::new(); num_vars + 1];
        for (index, gate) in gates.iter().enumerate() {
            self.lit2gates[gate.output as usize].insert(index);
            for &input in &gate.inputs {
                self.lit2gates[input.unsigned_abs() as usize].insert(index);
            }
        }

        self.literal_ordering = (1..=num_vars)
            .map(|var| LitStats {
                lit: var as Lit,
                preferred_assignment: false,
                num_referenced_gates: self.lit2gates[var].len(),
            })
            .collect();
        // Most-referenced first; ties break toward the lower variable.
        self.literal_ordering
            .sort_by(|a, b| b.score().cmp(&a.score()).then(a.lit.cmp(&b.lit)));

        debug!(
            num_vars,
            num_gates = gates.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "initialized solver"
        );
    }

    /// The first unassigned variable in the precomputed ordering,
    /// together with the value to try first.
    fn pick_literal(&self) -> Option<(Lit, bool)> {
        self.literal_ordering
            .iter()
            .find(|stats| self.literals[stats.lit as usize] == 0)
            .map(|stats| (stats.lit, stats.preferred_assignment))
    }

    fn push_frame(&mut self, lit: Lit, value: bool, second_try: bool) {
        assert_eq!(
            self.literals[lit as usize], 0,
            "only unassigned literals can be pushed"
        );
        self.literals[lit as usize] = if value { 1 } else { -1 };
        self.stack.push(Frame {
            lit_guess: lit,
            implied: BTreeSet::new(),
            second_try,
        });
    }

    /// Pops the top frame, clearing its guess and every implied variable.
    /// Returns the guessed literal and the value it had.
    fn pop_frame(&mut self) -> (Lit, bool) {
        let frame = self.stack.pop().expect("decision stack underflow");
        let value = self.literals[frame.lit_guess as usize] > 0;
        self.literals[frame.lit_guess as usize] = 0;
        for &var in &frame.implied {
            self.literals[var as usize] = 0;
        }
        (frame.lit_guess, value)
    }

    /// Unit-propagates from a newly assigned variable, recording every
    /// implied variable in the current stack frame. Returns the number of
    /// implied variables, or a conflict.
    fn propagate(&mut self, lit: Lit, gates: &[Gate]) -> Result<usize, Conflict> {
        let mut queue: VecDeque<usize> = self.lit2gates[lit as usize].iter().copied().collect();
        while let Some(gate_index) = queue.pop_front() {
            let solved = self.partial_solve(&gates[gate_index])?;
            for solved_lit in solved {
                let var = solved_lit.abs();
                if let Some(frame) = self.stack.last_mut() {
                    frame.implied.insert(var);
                }
                for &other in &self.lit2gates[var as usize] {
                    if other != gate_index {
                        queue.push_back(other);
                    }
                }
            }
        }
        Ok(self.stack.last().map_or(0, |frame| frame.implied.len()))
    }

    fn lit_value(&self, lit: Lit) -> bool {
        if lit < 0 {
            self.literals[(-lit) as usize] < 0
        } else {
            self.literals[lit as usize] > 0
        }
    }

    fn set_lit(&mut self, lit: Lit, value: bool) {
        let signed = if lit < 0 { !value } else { value };
        self.literals[lit.unsigned_abs() as usize] = if signed { 1 } else { -1 };
    }

    fn is_assigned(&self, lit: Lit) -> bool {
        self.literals[lit.unsigned_abs() as usize] != 0
    }

    /// Applies the strongest deduction the gate allows under the current
    /// partial assignment, returning the literals it newly assigned.
    fn partial_solve(&mut self, gate: &Gate) -> Result<Vec<Lit>, Conflict> {
        match gate.kind {
            GateKind::And => self.partial_solve_and(gate),
            GateKind::Or => self.partial_solve_or(gate),
            GateKind::Xor => self.partial_solve_xor(gate),
            GateKind::Xor3 => self.partial_solve_xor3(gate),
            GateKind::Maj3 => self.partial_solve_maj(gate),
        }
    }

    fn partial_solve_and(&mut self, gate: &Gate) -> Result<Vec<Lit>, Conflict> {
        let (x, y) = (gate.inputs[0], gate.inputs[1]);
        let out_known = self.is_assigned(gate.output);
        let x_known = self.is_assigned(x);
        let y_known = self.is_assigned(y);
        let out_val = self.lit_value(gate.output);
        let x_val = self.lit_value(x);
        let y_val = self.lit_value(y);

        if x_known && y_known && out_known {
            return if out_val == (x_val & y_val) {
                Ok(Vec::new())
            } else {
                Err(Conflict)
            };
        }
        if x_known && y_known {
            self.set_lit(gate.output, x_val & y_val);
            return Ok(vec![gate.output]);
        }
        if (x_known && !x_val) || (y_known && !y_val) {
            self.set_lit(gate.output, false);
            return Ok(vec![gate.output]);
        }
        if out_known {
            if out_val {
                // Any known input here is true, so both inputs are forced.
                let mut solved = Vec::new();
                if !x_known {
                    self.set_lit(x, true);
                    solved.push(x);
                }
                if !y_known {
                    self.set_lit(y, true);
                    solved.push(y);
                }
                return Ok(solved);
            }
            if x_known && x_val {
                self.set_lit(y, false);
                return Ok(vec![y]);
            }
            if y_known && y_val {
                self.set_lit(x, false);
                return Ok(vec![x]);
            }
        }
        Ok(Vec::new())
    }

    fn partial_solve_or(&mut self, gate: &Gate) -> Result<Vec<Lit>, Conflict> {
        let (x, y) = (gate.inputs[0], gate.inputs[1]);
        let out_known = self.is_assigned(gate.output);
        let x_known = self.is_assigned(x);
        let y_known = self.is_assigned(y);
        let out_val = self.lit_value(gate.output);
        let x_val = self.lit_value(x);
        let y_val = self.lit_value(y);

        if x_known && y_known && out_known {
            return if out_val == (x_val | y_val) {
                Ok(Vec::new())
            } else {
                Err(Conflict)
            };
        }
        if x_known && y_known {
            self.set_lit(gate.output, x_val | y_val);
            return Ok(vec![gate.output]);
        }
        if (x_known && x_val) || (y_known && y_val) {
            self.set_lit(gate.output, true);
            return Ok(vec![gate.output]);
        }
        if out_known {
            if !out_val {
                // Any known input here is false, so both inputs are forced.
                let mut solved = Vec::new();
                if !x_known {
                    self.set_lit(x, false);
                    solved.push(x);
                }
                if !y_known {
                    self.set_lit(y, false);
                    solved.push(y);
                }
                return Ok(solved);
            }
            if x_known && !x_val {
                self.set_lit(y, true);
                return Ok(vec![y]);
            }
            if y_known && !y_val {
                self.set_lit(x, true);
                return Ok(vec![x]);
            }
        }
        Ok(Vec::new())
    }

    fn partial_solve_xor(&mut self, gate: &Gate) -> Result<Vec<Lit>, Conflict> {
        let (x, y) = (gate.inputs[0], gate.inputs[1]);
        let out_known = self.is_assigned(gate.output);
        let x_known = self.is_assigned(x);
        let y_known = self.is_assigned(y);
        let out_val = self.lit_value(gate.output);
        let x_val = self.lit_value(x);
        let y_val = self.lit_value(y);

        if x_known && y_known && out_known {
            return if out_val == (x_val ^ y_val) {
                Ok(Vec::new())
            } else {
                Err(Conflict)
            };
        }
        if x_known && y_known {
            self.set_lit(gate.output, x_val ^ y_val);
            return Ok(vec![gate.output]);
        }
        if x_known && out_known {
            self.set_lit(y, x_val ^ out_val);
            return Ok(vec![y]);
        }
        if y_known && out_known {
            self.set_lit(x, y_val ^ out_val);
            return Ok(vec![x]);
        }
        Ok(Vec::new())
    }

    fn partial_solve_xor3(&mut self, gate: &Gate) -> Result<Vec<Lit>, Conflict> {
        // The gate is the parity constraint x ^ y ^ z ^ out = 0, so any
        // three known literals determine the fourth.
        let mut known = Vec::with_capacity(4);
        let mut unknown = Vec::with_capacity(4);
        for &lit in gate.inputs.iter().chain(std::iter::once(&gate.output)) {
            if self.is_assigned(lit) {
                known.push(self.lit_value(lit));
            } else {
                unknown.push(lit);
            }
        }
        match known.len() {
            4 => {
                if known[0] ^ known[1] ^ known[2] == known[3] {
                    Ok(Vec::new())
                } else {
                    Err(Conflict)
                }
            }
            3 => {
                let value = known[0] ^ known[1] ^ known[2];
                self.set_lit(unknown[0], value);
                Ok(vec![unknown[0]])
            }
            _ => Ok(Vec::new()),
        }
    }

    fn partial_solve_maj(&mut self, gate: &Gate) -> Result<Vec<Lit>, Conflict> {
        let mut known = Vec::with_capacity(3);
        let mut unknown = Vec::with_capacity(3);
        for &input in &gate.inputs {
            if self.is_assigned(input) {
                known.push(self.lit_value(input));
            } else {
                unknown.push(input);
            }
        }
        let out_known = self.is_assigned(gate.output);
        let out_val = self.lit_value(gate.output);

        match known.len() {
            3 => {
                let majority = known.iter().filter(|&&v| v).count() > 1;
                if out_known {
                    return if out_val == majority {
                        Ok(Vec::new())
                    } else {
                        Err(Conflict)
                    };
                }
                self.set_lit(gate.output, majority);
                Ok(vec![gate.output])
            }
            2 => {
                if known[0] == known[1] {
                    // Two agreeing inputs decide the vote.
                    if out_known {
                        return if out_val == known[0] {
                            Ok(Vec::new())
                        } else {
                            Err(Conflict)
                        };
                    }
                    self.set_lit(gate.output, known[0]);
                    Ok(vec![gate.output])
                } else if out_known {
                    // Split vote: the remaining input must equal the output.
                    self.set_lit(unknown[0], out_val);
                    Ok(vec![unknown[0]])
                } else {
                    Ok(Vec::new())
                }
            }
            1 if out_known && known[0] != out_val => {
                // The known input lost the vote, so both others must side
                // with the output.
                self.set_lit(unknown[0], out_val);
                self.set_lit(unknown[1], out_val);
                Ok(vec![unknown[0], unknown[1]])
            }
            _ => Ok(Vec::new()),
        }
    }
}
