//! The solver interface.
use crate::sat::cnf::Cnf;
use crate::sat::configs::SolverConfig;
use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::fmt;
use std::time::Duration;

/// A satisfying assignment, stored as the set of signed literals made true.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solutions {
    /// Signed literals, positive for true variables.
    pub assignments: FxHashSet<i32>,
}

impl Solutions {
    /// A model made true by `literals`.
    #[must_use]
    pub fn new(literals: &[i32]) -> Self {
        Self {
            assignments: literals.iter().copied().collect(),
        }
    }

    /// Whether `var` is true in the model.
    #[must_use]
    pub fn check(&self, var: Variable) -> bool {
        i32::try_from(var).is_ok_and(|v| self.assignments.contains(&v))
    }

    /// Number of literals in the model.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the model is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// The literals, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &i32> {
        self.assignments.iter()
    }
}

impl fmt::Display for Solutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sorted = self.assignments.iter().sorted_by_key(|l| l.unsigned_abs());
        write!(f, "{}", sorted.map(ToString::to_string).join(" "))
    }
}

/// Outcome of a solver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    /// Satisfiable, with a model.
    Sat(Solutions),
    /// Unsatisfiable.
    Unsat,
    /// The search budget ran out before an answer was found.
    Unknown,
}

impl SolveResult {
    /// Whether a model was found.
    #[must_use]
    pub const fn is_sat(&self) -> bool {
        matches!(self, Self::Sat(_))
    }

    /// Whether the formula was refuted.
    #[must_use]
    pub const fn is_unsat(&self) -> bool {
        matches!(self, Self::Unsat)
    }

    /// The model, if one was found.
    #[must_use]
    pub fn solutions(self) -> Option<Solutions> {
        match self {
            Self::Sat(s) => Some(s),
            Self::Unsat | Self::Unknown => None,
        }
    }
}

/// Search counters of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    /// Clauses found falsified.
    pub conflicts: usize,
    /// Branching decisions made.
    pub decisions: usize,
    /// Literals forced by unit propagation.
    pub propagations: usize,
    /// Wall time of the run.
    pub elapsed: Duration,
}

/// A complete SAT solver over literals of type `L`.
pub trait Solver<L: Literal> {
    /// Prepares a run over `cnf` within the budget of `config`.
    fn new(cnf: Cnf<L>, config: SolverConfig) -> Self;
    /// Searches until an answer is found or the budget runs out.
    fn solve(&mut self) -> SolveResult;
    /// The current assignment as a model.
    fn solutions(&self) -> Solutions;
    /// Counters of the last run.
    fn stats(&self) -> SolutionStats;
}
