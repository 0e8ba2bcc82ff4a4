#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The assignment trail.

use crate::sat::assignment::Assignment;
use crate::sat::literal::Literal;
use crate::sat::phase_saving::PhaseSelector;
use std::ops::Index;

/// Why a literal was made true.
#[derive(Debug, Clone, PartialEq, Eq, Default, Copy, Hash, PartialOrd, Ord)]
pub enum Reason {
    /// Fixed by a unit clause before search.
    #[default]
    Unit,
    /// Chosen by the variable selector.
    Decision,
    /// Forced by the given clause.
    Propagated(usize),
}

/// One assigned literal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step<L: Literal> {
    /// The literal made true.
    pub lit: L,
    /// Decision level it was assigned at.
    pub decision_level: usize,
    /// Why it was assigned.
    pub reason: Reason,
}

/// An open branch point. `flipped` marks the second (negated) branch, which has
/// no alternative left to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision<L: Literal> {
    /// Trail length before the decision.
    pub trail_len: usize,
    /// The decided literal.
    pub lit: L,
    /// Whether this is the second branch.
    pub flipped: bool,
}

/// Assignment history in assignment order, with the decision stack used for
/// chronological backtracking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail<L: Literal> {
    t: Vec<Step<L>>,
    /// Position of the next literal whose consequences have not been propagated.
    pub curr_idx: usize,
    /// Open decisions, innermost last.
    pub decisions: Vec<Decision<L>>,
}

impl<L: Literal> Index<usize> for Trail<L> {
    type Output = Step<L>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.t[index]
    }
}

impl<L: Literal> Trail<L> {
    /// An empty trail with room for `num_vars` steps.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            t: Vec::with_capacity(num_vars),
            curr_idx: 0,
            decisions: Vec::new(),
        }
    }

    /// Number of open decisions.
    #[must_use]
    pub fn decision_level(&self) -> usize {
        self.decisions.len()
    }

    /// Number of assigned literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// Whether nothing is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Steps in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = &Step<L>> {
        self.t.iter()
    }

    /// Records `lit`, which the caller has already made true in the assignment.
    pub fn push(&mut self, lit: L, reason: Reason) {
        self.t.push(Step {
            lit,
            decision_level: self.decision_level(),
            reason,
        });
    }

    /// Opens a new decision level and records `lit` as its first step.
    pub fn decide(&mut self, lit: L, flipped: bool) {
        self.decisions.push(Decision {
            trail_len: self.t.len(),
            lit,
            flipped,
        });
        self.push(lit, Reason::Decision);
    }

    /// Undoes every step from position `len` on, remembering the undone phases.
    pub fn backstep_to<P: PhaseSelector>(&mut self, a: &mut Assignment, phases: &mut P, len: usize) {
        for step in self.t.drain(len..) {
            phases.save(step.lit);
            a.unassign(step.lit.variable());
        }
        self.curr_idx = self.curr_idx.min(len);
    }

    /// Pops decisions until one with an untried branch is found, undoes its
    /// level and takes the other branch. Returns `false` when the search space
    /// is exhausted.
    pub fn backtrack<P: PhaseSelector>(&mut self, a: &mut Assignment, phases: &mut P) -> bool {
        while let Some(decision) = self.decisions.pop() {
            self.backstep_to(a, phases, decision.trail_len);

            if !decision.flipped {
                let lit = decision.lit.negated();
                a.assign(lit);
                self.decide(lit, true);
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;
    use crate::sat::phase_saving::SavedPhases;

    #[test]
    fn test_backtrack_flips_last_open_decision() {
        let mut a = Assignment::new(4);
        let mut phases = SavedPhases::new(4);
        let mut trail: Trail<PackedLiteral> = Trail::new(4);

        let unit = PackedLiteral::from(1);
        a.assign(unit);
        trail.push(unit, Reason::Unit);

        let d1 = PackedLiteral::from(-2);
        a.assign(d1);
        trail.decide(d1, false);

        let p = PackedLiteral::from(3);
        a.assign(p);
        trail.push(p, Reason::Propagated(0));
        assert_eq!(trail[2].decision_level, 1);

        assert!(trail.backtrack(&mut a, &mut phases));
        assert_eq!(trail.len(), 2);
        assert_eq!(a.var_value(2), Some(true));
        assert_eq!(a.var_value(3), None);
        assert_eq!(a.var_value(1), Some(true));

        assert!(!trail.backtrack(&mut a, &mut phases));
        assert_eq!(trail.len(), 1);
        assert_eq!(a.var_value(2), None);
    }
}
