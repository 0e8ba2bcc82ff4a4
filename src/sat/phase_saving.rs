//! Phase selection.
use crate::sat::literal::{Literal, Variable};
use bit_vec::BitVec;

/// Chooses the polarity of a decision variable.
pub trait PhaseSelector {
    /// A selector for `n` variable slots.
    fn new(n: usize) -> Self;
    /// Records the polarity `lit` was assigned with.
    fn save(&mut self, lit: impl Literal);
    /// Forgets every saved polarity.
    fn reset(&mut self);
    /// Polarity to try for `var`.
    fn get_next(&self, var: Variable) -> bool;
}

/// Remembers the last polarity of every variable and retries it. Variables
/// start out false, which for configuration problems means "extension absent".
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SavedPhases(BitVec);

impl PhaseSelector for SavedPhases {
    fn new(n: usize) -> Self {
        Self(BitVec::from_elem(n, false))
    }

    fn save(&mut self, lit: impl Literal) {
        let var = lit.variable() as usize;
        if var < self.0.len() {
            self.0.set(var, lit.polarity());
        }
    }

    fn reset(&mut self) {
        self.0.clear();
    }

    fn get_next(&self, var: Variable) -> bool {
        self.0.get(var as usize).unwrap_or(false)
    }
}

/// Always tries `false` first.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NegativePhases;

impl PhaseSelector for NegativePhases {
    fn new(_: usize) -> Self {
        Self
    }

    fn save(&mut self, _: impl Literal) {}

    fn reset(&mut self) {}

    fn get_next(&self, _: Variable) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;

    #[test]
    fn test_saved_phases() {
        let mut phases = SavedPhases::new(4);
        assert!(!phases.get_next(2));
        phases.save(PackedLiteral::from(2));
        assert!(phases.get_next(2));
        phases.reset();
        assert!(!phases.get_next(2));
    }
}
