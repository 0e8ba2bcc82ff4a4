#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Variable selection heuristics.

use crate::sat::assignment::Assignment;
use crate::sat::literal::Variable;
use ordered_float::OrderedFloat;
use std::ops::{Index, IndexMut};

/// Chooses the next decision variable.
pub trait VariableSelection {
    /// A selector over `num_vars` slots; `vars` lists every literal occurrence.
    fn new(num_vars: usize, vars: &[Variable]) -> Self;
    /// The next unassigned variable, or `None` when all are assigned.
    fn pick(&self, assignment: &Assignment) -> Option<Variable>;

    /// Raises the priority of `vars`.
    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T);
    /// Scales every priority by `decay`.
    fn decay(&mut self, decay: f64);
}

/// Activity scores in the spirit of VSIDS: every occurrence counts once up
/// front, variables in conflicting clauses get bumped, and all scores decay.
#[derive(Debug, Clone, PartialEq, Default, PartialOrd)]
pub struct Vsids(Vec<f64>);

impl Index<Variable> for Vsids {
    type Output = f64;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl IndexMut<Variable> for Vsids {
    fn index_mut(&mut self, index: Variable) -> &mut Self::Output {
        &mut self.0[index as usize]
    }
}

/// Decay applied after every conflict.
pub const DEFAULT_DECAY: f64 = 0.95;

impl Vsids {
    /// Adds one to the activity of `i`.
    pub fn bump(&mut self, i: Variable) {
        if let Some(score) = self.0.get_mut(i as usize) {
            *score += 1.0;
        }
    }

    /// Activity of `i`.
    #[must_use]
    pub fn get(&self, i: Variable) -> f64 {
        self[i]
    }
}

impl VariableSelection for Vsids {
    fn new(num_vars: usize, vars: &[Variable]) -> Self {
        let mut vsids = Self(vec![0.0; num_vars]);
        vsids.bumps(vars.iter().copied());
        vsids
    }

    /// Highest activity first; ties go to the lowest variable.
    fn pick(&self, assignment: &Assignment) -> Option<Variable> {
        assignment
            .unassigned()
            .max_by_key(|&v| (OrderedFloat(self.0.get(v as usize).copied().unwrap_or(0.0)), std::cmp::Reverse(v)))
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T) {
        for i in vars {
            self.bump(i);
        }
    }

    fn decay(&mut self, decay: f64) {
        for v in &mut self.0 {
            *v *= decay;
        }
    }
}

/// Picks the lowest unassigned variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedOrder;

impl VariableSelection for FixedOrder {
    fn new(_: usize, _: &[Variable]) -> Self {
        Self
    }

    fn pick(&self, assignment: &Assignment) -> Option<Variable> {
        assignment.unassigned().next()
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, _: T) {}

    fn decay(&mut self, _: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;

    #[test]
    fn test_vsids_prefers_active_variables() {
        let mut vsids = Vsids::new(4, &[1, 2, 3, 3]);
        let mut a = Assignment::new(4);
        assert_eq!(vsids.pick(&a), Some(3));

        vsids.bumps([1, 1, 1]);
        assert_eq!(vsids.pick(&a), Some(1));

        a.assign(PackedLiteral::from(1));
        assert_eq!(vsids.pick(&a), Some(3));

        vsids.decay(0.5);
        assert!((vsids.get(3) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fixed_order() {
        let mut a = Assignment::new(3);
        a.assign(PackedLiteral::from(1));
        assert_eq!(FixedOrder.pick(&a), Some(2));
    }
}
