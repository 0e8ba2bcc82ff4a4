#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Variable assignments.
use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::Solutions;
use core::ops::{Index, IndexMut};

/// State of one variable.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    /// Not yet given a value.
    #[default]
    Unassigned,
    /// Fixed to the given value.
    Assigned(bool),
}

impl VarState {
    /// Whether a value has been given.
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    /// Whether no value has been given.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    /// The value, if assigned.
    #[must_use]
    pub const fn value(self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(b),
            Self::Unassigned => None,
        }
    }
}

/// Partial assignment of truth values, indexed by variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(Vec<VarState>);

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl IndexMut<Variable> for Assignment {
    fn index_mut(&mut self, index: Variable) -> &mut Self::Output {
        &mut self.0[index as usize]
    }
}

impl Assignment {
    /// `num_vars` slots; slot `0` stays unassigned forever.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars])
    }

    /// Number of slots, including the unused slot `0`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Makes `lit` true.
    pub fn assign(&mut self, lit: impl Literal) {
        self[lit.variable()] = VarState::Assigned(lit.polarity());
    }

    /// Forgets the value of `var`.
    pub fn unassign(&mut self, var: Variable) {
        self[var] = VarState::Unassigned;
    }

    /// The value of `var`, if assigned.
    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        self.0.get(var as usize).copied().and_then(VarState::value)
    }

    /// Whether `lit` is true, if its variable is assigned.
    #[must_use]
    pub fn literal_value(&self, lit: impl Literal) -> Option<bool> {
        self.var_value(lit.variable()).map(|b| b == lit.polarity())
    }

    /// Whether `var` has a value.
    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self.var_value(var).is_some()
    }

    /// Unassigned variables in ascending order, skipping the unused slot `0`.
    pub fn unassigned(&self) -> impl Iterator<Item = Variable> + '_ {
        self.0
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, s)| s.is_unassigned())
            .filter_map(|(i, _)| Variable::try_from(i).ok())
    }

    /// The model as signed literals. Unassigned variables are reported false.
    #[must_use]
    pub fn get_solutions(&self) -> Solutions {
        let literals: Vec<i32> = self
            .0
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, s)| {
                let var = i32::try_from(i).ok()?;
                Some(if s.value() == Some(true) { var } else { -var })
            })
            .collect();
        Solutions::new(&literals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;

    #[test]
    fn test_assign_and_values() {
        let mut a = Assignment::new(4);
        a.assign(PackedLiteral::from(-2));
        assert_eq!(a.var_value(2), Some(false));
        assert_eq!(a.literal_value(PackedLiteral::from(2)), Some(false));
        assert_eq!(a.literal_value(PackedLiteral::from(-2)), Some(true));
        assert_eq!(a.literal_value(PackedLiteral::from(3)), None);
        assert_eq!(a.unassigned().collect::<Vec<_>>(), vec![1, 3]);

        a.unassign(2);
        assert!(!a.is_assigned(2));
    }

    #[test]
    fn test_solutions() {
        let mut a = Assignment::new(3);
        a.assign(PackedLiteral::from(1));
        let solutions = a.get_solutions();
        assert!(solutions.check(1));
        assert!(!solutions.check(2));
    }
}
