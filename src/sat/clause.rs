#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Disjunctive clauses.

use crate::sat::literal::{Literal, PackedLiteral};
use core::ops::{Index, IndexMut};
use itertools::Itertools;
use smallvec::SmallVec;

/// A disjunction of literals.
///
/// Literals are deduplicated on construction. Clauses produced by the Tseytin
/// encoder are short, so storage is inline up to eight literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Clause<L: Literal = PackedLiteral> {
    /// The literals, without duplicates.
    pub literals: SmallVec<[L; 8]>,
}

impl<L: Literal> Clause<L> {
    /// A clause over `literals`, dropping repeats.
    #[must_use]
    pub fn new(literals: impl IntoIterator<Item = L>) -> Self {
        Self {
            literals: literals.into_iter().unique().collect(),
        }
    }

    /// A clause from DIMACS-style signed literals.
    #[must_use]
    pub fn from_i32s(literals: &[i32]) -> Self {
        Self::new(literals.iter().map(|&l| L::from_i32(l)))
    }

    /// Number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// The literals in order.
    pub fn iter(&self) -> impl Iterator<Item = &L> {
        self.literals.iter()
    }

    /// Swaps the literals at `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.literals.swap(i, j);
    }

    /// Whether exactly one literal remains.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// Whether the clause is empty, and so unsatisfiable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// A clause holding both `x` and `!x` is satisfied by every assignment.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .tuple_combinations()
            .any(|(a, b)| a.variable() == b.variable() && a.polarity() != b.polarity())
    }
}

impl<L: Literal> Index<usize> for Clause<L> {
    type Output = L;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl<L: Literal> IndexMut<usize> for Clause<L> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.literals[index]
    }
}

impl<L: Literal> From<Vec<i32>> for Clause<L> {
    fn from(literals: Vec<i32>) -> Self {
        Self::from_i32s(&literals)
    }
}

impl<L: Literal> From<&[i32]> for Clause<L> {
    fn from(literals: &[i32]) -> Self {
        Self::from_i32s(literals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_dedups() {
        let clause: Clause = Clause::from(vec![1, 2, 2, 3]);
        assert_eq!(clause.len(), 3);
    }

    #[test]
    fn test_iter() {
        let clause: Clause = Clause::from(vec![1, -2, 3]);
        let mut iter = clause.iter();
        assert_eq!(iter.next(), Some(&PackedLiteral::from(1)));
        assert_eq!(iter.next(), Some(&PackedLiteral::from(-2)));
        assert_eq!(iter.next(), Some(&PackedLiteral::from(3)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_swap() {
        let mut clause: Clause = Clause::from(vec![1, 2, 3]);
        clause.swap(0, 2);
        assert_eq!(clause[0], PackedLiteral::from(3));
        assert_eq!(clause[1], PackedLiteral::from(2));
        assert_eq!(clause[2], PackedLiteral::from(1));
    }

    #[test]
    fn test_tautology() {
        let clause: Clause = Clause::from(vec![1, -2, 2]);
        assert!(clause.is_tautology());
        let clause: Clause = Clause::from(vec![1, -2, 3]);
        assert!(!clause.is_tautology());
    }
}
