#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conjunctive normal form container.

use crate::sat::clause::Clause;
use crate::sat::literal::{Literal, PackedLiteral, Variable};
use crate::sat::solver::Solutions;
use core::ops::{Index, IndexMut};
use std::fmt;

/// A conjunction of clauses over variables `1..num_vars`.
///
/// `num_vars` is one more than the highest variable so that it can be used
/// directly as the length of per-variable tables (index `0` is unused).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Cnf<L: Literal = PackedLiteral> {
    /// The clauses, all of which must hold.
    pub clauses: Vec<Clause<L>>,
    /// One more than the highest variable.
    pub num_vars: usize,
}

impl<L: Literal> Cnf<L> {
    /// Builds a CNF from DIMACS-style signed literals, sizing the variable
    /// table from the largest variable seen.
    #[must_use]
    pub fn new(clauses: impl IntoIterator<Item = Vec<i32>>) -> Self {
        let clauses: Vec<Clause<L>> = clauses.into_iter().map(Clause::from).collect();
        let max_var = clauses
            .iter()
            .flat_map(Clause::iter)
            .map(|l| l.variable())
            .max()
            .unwrap_or(0);

        Self {
            clauses,
            num_vars: max_var as usize + 1,
        }
    }

    /// Like [`Cnf::new`] but with an explicit variable count, so variables that
    /// occur in no clause still get a slot.
    #[must_use]
    pub fn with_vars(clauses: impl IntoIterator<Item = Vec<i32>>, highest: Variable) -> Self {
        let mut cnf = Self::new(clauses);
        cnf.num_vars = cnf.num_vars.max(highest as usize + 1);
        cnf
    }

    /// Number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether there are no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The clauses in order.
    pub fn iter(&self) -> impl Iterator<Item = &Clause<L>> {
        self.clauses.iter()
    }

    /// Appends `clause`, growing `num_vars` to cover it.
    pub fn add_clause(&mut self, clause: Clause<L>) {
        let highest = clause.iter().map(|l| l.variable() as usize).max().unwrap_or(0);
        self.num_vars = self.num_vars.max(highest + 1);
        self.clauses.push(clause);
    }

    /// Checks a model against every clause.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|lit| solutions.check(lit.variable()) == lit.polarity())
        })
    }
}

impl<L: Literal> Index<usize> for Cnf<L> {
    type Output = Clause<L>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

impl<L: Literal> IndexMut<usize> for Cnf<L> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.clauses[index]
    }
}

impl<L: Literal> From<Vec<Vec<i32>>> for Cnf<L> {
    fn from(clauses: Vec<Vec<i32>>) -> Self {
        Self::new(clauses)
    }
}

/// DIMACS rendering: a `p cnf` header followed by one zero-terminated line per clause.
impl<L: Literal> fmt::Display for Cnf<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "p cnf {} {}",
            self.num_vars.saturating_sub(1),
            self.clauses.len()
        )?;
        for clause in &self.clauses {
            for lit in clause.iter() {
                write!(f, "{} ", lit.to_i32())?;
            }
            writeln!(f, "0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_vars() {
        let cnf: Cnf = Cnf::new(vec![vec![1, -2], vec![2, 3]]);
        assert_eq!(cnf.num_vars, 4);
        assert_eq!(cnf.len(), 2);

        let cnf: Cnf = Cnf::with_vars(vec![vec![1]], 5);
        assert_eq!(cnf.num_vars, 6);
    }

    #[test]
    fn test_dimacs_display() {
        let cnf: Cnf = Cnf::new(vec![vec![1, -2], vec![2]]);
        assert_eq!(cnf.to_string(), "p cnf 2 2\n1 -2 0\n2 0\n");
    }

    #[test]
    fn test_verify() {
        let cnf: Cnf = Cnf::new(vec![vec![1, -2], vec![2]]);
        assert!(cnf.verify(&Solutions::new(&[1, 2])));
        assert!(!cnf.verify(&Solutions::new(&[-1, 2])));
    }
}
