#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Two-watched-literal unit propagation.
//!
//! Every clause with at least two literals watches its first two positions.
//! A clause only needs visiting when one of its watched literals becomes
//! false: it then either finds a replacement watch, becomes unit (its other
//! watch is forced), or is in conflict.

use crate::sat::assignment::Assignment;
use crate::sat::cnf::Cnf;
use crate::sat::literal::Literal;
use crate::sat::trail::{Reason, Trail};
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// Clause indices keyed by [`Literal::index`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchedLiterals(Vec<SmallVec<[usize; 6]>>);

impl WatchedLiterals {
    /// Watches the first two literals of every clause in `cnf`.
    #[must_use]
    pub fn new<L: Literal>(cnf: &Cnf<L>) -> Self {
        let mut watches = Self(vec![SmallVec::new(); cnf.num_vars * 2]);

        for (i, clause) in cnf.iter().enumerate().filter(|(_, c)| c.len() >= 2) {
            watches[clause[0]].push(i);
            watches[clause[1]].push(i);
        }

        watches
    }

    /// Propagates every trail literal from `trail.curr_idx` on. Returns the
    /// index of a falsified clause if one is found.
    pub fn propagate<L: Literal>(
        &mut self,
        cnf: &mut Cnf<L>,
        trail: &mut Trail<L>,
        assignment: &mut Assignment,
    ) -> Option<usize> {
        while trail.curr_idx < trail.len() {
            let false_lit = trail[trail.curr_idx].lit.negated();
            trail.curr_idx += 1;

            let watchers = std::mem::take(&mut self[false_lit]);
            let mut kept = SmallVec::<[usize; 6]>::with_capacity(watchers.len());
            let mut conflict = None;

            for ci in watchers {
                if conflict.is_some() {
                    kept.push(ci);
                    continue;
                }

                let clause = &mut cnf[ci];
                if clause[0] == false_lit {
                    clause.swap(0, 1);
                }

                let other = clause[0];
                if assignment.literal_value(other) == Some(true) {
                    kept.push(ci);
                    continue;
                }

                let replacement = (2..clause.len())
                    .find(|&k| assignment.literal_value(clause[k]) != Some(false));

                if let Some(k) = replacement {
                    clause.swap(1, k);
                    let new_watch = clause[1];
                    self[new_watch].push(ci);
                    continue;
                }

                kept.push(ci);
                match assignment.literal_value(other) {
                    Some(false) => conflict = Some(ci),
                    _ => {
                        assignment.assign(other);
                        trail.push(other, Reason::Propagated(ci));
                    }
                }
            }

            self[false_lit] = kept;

            if conflict.is_some() {
                return conflict;
            }
        }

        None
    }
}

impl<L: Literal> Index<L> for WatchedLiterals {
    type Output = SmallVec<[usize; 6]>;

    fn index(&self, index: L) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl<L: Literal> IndexMut<L> for WatchedLiterals {
    fn index_mut(&mut self, index: L) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;

    #[test]
    fn test_unit_chain() {
        let mut cnf: Cnf = Cnf::new(vec![vec![-1, 2], vec![-2, 3], vec![-3, -1, 4]]);
        let mut watches = WatchedLiterals::new(&cnf);
        let mut trail = Trail::new(cnf.num_vars);
        let mut a = Assignment::new(cnf.num_vars);

        let lit = PackedLiteral::from(1);
        a.assign(lit);
        trail.decide(lit, false);

        assert_eq!(watches.propagate(&mut cnf, &mut trail, &mut a), None);
        assert_eq!(a.var_value(2), Some(true));
        assert_eq!(a.var_value(3), Some(true));
        assert_eq!(a.var_value(4), Some(true));
        assert_eq!(trail.len(), 4);
    }

    #[test]
    fn test_conflict_detected() {
        let mut cnf: Cnf = Cnf::new(vec![vec![-1, 2], vec![-1, -2]]);
        let mut watches = WatchedLiterals::new(&cnf);
        let mut trail = Trail::new(cnf.num_vars);
        let mut a = Assignment::new(cnf.num_vars);

        let lit = PackedLiteral::from(1);
        a.assign(lit);
        trail.decide(lit, false);

        assert!(watches.propagate(&mut cnf, &mut trail, &mut a).is_some());
    }
}
