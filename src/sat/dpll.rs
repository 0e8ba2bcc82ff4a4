//! Defines the DPLL (Davis-Putnam-Logemann-Loveland) SAT solver.
//!
//! The solver works on a [`Cnf`] produced by the Tseytin encoder and decides
//! whether it is satisfiable, returning a model when it is. The search is
//! iterative rather than recursive:
//! 1.  **Unit Propagation:** watched-literal propagation forces every literal
//!     implied by the current assignment (see [`WatchedLiterals`]).
//! 2.  **Decision:** if nothing is forced and no clause is falsified, the
//!     variable selector picks an unassigned variable and the phase selector
//!     picks its polarity.
//! 3.  **Backtracking:** on conflict, the most recent decision whose other
//!     branch has not been tried yet is flipped. When no such decision is
//!     left, the formula is unsatisfiable.
//!
//! Every run is bounded by a [`SolverConfig`]; running out of budget yields
//! [`SolveResult::Unknown`] instead of an answer.

use crate::sat::assignment::Assignment;
use crate::sat::cnf::Cnf;
use crate::sat::configs::SolverConfig;
use crate::sat::literal::{Literal, PackedLiteral, Variable};
use crate::sat::phase_saving::{PhaseSelector, SavedPhases};
use crate::sat::propagation::WatchedLiterals;
use crate::sat::solver::{SolutionStats, SolveResult, Solutions, Solver};
use crate::sat::trail::{Reason, Trail};
use crate::sat::variable_selection::{DEFAULT_DECAY, VariableSelection, Vsids};
use std::time::Instant;

/// How many decisions pass between two wall-clock checks.
const CLOCK_CHECK_INTERVAL: usize = 256;

/// A DPLL SAT solver.
///
/// Generic over the literal encoding, the variable selection heuristic and the
/// phase selection heuristic. The defaults suit the small, structured
/// formulas produced from condition trees.
#[derive(Debug, Clone)]
pub struct Dpll<L: Literal = PackedLiteral, V: VariableSelection = Vsids, P: PhaseSelector = SavedPhases> {
    /// The formula being solved. Clause literals are reordered by propagation.
    pub cnf: Cnf<L>,
    /// The current (partial) assignment.
    pub assignment: Assignment,
    /// Assignment history and open decisions.
    pub trail: Trail<L>,
    /// Watch lists for unit propagation.
    pub watches: WatchedLiterals,
    /// Picks the next decision variable.
    pub selector: V,
    /// Picks the polarity of a decision.
    pub phases: P,
    /// Search budget.
    pub config: SolverConfig,
    /// Set when a level-0 contradiction (an empty clause or two opposing unit
    /// clauses) is found while loading the formula.
    inconsistent: bool,
    stats: SolutionStats,
}

impl<L: Literal, V: VariableSelection, P: PhaseSelector> Solver<L> for Dpll<L, V, P> {
    /// Creates a solver for `cnf`.
    ///
    /// Tautologies are dropped and unit clauses are assigned immediately at
    /// decision level 0.
    fn new(mut cnf: Cnf<L>, config: SolverConfig) -> Self {
        cnf.clauses.retain(|c| !c.is_tautology());

        let vars: Vec<Variable> = cnf
            .iter()
            .flat_map(|c| c.iter().map(|l| l.variable()))
            .collect();

        let mut assignment = Assignment::new(cnf.num_vars);
        let mut trail = Trail::new(cnf.num_vars);
        let mut inconsistent = cnf.iter().any(|c| c.is_empty());

        for clause in cnf.iter().filter(|c| c.is_unit()) {
            let lit = clause[0];
            match assignment.literal_value(lit) {
                Some(false) => inconsistent = true,
                Some(true) => {}
                None => {
                    assignment.assign(lit);
                    trail.push(lit, Reason::Unit);
                }
            }
        }

        Self {
            watches: WatchedLiterals::new(&cnf),
            selector: V::new(cnf.num_vars, &vars),
            phases: P::new(cnf.num_vars),
            assignment,
            trail,
            cnf,
            config,
            inconsistent,
            stats: SolutionStats::default(),
        }
    }

    /// Runs the search to completion or until the budget is exhausted.
    ///
    /// # Returns
    ///
    /// * `SolveResult::Sat(model)` if the formula is satisfiable.
    /// * `SolveResult::Unsat` if it is not.
    /// * `SolveResult::Unknown` if the time or conflict limit was hit first.
    fn solve(&mut self) -> SolveResult {
        let start = Instant::now();
        let result = self.search(start);
        self.stats.elapsed = start.elapsed();
        result
    }

    fn solutions(&self) -> Solutions {
        self.assignment.get_solutions()
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }
}

impl<L: Literal, V: VariableSelection, P: PhaseSelector> Dpll<L, V, P> {
    fn search(&mut self, start: Instant) -> SolveResult {
        if self.inconsistent {
            return SolveResult::Unsat;
        }

        loop {
            let before = self.trail.len();
            let conflict = self
                .watches
                .propagate(&mut self.cnf, &mut self.trail, &mut self.assignment);
            self.stats.propagations += self.trail.len().saturating_sub(before);

            if let Some(c_ref) = conflict {
                self.stats.conflicts += 1;
                self.selector
                    .bumps(self.cnf[c_ref].iter().map(|l| l.variable()));
                self.selector.decay(DEFAULT_DECAY);

                if self.config.exhausted(self.stats.conflicts, start.elapsed()) {
                    return SolveResult::Unknown;
                }

                if !self.trail.backtrack(&mut self.assignment, &mut self.phases) {
                    return SolveResult::Unsat;
                }
                continue;
            }

            let Some(var) = self.selector.pick(&self.assignment) else {
                return SolveResult::Sat(self.solutions());
            };

            self.stats.decisions += 1;
            if self.stats.decisions % CLOCK_CHECK_INTERVAL == 0
                && self.config.exhausted(self.stats.conflicts, start.elapsed())
            {
                return SolveResult::Unknown;
            }

            let lit = L::new(var, self.phases.get_next(var));
            self.assignment.assign(lit);
            self.trail.decide(lit, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::phase_saving::NegativePhases;
    use crate::sat::variable_selection::FixedOrder;

    fn solve(clauses: Vec<Vec<i32>>) -> SolveResult {
        let cnf: Cnf = Cnf::new(clauses);
        let mut solver: Dpll = Dpll::new(cnf, SolverConfig::unbounded());
        solver.solve()
    }

    #[test]
    fn test_solve_units() {
        let result = solve(vec![vec![1], vec![-2], vec![3]]);
        let model = result.solutions().unwrap();
        assert!(model.check(1));
        assert!(!model.check(2));
        assert!(model.check(3));
    }

    #[test]
    fn test_solve_unsat_units() {
        assert_eq!(solve(vec![vec![1], vec![-1]]), SolveResult::Unsat);
    }

    #[test]
    fn test_empty_formula_is_sat() {
        assert!(solve(vec![]).is_sat());
    }

    #[test]
    fn test_empty_clause_is_unsat() {
        assert!(solve(vec![vec![1, 2], vec![]]).is_unsat());
    }

    #[test]
    fn test_model_verifies() {
        let clauses = vec![
            vec![1, 2, 3],
            vec![-1, -2],
            vec![-2, -3],
            vec![-1, -3],
            vec![2, 4],
            vec![-4, 1],
        ];
        let cnf: Cnf = Cnf::new(clauses.clone());
        let model = solve(clauses).solutions().unwrap();
        assert!(cnf.verify(&model));
    }

    #[test]
    fn test_pigeonhole_is_unsat() {
        // three pigeons, two holes: p(i, h) = 2 * i + h + 1
        let p = |i: i32, h: i32| 2 * i + h + 1;
        let mut clauses = Vec::new();
        for i in 0..3 {
            clauses.push(vec![p(i, 0), p(i, 1)]);
        }
        for h in 0..2 {
            for i in 0..3 {
                for j in (i + 1)..3 {
                    clauses.push(vec![-p(i, h), -p(j, h)]);
                }
            }
        }
        assert!(solve(clauses).is_unsat());
    }

    #[test]
    fn test_alternative_heuristics() {
        let cnf: Cnf = Cnf::new(vec![vec![1, 2], vec![-1, 2], vec![-2, 3]]);
        let mut solver: Dpll<PackedLiteral, FixedOrder, NegativePhases> =
            Dpll::new(cnf.clone(), SolverConfig::unbounded());
        let model = solver.solve().solutions().unwrap();
        assert!(cnf.verify(&model));
        assert!(solver.stats().decisions >= 1);
    }

    #[test]
    fn test_conflict_limit_gives_unknown() {
        let p = |i: i32, h: i32| 4 * i + h + 1;
        let mut clauses = Vec::new();
        for i in 0..5 {
            clauses.push((0..4).map(|h| p(i, h)).collect());
        }
        for h in 0..4 {
            for i in 0..5 {
                for j in (i + 1)..5 {
                    clauses.push(vec![-p(i, h), -p(j, h)]);
                }
            }
        }
        let cnf: Cnf = Cnf::new(clauses);
        let mut solver: Dpll = Dpll::new(cnf, SolverConfig::unbounded().with_conflict_limit(Some(1)));
        assert_eq!(solver.solve(), SolveResult::Unknown);
    }
}
