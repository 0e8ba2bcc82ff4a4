#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Tseytin encoding of logic trees and the satisfiability queries built on it.
//!
//! Every distinct [`Term`] gets one solver variable and every internal node
//! one auxiliary variable defined by the clauses of its operator's truth
//! table. Asserting the root variable then makes the CNF equisatisfiable
//! with the tree.
//!
//! On top of the tree itself the encoder adds the facts that hold in every
//! configuration: an extension is implemented at one version at most, and
//! predicates over one parameter agree with each other when one of them
//! pins the value.

use crate::logic::node::LogicNode;
use crate::logic::term::{ParamPredicate, Term};
use crate::sat::cnf::Cnf;
use crate::sat::configs::SolverConfig;
use crate::sat::dpll::Dpll;
use crate::sat::literal::Variable;
use crate::sat::solver::{SolveResult, Solutions, Solver};
use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A query the solver could not decide.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The search budget ran out.
    #[error("satisfiability is indeterminate: solver gave up after {conflicts} conflicts in {elapsed:?}")]
    Indeterminate {
        /// Conflicts seen before giving up.
        conflicts: usize,
        /// Time spent searching.
        elapsed: Duration,
    },
}

/// Builds a CNF incrementally from one or more trees.
#[derive(Debug, Default)]
pub struct Encoder {
    vars: FxHashMap<Arc<Term>, Variable>,
    terms: Vec<Arc<Term>>,
    next_var: Variable,
    true_var: Option<Variable>,
    clauses: Vec<Vec<i32>>,
}

#[allow(clippy::cast_possible_wrap)]
const fn lit(var: Variable) -> i32 {
    var as i32
}

impl Encoder {
    /// An encoder with no variables yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn fresh(&mut self) -> Variable {
        self.next_var += 1;
        self.next_var
    }

    /// The solver variable of `term`, allocating one on first use.
    pub fn term_var(&mut self, term: &Arc<Term>) -> Variable {
        if let Some(&var) = self.vars.get(term) {
            return var;
        }
        let var = self.fresh();
        self.vars.insert(Arc::clone(term), var);
        self.terms.push(Arc::clone(term));
        var
    }

    fn true_lit(&mut self) -> i32 {
        if let Some(var) = self.true_var {
            return lit(var);
        }
        let var = self.fresh();
        self.clauses.push(vec![lit(var)]);
        self.true_var = Some(var);
        lit(var)
    }

    /// `n <-> (l1 & ... & lk)`
    fn define_and(&mut self, lits: Vec<i32>) -> i32 {
        if let [single] = lits.as_slice() {
            return *single;
        }
        let n = lit(self.fresh());
        for &l in &lits {
            self.clauses.push(vec![-n, l]);
        }
        let mut long = vec![n];
        long.extend(lits.iter().map(|l| -l));
        self.clauses.push(long);
        n
    }

    /// `n <-> (l1 | ... | lk)`
    fn define_or(&mut self, lits: Vec<i32>) -> i32 {
        if let [single] = lits.as_slice() {
            return *single;
        }
        let n = lit(self.fresh());
        for &l in &lits {
            self.clauses.push(vec![n, -l]);
        }
        let mut long = vec![-n];
        long.extend(lits);
        self.clauses.push(long);
        n
    }

    /// Encodes `node` and returns the literal equivalent to it.
    pub fn encode(&mut self, node: &LogicNode) -> i32 {
        match node {
            LogicNode::True => self.true_lit(),
            LogicNode::False => -self.true_lit(),
            LogicNode::Term(t) => lit(self.term_var(t)),
            LogicNode::Not(child) => -self.encode(child),
            LogicNode::And(cs) => {
                let lits = cs.iter().map(|c| self.encode(c)).collect();
                self.define_and(lits)
            }
            LogicNode::Or(cs) => {
                let lits = cs.iter().map(|c| self.encode(c)).collect();
                self.define_or(lits)
            }
            LogicNode::NoneOf(cs) => {
                let lits = cs.iter().map(|c| -self.encode(c)).collect();
                self.define_and(lits)
            }
            LogicNode::If(cond, then) => {
                let c = self.encode(cond);
                let t = self.encode(then);
                self.define_or(vec![-c, t])
            }
            LogicNode::Xor(cs) => {
                let lits: Vec<i32> = cs.iter().map(|c| self.encode(c)).collect();
                let mut parts = vec![self.define_or(lits.clone())];
                for (a, b) in lits.iter().tuple_combinations() {
                    let both = self.define_and(vec![*a, *b]);
                    parts.push(-both);
                }
                self.define_and(parts)
            }
        }
    }

    /// Clauses every configuration satisfies, over the terms seen so far.
    fn domain_clauses(&self) -> Vec<Vec<i32>> {
        let mut out = Vec::new();

        for (a, b) in self.terms.iter().tuple_combinations() {
            let (va, vb) = (lit(self.vars[a]), lit(self.vars[b]));
            match (a.as_ref(), b.as_ref()) {
                (Term::Extension(x), Term::Extension(y)) if x.name == y.name => {
                    out.push(vec![-va, -vb]);
                }
                (Term::Parameter(x), Term::Parameter(y)) if x.name == y.name => {
                    Self::parameter_clauses(&x.predicate, va, &y.predicate, vb, &mut out);
                    Self::parameter_clauses(&y.predicate, vb, &x.predicate, va, &mut out);
                }
                _ => {}
            }
        }

        out
    }

    /// Facts relating `pinned` (when it is an `equal`) to `other`.
    fn parameter_clauses(
        pinned: &ParamPredicate,
        p: i32,
        other: &ParamPredicate,
        o: i32,
        out: &mut Vec<Vec<i32>>,
    ) {
        let ParamPredicate::Equal(value) = pinned else {
            return;
        };
        if other.check(value) {
            out.push(vec![-p, o]);
        } else {
            out.push(vec![-p, -o]);
        }
        if *other == ParamPredicate::NotEqual(value.clone()) {
            out.push(vec![p, o]);
        }
    }

    /// The clauses so far, plus the domain facts and `root` asserted true.
    #[must_use]
    pub fn cnf(&self, root: i32) -> Cnf {
        let mut clauses = self.domain_clauses();
        clauses.extend(self.clauses.iter().cloned());
        clauses.push(vec![root]);
        Cnf::with_vars(clauses, self.next_var)
    }

    /// Terms in order of their variables.
    #[must_use]
    pub fn terms(&self) -> &[Arc<Term>] {
        &self.terms
    }

    /// Reads the term values out of a solver model.
    #[must_use]
    pub fn model(&self, solutions: &Solutions) -> Model {
        Model {
            values: self
                .terms
                .iter()
                .map(|t| (Arc::clone(t), solutions.check(self.vars[t])))
                .collect(),
        }
    }
}

/// A satisfying assignment of a tree's terms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Model {
    /// Truth value of every term of the tree.
    pub values: BTreeMap<Arc<Term>, bool>,
}

impl Model {
    /// The value of `term`, if it occurs in the tree.
    #[must_use]
    pub fn value(&self, term: &Term) -> Option<bool> {
        self.values.get(term).copied()
    }

    /// Terms set to true.
    pub fn true_terms(&self) -> impl Iterator<Item = &Arc<Term>> {
        self.values.iter().filter(|(_, v)| **v).map(|(t, _)| t)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (term, value) in &self.values {
            writeln!(f, "{}{term}", if *value { "  " } else { "! " })?;
        }
        Ok(())
    }
}

impl LogicNode {
    /// CNF that is satisfiable exactly when this tree is.
    #[must_use]
    pub fn to_cnf(&self) -> Cnf {
        let mut encoder = Encoder::new();
        let root = encoder.encode(self);
        encoder.cnf(root)
    }

    fn solve(&self, config: &SolverConfig) -> Result<(Encoder, SolveResult), SolveError> {
        let mut encoder = Encoder::new();
        let root = encoder.encode(self);
        let cnf = encoder.cnf(root);
        debug!(
            "encoded {} terms into {} variables and {} clauses",
            encoder.terms.len(),
            cnf.num_vars.saturating_sub(1),
            cnf.len()
        );

        let mut solver: Dpll = Dpll::new(cnf, *config);
        let result = solver.solve();
        let stats = solver.stats();
        debug!(
            "solver finished: sat={} unsat={} conflicts={} decisions={} propagations={} in {:?}",
            result.is_sat(),
            result.is_unsat(),
            stats.conflicts,
            stats.decisions,
            stats.propagations,
            stats.elapsed
        );

        match result {
            SolveResult::Unknown => Err(SolveError::Indeterminate {
                conflicts: stats.conflicts,
                elapsed: stats.elapsed,
            }),
            decided => Ok((encoder, decided)),
        }
    }

    /// Whether some assignment of the terms makes the tree true.
    ///
    /// # Errors
    ///
    /// [`SolveError::Indeterminate`] if the solver budget runs out.
    pub fn satisfiable(&self, config: &SolverConfig) -> Result<bool, SolveError> {
        self.solve(config).map(|(_, result)| result.is_sat())
    }

    /// A satisfying assignment of the tree's terms, if there is one.
    ///
    /// # Errors
    ///
    /// [`SolveError::Indeterminate`] if the solver budget runs out.
    pub fn find_model(&self, config: &SolverConfig) -> Result<Option<Model>, SolveError> {
        let (encoder, result) = self.solve(config)?;
        Ok(result.solutions().map(|s| encoder.model(&s)))
    }

    /// Whether both trees can hold at once.
    ///
    /// # Errors
    ///
    /// [`SolveError::Indeterminate`] if the solver budget runs out.
    pub fn compatible(&self, other: &Self, config: &SolverConfig) -> Result<bool, SolveError> {
        Self::And(vec![self.clone(), other.clone()]).satisfiable(config)
    }

    /// Whether both trees hold under exactly the same assignments.
    ///
    /// # Errors
    ///
    /// [`SolveError::Indeterminate`] if the solver budget runs out.
    pub fn equivalent(&self, other: &Self, config: &SolverConfig) -> Result<bool, SolveError> {
        Self::Xor(vec![self.clone(), other.clone()])
            .satisfiable(config)
            .map(|differs| !differs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::version::Version;
    use crate::logic::term::ParamValue;

    fn ext(name: &str, major: u32) -> LogicNode {
        LogicNode::term(Arc::new(Term::extension(name, Version::new(major, 0, 0))))
    }

    fn param(predicate: ParamPredicate) -> LogicNode {
        LogicNode::term(Arc::new(Term::parameter("XLEN", predicate)))
    }

    fn config() -> SolverConfig {
        SolverConfig::unbounded()
    }

    #[test]
    fn test_constants() {
        assert!(LogicNode::True.satisfiable(&config()).unwrap());
        assert!(!LogicNode::False.satisfiable(&config()).unwrap());
        assert!(!LogicNode::not(LogicNode::True).satisfiable(&config()).unwrap());
    }

    #[test]
    fn test_contradiction() {
        let a = ext("A", 1);
        let tree = LogicNode::all_of(vec![a.clone(), LogicNode::not(a)]);
        assert!(!tree.satisfiable(&config()).unwrap());
    }

    #[test]
    fn test_de_morgan() {
        let (a, b) = (ext("A", 1), ext("B", 1));
        let lhs = LogicNode::not(LogicNode::all_of(vec![a.clone(), b.clone()]));
        let rhs = LogicNode::any_of(vec![LogicNode::not(a), LogicNode::not(b)]);
        assert!(lhs.equivalent(&rhs, &config()).unwrap());
    }

    #[test]
    fn test_xor_self_inverse() {
        let a = LogicNode::any_of(vec![ext("A", 1), ext("B", 1)]);
        let xor = LogicNode::one_of(vec![a.clone(), a]);
        assert!(xor.equivalent(&LogicNode::False, &config()).unwrap());
    }

    #[test]
    fn test_none_of_and_if() {
        let (a, b) = (ext("A", 1), ext("B", 1));
        let none = LogicNode::none_of(vec![a.clone(), b.clone()]);
        let and_not = LogicNode::all_of(vec![LogicNode::not(a.clone()), LogicNode::not(b.clone())]);
        assert!(none.equivalent(&and_not, &config()).unwrap());

        let implies = LogicNode::implies(a.clone(), b.clone());
        let or = LogicNode::any_of(vec![LogicNode::not(a), b]);
        assert!(implies.equivalent(&or, &config()).unwrap());
    }

    #[test]
    fn test_one_of_is_exactly_one() {
        let (a, b, c) = (ext("A", 1), ext("B", 1), ext("C", 1));
        let one = LogicNode::one_of(vec![a.clone(), b.clone(), c]);
        let two = LogicNode::all_of(vec![one.clone(), a, b]);
        assert!(one.satisfiable(&config()).unwrap());
        assert!(!two.satisfiable(&config()).unwrap());
    }

    #[test]
    fn test_versions_are_exclusive() {
        let tree = LogicNode::all_of(vec![ext("A", 1), ext("A", 2)]);
        assert!(!tree.satisfiable(&config()).unwrap());
        assert!(ext("A", 1).compatible(&ext("B", 2), &config()).unwrap());
    }

    #[test]
    fn test_parameter_consistency() {
        let eq32 = param(ParamPredicate::Equal(ParamValue::Int(32)));
        let eq64 = param(ParamPredicate::Equal(ParamValue::Int(64)));
        let ne32 = param(ParamPredicate::NotEqual(ParamValue::Int(32)));
        let lt40 = param(ParamPredicate::LessThan(40));

        assert!(!eq32.compatible(&eq64, &config()).unwrap());
        assert!(!eq32.compatible(&ne32, &config()).unwrap());
        assert!(!eq64.compatible(&lt40, &config()).unwrap());
        assert!(eq32.compatible(&lt40, &config()).unwrap());
        // not_equal(32) is exactly the negation of equal(32)
        assert!(LogicNode::not(eq32).equivalent(&ne32, &config()).unwrap());
    }

    #[test]
    fn test_find_model() {
        let tree = LogicNode::all_of(vec![
            ext("A", 1),
            LogicNode::implies(ext("A", 1), ext("B", 1)),
            LogicNode::not(ext("C", 1)),
        ]);
        let model = tree.find_model(&config()).unwrap().unwrap();
        assert_eq!(model.value(&Term::extension("A", Version::new(1, 0, 0))), Some(true));
        assert_eq!(model.value(&Term::extension("B", Version::new(1, 0, 0))), Some(true));
        assert_eq!(model.value(&Term::extension("C", Version::new(1, 0, 0))), Some(false));
        assert_eq!(model.true_terms().count(), 2);

        assert_eq!(LogicNode::False.find_model(&config()).unwrap(), None);
    }

    #[test]
    fn test_to_cnf_is_dimacs() {
        let cnf = LogicNode::any_of(vec![ext("A", 1), ext("B", 1)]).to_cnf();
        let text = cnf.to_string();
        assert!(text.starts_with("p cnf 3 4\n"));
        assert_eq!(cnf.len(), 4);
    }

    #[test]
    fn test_indeterminate_is_reported() {
        // pigeonhole 5 -> 4 over extension terms needs more than one conflict
        let pigeon = |i: u32, h: u32| ext(&format!("P{i}H{h}"), 1);
        let mut parts = Vec::new();
        for i in 0..5 {
            parts.push(LogicNode::any_of((0..4).map(|h| pigeon(i, h)).collect()));
        }
        for h in 0..4 {
            for i in 0..5 {
                for j in (i + 1)..5 {
                    parts.push(LogicNode::not(LogicNode::all_of(vec![
                        pigeon(i, h),
                        pigeon(j, h),
                    ])));
                }
            }
        }
        let tree = LogicNode::all_of(parts);
        let budget = SolverConfig::unbounded().with_conflict_limit(Some(1));
        assert!(matches!(
            tree.satisfiable(&budget),
            Err(SolveError::Indeterminate { .. })
        ));
    }
}
