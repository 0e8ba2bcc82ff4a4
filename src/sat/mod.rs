#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A small DPLL SAT solver over DIMACS-numbered variables.
/// Truth values of variables during search.
pub mod assignment;
/// Disjunctions of literals.
pub mod clause;
/// Formulas in conjunctive normal form.
pub mod cnf;
/// Search budgets.
pub mod configs;
/// The DPLL solver.
pub mod dpll;
/// Literal encodings.
pub mod literal;
/// Polarity choice for decisions.
pub mod phase_saving;
/// Unit propagation with watched literals.
pub mod propagation;
/// The solver interface and its results.
pub mod solver;
/// Assignment history and backtracking.
pub mod trail;
/// Decision variable heuristics.
pub mod variable_selection;
