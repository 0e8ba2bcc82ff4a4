#![deny(missing_docs)]
//! Requirement expressions over an ISA database.
//!
//! Conditions written in a small YAML/JSON grammar are built into logic trees
//! over extension-version, parameter and scripted terms. Trees can be
//! evaluated against hardware configurations with three-valued logic, or
//! encoded to CNF and handed to the SAT solver to decide satisfiability,
//! compatibility and equivalence.

/// The `sat` module implements the DPLL solver and the CNF types it works on.
pub mod sat;

/// The `logic` module holds terms, logic trees, three-valued evaluation and
/// the CNF encoding of trees.
pub mod logic;

/// The `arch` module holds the extension and parameter database, versions,
/// and hardware configurations.
pub mod arch;

/// The `condition` module parses condition specs and builds them into logic
/// trees, expanding extension implications and conflicts.
pub mod condition;
