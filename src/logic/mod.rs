#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Logic trees over extension, parameter and script terms: construction,
//! three-valued evaluation and SAT-backed queries.

/// Tseytin encoding and solver-backed queries.
pub mod encode;
/// Three-valued evaluation.
pub mod eval;
/// The tree type.
pub mod node;
/// Three-valued truth values.
pub mod satisfied;
/// Leaves of the tree.
pub mod term;
