#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Literal representations used by the solver.
//!
//! A literal is a variable together with a polarity. Variables are numbered
//! from `1`, following the DIMACS convention, so that a literal can be
//! converted to and from a signed integer (`3` / `-3`).

use core::ops::{Neg, Not};
use std::fmt::Debug;
use std::hash::Hash;

/// A propositional variable. `0` is never used.
pub type Variable = u32;

/// Common interface of every literal encoding.
pub trait Literal: Copy + Debug + Eq + Hash + Default + Ord {
    /// Builds a literal for `var`; `polarity == true` is the positive literal.
    fn new(var: Variable, polarity: bool) -> Self;

    /// The underlying variable.
    fn variable(self) -> Variable;

    /// `true` for the positive literal.
    fn polarity(self) -> bool;

    /// The literal of opposite polarity.
    #[must_use]
    fn negated(self) -> Self {
        Self::new(self.variable(), !self.polarity())
    }

    /// `true` for the negative literal.
    fn is_negated(self) -> bool {
        !self.polarity()
    }

    /// Dense index `2 * var + (negated as usize)`, used to address watch lists.
    fn index(self) -> usize {
        (self.variable() as usize) * 2 + usize::from(self.is_negated())
    }

    /// Parses a DIMACS literal: `-3` is variable 3, negated.
    #[must_use]
    fn from_i32(value: i32) -> Self {
        Self::new(value.unsigned_abs(), value.is_positive())
    }

    /// The DIMACS form of the literal.
    #[allow(clippy::cast_possible_wrap)]
    fn to_i32(self) -> i32 {
        let var = self.variable() as i32;
        if self.polarity() { var } else { -var }
    }
}

/// Variable in the low 31 bits, polarity in the top bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PackedLiteral(u32);

impl Literal for PackedLiteral {
    fn new(var: Variable, polarity: bool) -> Self {
        Self(var & 0x7FFF_FFFF | (u32::from(polarity) << 31))
    }

    fn variable(self) -> Variable {
        self.0 & 0x7FFF_FFFF
    }

    fn polarity(self) -> bool {
        (self.0 >> 31) != 0
    }

    fn negated(self) -> Self {
        Self(self.0 ^ 0x8000_0000)
    }
}

impl Neg for PackedLiteral {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for PackedLiteral {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl From<i32> for PackedLiteral {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}
