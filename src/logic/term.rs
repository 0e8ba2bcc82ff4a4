#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Atomic propositions of a logic tree.
//!
//! A [`Term`] is structurally compared and hashed, so two terms naming the
//! same extension version or the same parameter predicate are the same
//! proposition and share one solver variable.

use crate::arch::version::Version;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// "Extension `name` is implemented at exactly `version`."
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtensionTerm {
    /// Extension name.
    pub name: String,
    /// The exact version.
    pub version: Version,
}

impl ExtensionTerm {
    /// Extension `name` at `version`.
    #[must_use]
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for ExtensionTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A parameter value as written in the database or a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A string.
    Str(String),
    /// A list of values.
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Rendering as a literal of the predicate language.
    #[must_use]
    pub fn to_idl(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Str(s) => format!("\"{s}\""),
            Self::Array(items) => format!("[{}]", items.iter().map(Self::to_idl).join(", ")),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_idl())
    }
}

/// What a parameter value must look like for a [`ParameterTerm`] to hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamPredicate {
    /// The value equals the operand.
    Equal(ParamValue),
    /// The value differs from the operand.
    NotEqual(ParamValue),
    /// An integer value below the bound.
    LessThan(i64),
    /// An integer value above the bound.
    GreaterThan(i64),
    /// The value is an array containing the given element.
    Includes(ParamValue),
}

impl ParamPredicate {
    /// Whether `value` satisfies the predicate. Ordering predicates only hold
    /// for integer values.
    #[must_use]
    pub fn check(&self, value: &ParamValue) -> bool {
        match self {
            Self::Equal(expected) => value == expected,
            Self::NotEqual(expected) => value != expected,
            Self::LessThan(bound) => matches!(value, ParamValue::Int(v) if v < bound),
            Self::GreaterThan(bound) => matches!(value, ParamValue::Int(v) if v > bound),
            Self::Includes(item) => {
                matches!(value, ParamValue::Array(items) if items.contains(item))
            }
        }
    }

    /// Grammar key of the predicate (`equal`, `not_equal`, ...).
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Equal(_) => "equal",
            Self::NotEqual(_) => "not_equal",
            Self::LessThan(_) => "less_than",
            Self::GreaterThan(_) => "greater_than",
            Self::Includes(_) => "includes",
        }
    }

    /// The operand as a [`ParamValue`].
    #[must_use]
    pub fn operand(&self) -> ParamValue {
        match self {
            Self::Equal(v) | Self::NotEqual(v) | Self::Includes(v) => v.clone(),
            Self::LessThan(n) | Self::GreaterThan(n) => ParamValue::Int(*n),
        }
    }
}

/// "Parameter `name` has a value accepted by `predicate`."
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterTerm {
    /// Parameter name.
    pub name: String,
    /// What the value must satisfy.
    pub predicate: ParamPredicate,
}

impl ParameterTerm {
    /// Predicate `predicate` over parameter `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, predicate: ParamPredicate) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }

    /// Rendering as a predicate expression.
    #[must_use]
    pub fn to_idl(&self) -> String {
        let n = &self.name;
        match &self.predicate {
            ParamPredicate::Equal(v) => format!("({n} == {})", v.to_idl()),
            ParamPredicate::NotEqual(v) => format!("({n} != {})", v.to_idl()),
            ParamPredicate::LessThan(b) => format!("({n} < {b})"),
            ParamPredicate::GreaterThan(b) => format!("({n} > {b})"),
            ParamPredicate::Includes(v) => format!("$array_includes?({n}, {})", v.to_idl()),
        }
    }
}

impl fmt::Display for ParameterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = &self.name;
        match &self.predicate {
            ParamPredicate::Equal(v) => write!(f, "{n}=={v}"),
            ParamPredicate::NotEqual(v) => write!(f, "{n}!={v}"),
            ParamPredicate::LessThan(b) => write!(f, "{n}<{b}"),
            ParamPredicate::GreaterThan(b) => write!(f, "{n}>{b}"),
            ParamPredicate::Includes(v) => write!(f, "{v} in {n}"),
        }
    }
}

/// An opaque scripted predicate, identified by its source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptTerm {
    /// Script source text.
    pub source: String,
}

impl fmt::Display for ScriptTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "idl({})", self.source)
    }
}

/// An atomic proposition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// An extension version is implemented.
    Extension(ExtensionTerm),
    /// A parameter value satisfies a predicate.
    Parameter(ParameterTerm),
    /// A scripted predicate holds.
    Script(ScriptTerm),
}

impl Term {
    /// Extension `name` at `version`.
    #[must_use]
    pub fn extension(name: impl Into<String>, version: Version) -> Self {
        Self::Extension(ExtensionTerm::new(name, version))
    }

    /// Predicate `predicate` over parameter `name`.
    #[must_use]
    pub fn parameter(name: impl Into<String>, predicate: ParamPredicate) -> Self {
        Self::Parameter(ParameterTerm::new(name, predicate))
    }

    /// Script `source`.
    #[must_use]
    pub fn script(source: impl Into<String>) -> Self {
        Self::Script(ScriptTerm {
            source: source.into(),
        })
    }

    /// Rendering as a predicate expression.
    #[must_use]
    pub fn to_idl(&self) -> String {
        match self {
            Self::Extension(e) => format!(
                "implemented_version?(ExtensionName::{}, \"= {}\")",
                e.name, e.version
            ),
            Self::Parameter(p) => p.to_idl(),
            Self::Script(s) => format!("({})", s.source),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension(e) => fmt::Display::fmt(e, f),
            Self::Parameter(p) => fmt::Display::fmt(p, f),
            Self::Script(s) => fmt::Display::fmt(s, f),
        }
    }
}

/// Hands out one shared allocation per structurally distinct [`Term`].
///
/// Safe to use from many builder threads at once: lookups take the read lock,
/// and a miss re-checks under the write lock before inserting, so concurrent
/// interning of equal terms always yields the same `Arc`.
#[derive(Debug, Default)]
pub struct TermInterner {
    terms: RwLock<FxHashSet<Arc<Term>>>,
}

impl TermInterner {
    /// An empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared allocation equal to `term`, created on first use.
    pub fn intern(&self, term: Term) -> Arc<Term> {
        {
            let terms = self.terms.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = terms.get(&term) {
                return Arc::clone(existing);
            }
        }

        let mut terms = self.terms.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = terms.get(&term) {
            return Arc::clone(existing);
        }
        let interned = Arc::new(term);
        terms.insert(Arc::clone(&interned));
        interned
    }

    /// Number of distinct terms interned.
    pub fn len(&self) -> usize {
        self.terms.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
