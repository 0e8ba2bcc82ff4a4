#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Boolean expression trees over [`Term`]s.

use crate::logic::term::Term;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Operator of a [`LogicNode`], without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// [`LogicNode::And`]
    And,
    /// [`LogicNode::Or`]
    Or,
    /// [`LogicNode::Xor`]
    Xor,
    /// [`LogicNode::NoneOf`]
    NoneOf,
    /// [`LogicNode::Not`]
    Not,
    /// [`LogicNode::If`]
    If,
    /// [`LogicNode::Term`]
    Term,
    /// [`LogicNode::True`]
    True,
    /// [`LogicNode::False`]
    False,
}

/// An immutable boolean expression.
///
/// The n-ary operators always hold at least one child; the constructors
/// below fold empty operand lists into the matching constant. `NoneOf` is
/// kept as its own operator (rather than `And` of negations) so that a tree
/// serializes back to the shape it was written in.
///
/// `Xor` is true when exactly one child is true.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicNode {
    /// Always true.
    True,
    /// Always false.
    False,
    /// An atomic proposition.
    Term(Arc<Term>),
    /// Negation.
    Not(Box<LogicNode>),
    /// Every child holds.
    And(Vec<LogicNode>),
    /// At least one child holds.
    Or(Vec<LogicNode>),
    /// Exactly one child holds.
    Xor(Vec<LogicNode>),
    /// No child holds.
    NoneOf(Vec<LogicNode>),
    /// `If(condition, consequence)`
    If(Box<LogicNode>, Box<LogicNode>),
}

impl LogicNode {
    /// A leaf.
    #[must_use]
    pub const fn term(term: Arc<Term>) -> Self {
        Self::Term(term)
    }

    /// `True` or `False`.
    #[must_use]
    pub fn constant(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    /// Negation of `child`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Self) -> Self {
        Self::Not(Box::new(child))
    }

    /// `And` of `children`; `True` when there are none.
    #[must_use]
    pub fn all_of(children: Vec<Self>) -> Self {
        if children.is_empty() {
            Self::True
        } else {
            Self::And(children)
        }
    }

    /// `Or` of `children`; `False` when there are none.
    #[must_use]
    pub fn any_of(children: Vec<Self>) -> Self {
        if children.is_empty() {
            Self::False
        } else {
            Self::Or(children)
        }
    }

    /// `Xor` of `children`; `False` when there are none.
    #[must_use]
    pub fn one_of(children: Vec<Self>) -> Self {
        if children.is_empty() {
            Self::False
        } else {
            Self::Xor(children)
        }
    }

    /// `NoneOf` of `children`; `True` when there are none.
    #[must_use]
    pub fn none_of(children: Vec<Self>) -> Self {
        if children.is_empty() {
            Self::True
        } else {
            Self::NoneOf(children)
        }
    }

    /// `condition -> consequence`.
    #[must_use]
    pub fn implies(condition: Self, consequence: Self) -> Self {
        Self::If(Box::new(condition), Box::new(consequence))
    }

    /// The operator, without operands.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::True => NodeKind::True,
            Self::False => NodeKind::False,
            Self::Term(_) => NodeKind::Term,
            Self::Not(_) => NodeKind::Not,
            Self::And(_) => NodeKind::And,
            Self::Or(_) => NodeKind::Or,
            Self::Xor(_) => NodeKind::Xor,
            Self::NoneOf(_) => NodeKind::NoneOf,
            Self::If(_, _) => NodeKind::If,
        }
    }

    /// Direct operands, in order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::True | Self::False | Self::Term(_) => Vec::new(),
            Self::Not(child) => vec![child.as_ref()],
            Self::And(cs) | Self::Or(cs) | Self::Xor(cs) | Self::NoneOf(cs) => cs.iter().collect(),
            Self::If(cond, then) => vec![cond.as_ref(), then.as_ref()],
        }
    }

    /// Every distinct term in the tree.
    #[must_use]
    pub fn terms(&self) -> BTreeSet<Arc<Term>> {
        let mut out = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Self::Term(t) = node {
                out.insert(Arc::clone(t));
            }
            stack.extend(node.children());
        }
        out
    }

    /// Renders the tree as a side-effect-free predicate expression.
    #[must_use]
    pub fn to_idl(&self) -> String {
        match self {
            Self::True => "true".to_string(),
            Self::False => "false".to_string(),
            Self::Term(t) => t.to_idl(),
            Self::Not(child) => format!("!{}", child.to_idl()),
            Self::And(cs) => format!("({})", cs.iter().map(Self::to_idl).join(" && ")),
            Self::Or(cs) => format!("({})", cs.iter().map(Self::to_idl).join(" || ")),
            Self::Xor(cs) => format!(
                "(({}) == 1)",
                cs.iter()
                    .map(|c| format!("({} ? 1 : 0)", c.to_idl()))
                    .join(" + ")
            ),
            Self::NoneOf(cs) => format!("!({})", cs.iter().map(Self::to_idl).join(" || ")),
            Self::If(cond, then) => format!("(!{} || {})", cond.to_idl(), then.to_idl()),
        }
    }
}

impl From<bool> for LogicNode {
    fn from(value: bool) -> Self {
        Self::constant(value)
    }
}

impl fmt::Display for LogicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::Term(t) => write!(f, "{t}"),
            Self::Not(child) => write!(f, "!{child}"),
            Self::And(cs) => write!(f, "({})", cs.iter().join(" && ")),
            Self::Or(cs) => write!(f, "({})", cs.iter().join(" || ")),
            Self::Xor(cs) => write!(f, "one_of({})", cs.iter().join(", ")),
            Self::NoneOf(cs) => write!(f, "none_of({})", cs.iter().join(", ")),
            Self::If(cond, then) => write!(f, "({cond} -> {then})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::version::Version;

    fn ext(name: &str) -> LogicNode {
        LogicNode::term(Arc::new(Term::extension(name, Version::new(1, 0, 0))))
    }

    #[test]
    fn test_empty_operands_fold_to_constants() {
        assert_eq!(LogicNode::all_of(vec![]), LogicNode::True);
        assert_eq!(LogicNode::any_of(vec![]), LogicNode::False);
        assert_eq!(LogicNode::one_of(vec![]), LogicNode::False);
        assert_eq!(LogicNode::none_of(vec![]), LogicNode::True);
        assert_eq!(LogicNode::all_of(vec![ext("A")]).kind(), NodeKind::And);
    }

    #[test]
    fn test_terms_are_deduplicated() {
        let tree = LogicNode::any_of(vec![
            ext("A"),
            LogicNode::not(ext("B")),
            LogicNode::implies(ext("A"), ext("C")),
        ]);
        let names: Vec<String> = tree.terms().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["A@1.0.0", "B@1.0.0", "C@1.0.0"]);
    }

    #[test]
    fn test_display() {
        let tree = LogicNode::all_of(vec![
            ext("A"),
            LogicNode::none_of(vec![ext("B")]),
            LogicNode::implies(ext("C"), LogicNode::not(ext("D"))),
        ]);
        assert_eq!(
            tree.to_string(),
            "(A@1.0.0 && none_of(B@1.0.0) && (C@1.0.0 -> !D@1.0.0))"
        );
    }

    #[test]
    fn test_to_idl() {
        let tree = LogicNode::implies(
            ext("A"),
            LogicNode::one_of(vec![ext("B"), LogicNode::False]),
        );
        assert_eq!(
            tree.to_idl(),
            "(!implemented_version?(ExtensionName::A, \"= 1.0.0\") || \
             (((implemented_version?(ExtensionName::B, \"= 1.0.0\") ? 1 : 0) + (false ? 1 : 0)) == 1))"
        );
    }
}
