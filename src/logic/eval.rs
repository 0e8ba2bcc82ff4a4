#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Three-valued evaluation of logic trees.
//!
//! A [`TermValuation`] says what is known about each leaf. [`LogicNode::evaluate`]
//! combines the leaves with Kleene's strong three-valued connectives, so an
//! undetermined leaf only makes the result undetermined when it could
//! actually change the outcome.

use crate::logic::node::LogicNode;
use crate::logic::satisfied::SatisfiedResult;
use crate::logic::term::{ExtensionTerm, ParameterTerm, ScriptTerm, Term};
use std::collections::BTreeSet;

/// Truth of individual leaves under some configuration.
pub trait TermValuation {
    /// Whether the extension version is implemented.
    fn extension(&self, term: &ExtensionTerm) -> SatisfiedResult;

    /// Whether the parameter predicate holds.
    fn parameter(&self, term: &ParameterTerm) -> SatisfiedResult;

    /// Scripted predicates are opaque unless a [`ScriptEvaluator`] is supplied
    /// through [`WithScripts`].
    fn script(&self, _term: &ScriptTerm) -> SatisfiedResult {
        SatisfiedResult::Maybe
    }

    /// Dispatches on the kind of `term`.
    fn term(&self, term: &Term) -> SatisfiedResult {
        match term {
            Term::Extension(e) => self.extension(e),
            Term::Parameter(p) => self.parameter(p),
            Term::Script(s) => self.script(s),
        }
    }
}

/// Evaluates scripted predicate sources.
pub trait ScriptEvaluator {
    /// Whether the script `source` holds.
    fn evaluate(&self, source: &str) -> SatisfiedResult;
}

/// A valuation whose script leaves are decided by a [`ScriptEvaluator`].
pub struct WithScripts<'a, V: TermValuation + ?Sized> {
    /// Valuation of extension and parameter leaves.
    pub inner: &'a V,
    /// Evaluator of script leaves.
    pub scripts: &'a dyn ScriptEvaluator,
}

impl<V: TermValuation + ?Sized> TermValuation for WithScripts<'_, V> {
    fn extension(&self, term: &ExtensionTerm) -> SatisfiedResult {
        self.inner.extension(term)
    }

    fn parameter(&self, term: &ParameterTerm) -> SatisfiedResult {
        self.inner.parameter(term)
    }

    fn script(&self, term: &ScriptTerm) -> SatisfiedResult {
        self.scripts.evaluate(&term.source)
    }
}

/// An explicit set of implemented extension versions, taken as ground truth.
/// Nothing is known about parameters.
impl TermValuation for BTreeSet<ExtensionTerm> {
    fn extension(&self, term: &ExtensionTerm) -> SatisfiedResult {
        self.contains(term).into()
    }

    fn parameter(&self, _term: &ParameterTerm) -> SatisfiedResult {
        SatisfiedResult::Maybe
    }
}

impl LogicNode {
    /// Kleene evaluation of the tree under `valuation`.
    pub fn evaluate<V: TermValuation + ?Sized>(&self, valuation: &V) -> SatisfiedResult {
        match self {
            Self::True => SatisfiedResult::Yes,
            Self::False => SatisfiedResult::No,
            Self::Term(t) => valuation.term(t),
            Self::Not(child) => !child.evaluate(valuation),
            Self::And(cs) => SatisfiedResult::all(cs.iter().map(|c| c.evaluate(valuation))),
            Self::Or(cs) => SatisfiedResult::any(cs.iter().map(|c| c.evaluate(valuation))),
            Self::NoneOf(cs) => {
                SatisfiedResult::all(cs.iter().map(|c| !c.evaluate(valuation)))
            }
            Self::Xor(cs) => {
                let (mut yes, mut maybe) = (0usize, 0usize);
                for c in cs {
                    match c.evaluate(valuation) {
                        SatisfiedResult::Yes => yes += 1,
                        SatisfiedResult::Maybe => maybe += 1,
                        SatisfiedResult::No => {}
                    }
                }
                match (yes, maybe) {
                    (2.., _) | (0, 0) => SatisfiedResult::No,
                    (1, 0) => SatisfiedResult::Yes,
                    _ => SatisfiedResult::Maybe,
                }
            }
            Self::If(cond, then) => match cond.evaluate(valuation) {
                SatisfiedResult::No => SatisfiedResult::Yes,
                SatisfiedResult::Yes => then.evaluate(valuation),
                SatisfiedResult::Maybe => match then.evaluate(valuation) {
                    SatisfiedResult::Yes => SatisfiedResult::Yes,
                    _ => SatisfiedResult::Maybe,
                },
            },
        }
    }

    /// Evaluates against an explicit extension-version set.
    pub fn evaluate_extensions(&self, implemented: &BTreeSet<ExtensionTerm>) -> SatisfiedResult {
        self.evaluate(implemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::version::Version;
    use crate::logic::satisfied::SatisfiedResult::{Maybe, No, Yes};
    use std::sync::Arc;

    /// Yes for `Y*`, No for `N*`, Maybe for anything else.
    struct ByName;

    impl TermValuation for ByName {
        fn extension(&self, term: &ExtensionTerm) -> SatisfiedResult {
            match term.name.chars().next() {
                Some('Y') => Yes,
                Some('N') => No,
                _ => Maybe,
            }
        }

        fn parameter(&self, _term: &ParameterTerm) -> SatisfiedResult {
            Maybe
        }
    }

    struct AlwaysYes;

    impl ScriptEvaluator for AlwaysYes {
        fn evaluate(&self, _source: &str) -> SatisfiedResult {
            Yes
        }
    }

    fn t(name: &str) -> LogicNode {
        LogicNode::term(Arc::new(Term::extension(name, Version::new(1, 0, 0))))
    }

    #[test]
    fn test_connectives() {
        let v = ByName;
        assert_eq!(LogicNode::all_of(vec![t("Y1"), t("M1")]).evaluate(&v), Maybe);
        assert_eq!(LogicNode::all_of(vec![t("N1"), t("M1")]).evaluate(&v), No);
        assert_eq!(LogicNode::any_of(vec![t("Y1"), t("M1")]).evaluate(&v), Yes);
        assert_eq!(LogicNode::any_of(vec![t("N1"), t("N2")]).evaluate(&v), No);
        assert_eq!(LogicNode::not(t("M1")).evaluate(&v), Maybe);
        assert_eq!(LogicNode::none_of(vec![t("N1"), t("N2")]).evaluate(&v), Yes);
        assert_eq!(LogicNode::none_of(vec![t("N1"), t("Y1")]).evaluate(&v), No);
        assert_eq!(LogicNode::none_of(vec![t("N1"), t("M1")]).evaluate(&v), Maybe);
    }

    #[test]
    fn test_xor() {
        let v = ByName;
        assert_eq!(LogicNode::one_of(vec![t("N1"), t("Y1"), t("N2")]).evaluate(&v), Yes);
        assert_eq!(LogicNode::one_of(vec![t("Y1"), t("Y2"), t("M1")]).evaluate(&v), No);
        assert_eq!(LogicNode::one_of(vec![t("N1"), t("N2")]).evaluate(&v), No);
        assert_eq!(LogicNode::one_of(vec![t("Y1"), t("M1")]).evaluate(&v), Maybe);
        assert_eq!(LogicNode::one_of(vec![t("N1"), t("M1")]).evaluate(&v), Maybe);
    }

    #[test]
    fn test_if() {
        let v = ByName;
        assert_eq!(LogicNode::implies(t("N1"), t("N2")).evaluate(&v), Yes);
        assert_eq!(LogicNode::implies(t("Y1"), t("N2")).evaluate(&v), No);
        assert_eq!(LogicNode::implies(t("Y1"), t("M1")).evaluate(&v), Maybe);
        assert_eq!(LogicNode::implies(t("M1"), t("Y1")).evaluate(&v), Yes);
        assert_eq!(LogicNode::implies(t("M1"), t("N1")).evaluate(&v), Maybe);
    }

    #[test]
    fn test_extension_set_is_ground_truth() {
        let set: BTreeSet<ExtensionTerm> =
            [ExtensionTerm::new("A", Version::new(1, 0, 0))].into_iter().collect();
        assert_eq!(t("A").evaluate_extensions(&set), Yes);
        assert_eq!(t("B").evaluate_extensions(&set), No);

        let script = LogicNode::term(Arc::new(Term::script("XLEN == 64")));
        assert_eq!(script.evaluate_extensions(&set), Maybe);
        let with = WithScripts {
            inner: &set,
            scripts: &AlwaysYes,
        };
        assert_eq!(script.evaluate(&with), Yes);
    }
}
