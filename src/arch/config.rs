#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Hardware configurations: what is known about an implementation.
//!
//! * A fully configured implementation lists every extension version it
//!   implements and every parameter value. Every leaf is decided.
//! * A partially configured one lists mandatory extensions, optionally
//!   prohibited ones, and the parameters pinned so far. Extensions that are
//!   neither are possible.
//! * An unconfigured implementation decides nothing.

use crate::arch::database::{ArchDb, ResolveContext};
use crate::arch::extension::ExtensionRequirement;
use crate::condition::ConditionError;
use crate::condition::builder::ConditionBuilder;
use crate::logic::eval::{ScriptEvaluator, TermValuation, WithScripts};
use crate::logic::node::LogicNode;
use crate::logic::satisfied::SatisfiedResult;
use crate::logic::term::{ExtensionTerm, ParamValue, ParameterTerm};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Every extension version implemented and every parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FullConfig {
    /// The implemented extension versions.
    #[serde(default)]
    pub implemented_extensions: BTreeSet<ExtensionTerm>,
    /// Parameter values. A parameter missing here does not exist.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl FullConfig {
    /// A configuration implementing exactly `extensions`, taken as given.
    #[must_use]
    pub fn new(extensions: impl IntoIterator<Item = ExtensionTerm>) -> Self {
        Self {
            implemented_extensions: extensions.into_iter().collect(),
            params: BTreeMap::new(),
        }
    }

    /// Pins parameter `name` to `value`.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Adds every extension version implied by the listed ones, following
    /// implications until nothing changes. A guarded implication applies
    /// when its guard is certainly true in the configuration built so far.
    ///
    /// # Errors
    ///
    /// Any error building a guard condition.
    pub fn with_implied_closure(mut self, db: &ArchDb) -> Result<Self, ConditionError> {
        let mut builder = ConditionBuilder::new(db).minimal();

        loop {
            let mut added = BTreeSet::new();
            for term in &self.implemented_extensions {
                let Some(version) = db
                    .extension(&term.name)
                    .and_then(|ext| ext.version(&term.version))
                else {
                    continue;
                };

                for (implied, guard) in version.implies.implied_extension_versions() {
                    if self.implemented_extensions.contains(&implied) {
                        continue;
                    }
                    let applies = match guard {
                        None => true,
                        Some(guard) => builder.build(guard)?.evaluate(&self).is_yes(),
                    };
                    if applies {
                        added.insert(implied);
                    }
                }
            }

            if added.is_empty() {
                return Ok(self);
            }
            debug!("implied closure adds {added:?}");
            self.implemented_extensions.extend(added);
        }
    }
}

impl TermValuation for FullConfig {
    fn extension(&self, term: &ExtensionTerm) -> SatisfiedResult {
        self.implemented_extensions.contains(term).into()
    }

    /// A parameter missing from a full configuration does not exist there.
    fn parameter(&self, term: &ParameterTerm) -> SatisfiedResult {
        self.params
            .get(&term.name)
            .is_some_and(|value| term.predicate.check(value))
            .into()
    }
}

/// What is known so far about an implementation still being configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialConfig {
    /// Extensions the implementation must have.
    #[serde(default)]
    pub mandatory_extensions: Vec<ExtensionRequirement>,
    /// Extensions the implementation must not have.
    #[serde(default)]
    pub prohibited_extensions: Vec<ExtensionRequirement>,
    /// Whether extensions that are neither mandatory nor prohibited may be
    /// implemented.
    #[serde(default = "default_true")]
    pub additional_extensions: bool,
    /// Parameters pinned so far.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

const fn default_true() -> bool {
    true
}

impl Default for PartialConfig {
    fn default() -> Self {
        Self {
            mandatory_extensions: Vec::new(),
            prohibited_extensions: Vec::new(),
            additional_extensions: true,
            params: BTreeMap::new(),
        }
    }
}

impl PartialConfig {
    fn mandatory_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ExtensionRequirement> + 'a {
        self.mandatory_extensions.iter().filter(move |req| req.name == name)
    }

    /// Whether `term` is certainly implemented: some mandatory requirement
    /// pins exactly this version and none rules it out.
    #[must_use]
    pub fn is_mandatory(&self, term: &ExtensionTerm) -> bool {
        let mut pinned = false;
        for req in self.mandatory_for(&term.name) {
            if !req.requirement.matches(&term.version) {
                return false;
            }
            pinned |= req.requirement.exact_version() == Some(term.version);
        }
        pinned
    }

    /// Whether `term` may end up implemented. Mandatory requirements on the
    /// extension decide alone; otherwise the version must not be prohibited
    /// and additions must be allowed.
    #[must_use]
    pub fn is_possible(&self, term: &ExtensionTerm) -> bool {
        let mut mandatory = self.mandatory_for(&term.name).peekable();
        if mandatory.peek().is_some() {
            return mandatory.all(|req| req.requirement.matches(&term.version));
        }

        let prohibited = self
            .prohibited_extensions
            .iter()
            .any(|req| req.name == term.name && req.requirement.matches(&term.version));
        !prohibited && self.additional_extensions
    }

    /// Evaluates `tree` in two passes. With only the mandatory extensions
    /// implemented a `Yes` is final. Otherwise the tree is evaluated with
    /// every possible extension implemented, where anything but `No` becomes
    /// `Maybe`.
    #[must_use]
    pub fn evaluate(&self, tree: &LogicNode, scripts: Option<&dyn ScriptEvaluator>) -> SatisfiedResult {
        let mandatory = PartialPass {
            config: self,
            possible: false,
        };
        if evaluate_with(tree, &mandatory, scripts).is_yes() {
            return SatisfiedResult::Yes;
        }

        let possible = PartialPass {
            config: self,
            possible: true,
        };
        match evaluate_with(tree, &possible, scripts) {
            SatisfiedResult::No => SatisfiedResult::No,
            SatisfiedResult::Yes | SatisfiedResult::Maybe => SatisfiedResult::Maybe,
        }
    }
}

/// One pass of [`PartialConfig::evaluate`]: extensions are decided by
/// `is_possible` or by `is_mandatory`.
struct PartialPass<'a> {
    config: &'a PartialConfig,
    possible: bool,
}

impl TermValuation for PartialPass<'_> {
    fn extension(&self, term: &ExtensionTerm) -> SatisfiedResult {
        if self.possible {
            self.config.is_possible(term).into()
        } else {
            self.config.is_mandatory(term).into()
        }
    }

    fn parameter(&self, term: &ParameterTerm) -> SatisfiedResult {
        self.config
            .params
            .get(&term.name)
            .map_or(SatisfiedResult::Maybe, |value| term.predicate.check(value).into())
    }
}

/// Nothing is decided.
struct Undecided;

impl TermValuation for Undecided {
    fn extension(&self, _term: &ExtensionTerm) -> SatisfiedResult {
        SatisfiedResult::Maybe
    }

    fn parameter(&self, _term: &ParameterTerm) -> SatisfiedResult {
        SatisfiedResult::Maybe
    }
}

fn evaluate_with<V: TermValuation>(
    tree: &LogicNode,
    valuation: &V,
    scripts: Option<&dyn ScriptEvaluator>,
) -> SatisfiedResult {
    match scripts {
        Some(scripts) => tree.evaluate(&WithScripts {
            inner: valuation,
            scripts,
        }),
        None => tree.evaluate(valuation),
    }
}

/// A configuration, as read from a YAML document tagged with `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HwConfig {
    /// Every leaf is decided.
    #[serde(rename = "fully_configured")]
    Full(FullConfig),
    /// Some extensions are mandatory, some prohibited, the rest possible.
    #[serde(rename = "partially_configured")]
    Partial(PartialConfig),
    /// Nothing is known.
    #[serde(rename = "unconfigured")]
    Unconfigured,
}

impl HwConfig {
    /// # Errors
    ///
    /// Malformed YAML or an unknown `type`.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Whether this configuration satisfies `tree`. Script leaves are
    /// `Maybe` unless `scripts` decides them.
    #[must_use]
    pub fn evaluate(&self, tree: &LogicNode, scripts: Option<&dyn ScriptEvaluator>) -> SatisfiedResult {
        match self {
            Self::Full(config) => evaluate_with(tree, config, scripts),
            Self::Partial(config) => config.evaluate(tree, scripts),
            Self::Unconfigured => evaluate_with(tree, &Undecided, scripts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::version::{Version, VersionRequirement};
    use crate::logic::satisfied::SatisfiedResult::{Maybe, No, Yes};
    use crate::logic::term::{ParamPredicate, Term};
    use std::sync::Arc;

    fn ext(name: &str, major: u32) -> ExtensionTerm {
        ExtensionTerm::new(name, Version::new(major, 0, 0))
    }

    #[test]
    fn test_full_config() {
        let config = FullConfig::new([ext("A", 1)]).with_param("XLEN", ParamValue::Int(64));
        assert_eq!(config.extension(&ext("A", 1)), Yes);
        assert_eq!(config.extension(&ext("A", 2)), No);
        let xlen64 = ParameterTerm::new("XLEN", ParamPredicate::Equal(ParamValue::Int(64)));
        let vlen = ParameterTerm::new("VLEN", ParamPredicate::GreaterThan(0));
        assert_eq!(config.parameter(&xlen64), Yes);
        assert_eq!(config.parameter(&vlen), No);
    }

    #[test]
    fn test_partial_config() {
        let HwConfig::Partial(config) = HwConfig::from_yaml_str(
            r#"
type: partially_configured
mandatory_extensions:
  - { name: A, version: "= 1.0.0" }
  - { name: B, version: ">= 1.0" }
prohibited_extensions:
  - { name: C }
params: { XLEN: 32 }
"#,
        )
        .unwrap() else {
            panic!("expected a partial configuration");
        };

        assert!(config.is_mandatory(&ext("A", 1)));
        assert!(!config.is_possible(&ext("A", 2)));
        // a range keeps the version open
        assert!(!config.is_mandatory(&ext("B", 2)));
        assert!(config.is_possible(&ext("B", 2)));
        assert!(!config.is_possible(&ext("C", 1)));
        assert!(config.is_possible(&ext("D", 1)));

        let hw = HwConfig::Partial(config);
        let xlen = LogicNode::term(Arc::new(Term::parameter("XLEN", ParamPredicate::LessThan(64))));
        let vlen = LogicNode::term(Arc::new(Term::parameter("VLEN", ParamPredicate::LessThan(64))));
        assert_eq!(hw.evaluate(&xlen, None), Yes);
        assert_eq!(hw.evaluate(&vlen, None), Maybe);
    }

    #[test]
    fn test_partial_config_two_passes() {
        let b = || LogicNode::term(Arc::new(Term::Extension(ext("B", 1))));
        let open = HwConfig::Partial(PartialConfig::default());
        assert_eq!(open.evaluate(&b(), None), Maybe);
        assert_eq!(open.evaluate(&LogicNode::not(b()), None), Yes);
        assert_eq!(open.evaluate(&LogicNode::any_of(vec![b(), LogicNode::not(b())]), None), Yes);
        assert_eq!(open.evaluate(&LogicNode::all_of(vec![b(), LogicNode::not(b())]), None), No);

        let required = HwConfig::Partial(PartialConfig {
            mandatory_extensions: vec![ExtensionRequirement::new("B", VersionRequirement::exact(Version::new(1, 0, 0)))],
            ..PartialConfig::default()
        });
        assert_eq!(required.evaluate(&b(), None), Yes);
        assert_eq!(required.evaluate(&LogicNode::not(b()), None), No);
    }

    #[test]
    fn test_closed_partial_config() {
        let config = PartialConfig {
            additional_extensions: false,
            ..PartialConfig::default()
        };
        assert!(!config.is_possible(&ext("D", 1)));
        let d = LogicNode::term(Arc::new(Term::Extension(ext("D", 1))));
        assert_eq!(config.evaluate(&d, None), No);
    }

    #[test]
    fn test_config_documents() {
        let full = HwConfig::from_yaml_str(
            "type: fully_configured\nimplemented_extensions:\n  - { name: A, version: \"1.0.0\" }\n",
        )
        .unwrap();
        assert_eq!(full, HwConfig::Full(FullConfig::new([ext("A", 1)])));

        let a = LogicNode::term(Arc::new(Term::Extension(ext("A", 1))));
        assert_eq!(HwConfig::from_yaml_str("type: unconfigured").unwrap(), HwConfig::Unconfigured);
        assert_eq!(HwConfig::Unconfigured.evaluate(&LogicNode::not(a), None), Maybe);
        assert!(HwConfig::from_yaml_str("type: sideways").is_err());
    }

    #[test]
    fn test_implied_closure() {
        let db = ArchDb::from_yaml_str(
            r#"
kind: extension
name: A
versions:
  - version: "1.0.0"
    implies:
      allOf:
        - extension: { name: B, version: "= 2.0.0" }
        - if: { param: { name: XLEN, equal: 64 } }
          then: { extension: { name: D, version: "= 1.0.0" } }
---
kind: extension
name: B
versions:
  - version: "2.0.0"
    implies: { extension: { name: C, version: "= 1.0.0" } }
---
kind: extension
name: C
versions: [ { version: "1.0.0" } ]
---
kind: extension
name: D
versions: [ { version: "1.0.0" } ]
---
kind: parameter
name: XLEN
"#,
        )
        .unwrap();

        let closed = FullConfig::new([ext("A", 1)]).with_implied_closure(&db).unwrap();
        let names: Vec<String> = closed.implemented_extensions.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["A@1.0.0", "B@2.0.0", "C@1.0.0"]);

        let closed = FullConfig::new([ext("A", 1)])
            .with_param("XLEN", ParamValue::Int(64))
            .with_implied_closure(&db)
            .unwrap();
        assert!(closed.implemented_extensions.contains(&ext("D", 1)));
    }
}
