#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conditions: declarative requirement expressions bound to an architecture
//! database.
//!
//! A [`Condition`] keeps the spec it was made from and builds its logic tree
//! on first use. Trees are cached per condition, once in expanded and once in
//! minimal form. The caches are write-once: concurrent first calls may both
//! build, but only one result is ever stored and observed.

/// Building logic trees from condition specs.
pub mod builder;
/// Implication expansion.
pub mod expand;
/// The condition grammar.
pub mod spec;

use crate::arch::config::HwConfig;
use crate::arch::database::ArchDb;
use crate::arch::extension::ExtensionRequirement;
use crate::arch::version::VersionError;
use crate::condition::builder::{ConditionBuilder, OpaqueScripts, ScriptLowering};
use crate::condition::spec::ConditionSpec;
use crate::logic::encode::{Model, SolveError};
use crate::logic::eval::ScriptEvaluator;
use crate::logic::node::LogicNode;
use crate::logic::satisfied::SatisfiedResult;
use crate::logic::term::ExtensionTerm;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Failure to build or decide a condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    /// The value does not fit the grammar.
    #[error("invalid condition (keys: {}): {reason}", keys.join(", "))]
    Grammar {
        /// Keys of the offending mapping.
        keys: Vec<String>,
        /// What is wrong with it.
        reason: String,
    },
    /// No extension by that name.
    #[error("unknown extension '{0}'")]
    UnknownExtension(String),
    /// No parameter by that name.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    /// An extension version implies itself.
    #[error("implication cycle: {}", path.join(" -> "))]
    ImplicationCycle {
        /// The versions on the cycle, starting and ending with the same one.
        path: Vec<String>,
    },
    /// A malformed version requirement.
    #[error(transparent)]
    Version(#[from] VersionError),
    /// The solver could not decide.
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// What a condition is about, decided from the shape of its spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKind {
    /// `true` or `false`.
    Constant(bool),
    /// A single extension requirement.
    Extension(ExtensionRequirement),
    /// Connectives over parameter requirements only.
    Parameter(ConditionSpec),
    /// A single scripted predicate.
    Script(String),
    /// Anything else.
    General(ConditionSpec),
}

impl ConditionKind {
    fn classify(spec: ConditionSpec) -> Self {
        match spec {
            ConditionSpec::Constant(value) => Self::Constant(value),
            ConditionSpec::Extension(req) => Self::Extension(req),
            ConditionSpec::Script(source) => Self::Script(source),
            spec if only_params(&spec) => Self::Parameter(spec),
            spec => Self::General(spec),
        }
    }

    /// The spec the condition was classified from.
    #[must_use]
    pub fn spec(&self) -> ConditionSpec {
        match self {
            Self::Constant(value) => ConditionSpec::Constant(*value),
            Self::Extension(req) => ConditionSpec::Extension(req.clone()),
            Self::Script(source) => ConditionSpec::Script(source.clone()),
            Self::Parameter(spec) | Self::General(spec) => spec.clone(),
        }
    }
}

fn only_params(spec: &ConditionSpec) -> bool {
    match spec {
        ConditionSpec::Param(_) => true,
        ConditionSpec::AllOf(items)
        | ConditionSpec::AnyOf(items)
        | ConditionSpec::OneOf(items)
        | ConditionSpec::NoneOf(items) => !items.is_empty() && items.iter().all(only_params),
        ConditionSpec::Not(inner) => only_params(inner),
        ConditionSpec::IfThen { condition, then } => only_params(condition) && only_params(then),
        ConditionSpec::Constant(_) | ConditionSpec::Extension(_) | ConditionSpec::Script(_) => false,
    }
}

type TreeCache = OnceLock<Result<LogicNode, ConditionError>>;

/// A condition over a database, with its trees built on demand.
pub struct Condition {
    kind: ConditionKind,
    db: Arc<ArchDb>,
    scripts: Arc<dyn ScriptLowering + Send + Sync>,
    expanded: TreeCache,
    minimal: TreeCache,
    satisfiable: OnceLock<bool>,
}

impl Condition {
    /// A condition over `db`. Nothing is resolved until a tree is needed.
    #[must_use]
    pub fn new(spec: ConditionSpec, db: Arc<ArchDb>) -> Self {
        Self {
            kind: ConditionKind::classify(spec),
            db,
            scripts: Arc::new(OpaqueScripts),
            expanded: OnceLock::new(),
            minimal: OnceLock::new(),
            satisfiable: OnceLock::new(),
        }
    }

    /// # Errors
    ///
    /// [`ConditionError::Grammar`] or [`ConditionError::Version`] for
    /// malformed specs.
    pub fn from_value(value: &serde_json::Value, db: Arc<ArchDb>) -> Result<Self, ConditionError> {
        Ok(Self::new(ConditionSpec::parse(value)?, db))
    }

    /// Parses a condition written as YAML (or JSON).
    ///
    /// # Errors
    ///
    /// As for [`Condition::from_value`]; unparsable text is a grammar error.
    pub fn from_yaml_str(text: &str, db: Arc<ArchDb>) -> Result<Self, ConditionError> {
        let value: serde_json::Value =
            serde_yaml::from_str(text).map_err(|e| ConditionError::Grammar {
                keys: Vec::new(),
                reason: e.to_string(),
            })?;
        Self::from_value(&value, db)
    }

    /// The condition every configuration satisfies.
    #[must_use]
    pub fn always_true(db: Arc<ArchDb>) -> Self {
        Self::new(ConditionSpec::Constant(true), db)
    }

    /// The condition no configuration satisfies.
    #[must_use]
    pub fn always_false(db: Arc<ArchDb>) -> Self {
        Self::new(ConditionSpec::Constant(false), db)
    }

    /// Replaces the lowering of scripted predicates. Only affects trees not
    /// built yet, so call it right after construction.
    #[must_use]
    pub fn with_script_lowering(mut self, scripts: Arc<dyn ScriptLowering + Send + Sync>) -> Self {
        self.scripts = scripts;
        self
    }

    /// What the condition is about.
    #[must_use]
    pub const fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    /// The database names are resolved in.
    #[must_use]
    pub const fn db(&self) -> &Arc<ArchDb> {
        &self.db
    }

    #[must_use]
    const fn constant(&self) -> Option<bool> {
        match self.kind {
            ConditionKind::Constant(value) => Some(value),
            _ => None,
        }
    }

    fn build(&self, expand: bool) -> Result<LogicNode, ConditionError> {
        let mut builder = ConditionBuilder::new(&*self.db)
            .with_scripts(&*self.scripts)
            .expanding(expand);
        match &self.kind {
            ConditionKind::Constant(value) => Ok(LogicNode::constant(*value)),
            ConditionKind::Extension(req) => builder.build_extension(req),
            ConditionKind::Script(source) => builder.build(&ConditionSpec::Script(source.clone())),
            ConditionKind::Parameter(spec) | ConditionKind::General(spec) => builder.build(spec),
        }
    }

    /// The logic tree, with implications and conflicts folded in when
    /// `expand` is set.
    ///
    /// # Errors
    ///
    /// Unresolvable names and implication cycles. Errors are cached like
    /// trees, so every call reports the same one.
    pub fn to_logic_tree(&self, expand: bool) -> Result<&LogicNode, ConditionError> {
        let cache = if expand { &self.expanded } else { &self.minimal };
        let cached = match cache.get() {
            Some(cached) => cached,
            None => {
                let built = self.build(expand);
                cache.get_or_init(|| built)
            }
        };
        cached.as_ref().map_err(Clone::clone)
    }

    /// Evaluates the expanded tree against `config`.
    ///
    /// # Errors
    ///
    /// Any error building the tree.
    pub fn satisfied_by(&self, config: &HwConfig) -> Result<SatisfiedResult, ConditionError> {
        Ok(config.evaluate(self.to_logic_tree(true)?, None))
    }

    /// Like [`Condition::satisfied_by`], deciding script leaves with `scripts`.
    ///
    /// # Errors
    ///
    /// Any error building the tree.
    pub fn satisfied_by_with_scripts(
        &self,
        config: &HwConfig,
        scripts: &dyn ScriptEvaluator,
    ) -> Result<SatisfiedResult, ConditionError> {
        Ok(config.evaluate(self.to_logic_tree(true)?, Some(scripts)))
    }

    /// Evaluates against an explicit set of implemented extension versions.
    ///
    /// # Errors
    ///
    /// Any error building the tree.
    pub fn satisfied_by_ext_set(
        &self,
        implemented: &BTreeSet<ExtensionTerm>,
    ) -> Result<SatisfiedResult, ConditionError> {
        Ok(self.to_logic_tree(true)?.evaluate_extensions(implemented))
    }

    /// `Yes` or `Maybe` under `config`.
    ///
    /// # Errors
    ///
    /// Any error building the tree.
    pub fn could_be_satisfied_by(&self, config: &HwConfig) -> Result<bool, ConditionError> {
        self.satisfied_by(config).map(SatisfiedResult::could_be_true)
    }

    /// Whether any configuration satisfies the condition. Decided answers are
    /// cached.
    ///
    /// # Errors
    ///
    /// Any error building the tree, and [`ConditionError::Solve`] if the
    /// solver runs out of budget.
    pub fn satisfiable(&self) -> Result<bool, ConditionError> {
        if let Some(constant) = self.constant() {
            return Ok(constant);
        }
        if let Some(&known) = self.satisfiable.get() {
            return Ok(known);
        }
        let answer = self
            .to_logic_tree(true)?
            .satisfiable(self.db.solver_config())?;
        Ok(*self.satisfiable.get_or_init(|| answer))
    }

    /// Whether both conditions can hold at once. An always-true condition is
    /// compatible with everything and an always-false one with nothing.
    ///
    /// # Errors
    ///
    /// As for [`Condition::satisfiable`].
    pub fn compatible(&self, other: &Self) -> Result<bool, ConditionError> {
        match (self.constant(), other.constant()) {
            (Some(false), _) | (_, Some(false)) => Ok(false),
            (Some(true), _) | (_, Some(true)) => Ok(true),
            _ => Ok(self
                .to_logic_tree(true)?
                .compatible(other.to_logic_tree(true)?, self.db.solver_config())?),
        }
    }

    /// Whether both conditions hold in exactly the same configurations. A
    /// constant is equivalent to the conditions that are valid (always
    /// true) or unsatisfiable (always false).
    ///
    /// # Errors
    ///
    /// As for [`Condition::satisfiable`].
    pub fn equivalent(&self, other: &Self) -> Result<bool, ConditionError> {
        match (self.constant(), other.constant()) {
            (Some(a), Some(b)) => Ok(a == b),
            (Some(true), None) => other.valid(),
            (None, Some(true)) => self.valid(),
            (Some(false), None) => other.satisfiable().map(|sat| !sat),
            (None, Some(false)) => self.satisfiable().map(|sat| !sat),
            (None, None) => Ok(self
                .to_logic_tree(true)?
                .equivalent(other.to_logic_tree(true)?, self.db.solver_config())?),
        }
    }

    /// Whether every configuration satisfies the condition.
    fn valid(&self) -> Result<bool, ConditionError> {
        let negated = LogicNode::not(self.to_logic_tree(true)?.clone());
        Ok(!negated.satisfiable(self.db.solver_config())?)
    }

    /// A configuration of the condition's terms that satisfies it.
    ///
    /// # Errors
    ///
    /// As for [`Condition::satisfiable`].
    pub fn find_model(&self) -> Result<Option<Model>, ConditionError> {
        Ok(self
            .to_logic_tree(true)?
            .find_model(self.db.solver_config())?)
    }

    /// Serializes the (optionally expanded) tree back into the grammar.
    /// Constant conditions take the canonical `{if: true, then: <bool>}` form.
    ///
    /// # Errors
    ///
    /// Any error building the tree.
    pub fn to_value(&self, expand: bool) -> Result<serde_json::Value, ConditionError> {
        Ok(ConditionSpec::from_logic(self.to_logic_tree(expand)?).to_canonical_value())
    }

    /// The tree as a side-effect-free predicate expression.
    ///
    /// # Errors
    ///
    /// Any error building the tree.
    pub fn to_idl(&self, expand: bool) -> Result<String, ConditionError> {
        Ok(self.to_logic_tree(expand)?.to_idl())
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("kind", &self.kind)
            .field("expanded", &self.expanded.get())
            .field("minimal", &self.minimal.get())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.spec())
    }
}
