#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Turns [`ConditionSpec`]s into [`LogicNode`]s.
//!
//! Names are resolved against a [`ResolveContext`]. An extension requirement
//! becomes the disjunction of the versions that satisfy it. In expanding
//! mode (the default) each version also carries its implications and the
//! extension's conflicts; see [`ConditionBuilder::build_extension`].

use crate::arch::database::ResolveContext;
use crate::arch::extension::ExtensionRequirement;
use crate::condition::ConditionError;
use crate::condition::spec::{ConditionSpec, ParamRequirement};
use crate::logic::node::LogicNode;
use crate::logic::term::{ExtensionTerm, Term};
use itertools::Itertools;
use log::trace;
use rustc_hash::FxHashMap;

/// Produces the logic tree of an opaque scripted predicate.
pub trait ScriptLowering {
    /// The tree standing for the script `source`.
    ///
    /// # Errors
    ///
    /// Implementation defined; typically a malformed script.
    fn lower(&self, source: &str, ctx: &dyn ResolveContext) -> Result<LogicNode, ConditionError>;
}

/// Lowers every script to a single opaque term, so scripts with the same
/// source share a solver variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueScripts;

impl ScriptLowering for OpaqueScripts {
    fn lower(&self, source: &str, ctx: &dyn ResolveContext) -> Result<LogicNode, ConditionError> {
        Ok(LogicNode::term(ctx.intern(Term::script(source))))
    }
}

/// Builds [`ConditionSpec`]s against one context, reusing expansions.
pub struct ConditionBuilder<'a> {
    pub(super) ctx: &'a dyn ResolveContext,
    pub(super) scripts: &'a dyn ScriptLowering,
    pub(super) expand: bool,
    /// Extension versions being expanded, outermost first.
    pub(super) path: Vec<ExtensionTerm>,
    pub(super) memo: FxHashMap<ExtensionTerm, LogicNode>,
}

impl<'a> ConditionBuilder<'a> {
    /// An expanding builder with opaque script lowering.
    #[must_use]
    pub fn new(ctx: &'a dyn ResolveContext) -> Self {
        Self {
            ctx,
            scripts: &OpaqueScripts,
            expand: true,
            path: Vec::new(),
            memo: FxHashMap::default(),
        }
    }

    /// Switches off implication expansion, giving the tree as written.
    #[must_use]
    pub fn minimal(self) -> Self {
        self.expanding(false)
    }

    /// Switches implication expansion on or off.
    #[must_use]
    pub fn expanding(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    /// Replaces the lowering of scripted predicates.
    #[must_use]
    pub fn with_scripts(mut self, scripts: &'a dyn ScriptLowering) -> Self {
        self.scripts = scripts;
        self
    }

    /// Builds `spec` into a tree.
    ///
    /// # Errors
    ///
    /// Unknown extension or parameter names, and implication cycles.
    pub fn build(&mut self, spec: &ConditionSpec) -> Result<LogicNode, ConditionError> {
        Ok(match spec {
            ConditionSpec::Constant(value) => LogicNode::constant(*value),
            ConditionSpec::AllOf(items) => LogicNode::all_of(self.build_all(items)?),
            ConditionSpec::AnyOf(items) => LogicNode::any_of(self.build_all(items)?),
            ConditionSpec::OneOf(items) => LogicNode::one_of(self.build_all(items)?),
            ConditionSpec::NoneOf(items) => LogicNode::none_of(self.build_all(items)?),
            ConditionSpec::Not(inner) => LogicNode::not(self.build(inner)?),
            ConditionSpec::IfThen { condition, then } => {
                LogicNode::implies(self.build(condition)?, self.build(then)?)
            }
            ConditionSpec::Extension(req) => self.build_extension(req)?,
            ConditionSpec::Param(req) => self.build_param(req)?,
            ConditionSpec::Script(source) => self.scripts.lower(source, self.ctx)?,
        })
    }

    fn build_all(&mut self, items: &[ConditionSpec]) -> Result<Vec<LogicNode>, ConditionError> {
        items.iter().map(|item| self.build(item)).collect()
    }

    /// The versions satisfying `req`: one term, or the `Or` of several.
    ///
    /// When expanding, each version is replaced by its expansion (see
    /// [`ConditionBuilder::expand_version`]) and the negated conflicts of the
    /// extension are conjoined to the whole.
    ///
    /// # Errors
    ///
    /// [`ConditionError::UnknownExtension`], and any error from expansion.
    pub fn build_extension(&mut self, req: &ExtensionRequirement) -> Result<LogicNode, ConditionError> {
        let ctx = self.ctx;
        let extension = ctx
            .extension(&req.name)
            .ok_or_else(|| ConditionError::UnknownExtension(req.name.clone()))?;
        let versions = req.satisfying_versions(extension);
        trace!(
            "{req} resolves to [{}]",
            versions.iter().map(|v| v.version).join(", ")
        );

        let mut alternatives = Vec::with_capacity(versions.len());
        for version in versions {
            alternatives.push(if self.expand {
                self.expand_version(extension, version)?
            } else {
                LogicNode::term(ctx.intern(Term::extension(&extension.name, version.version)))
            });
        }
        let selected = single_or_any(alternatives);

        match (&extension.conflicts, self.expand) {
            (Some(conflicts), true) => Ok(LogicNode::all_of(vec![
                selected,
                LogicNode::not(self.build_unexpanded(conflicts)?),
            ])),
            _ => Ok(selected),
        }
    }

    /// The parameter predicate, conjoined with the parameter's `defined_by`
    /// condition when expanding.
    ///
    /// # Errors
    ///
    /// [`ConditionError::UnknownParameter`], and any error building
    /// `defined_by`.
    pub fn build_param(&mut self, req: &ParamRequirement) -> Result<LogicNode, ConditionError> {
        let ctx = self.ctx;
        let parameter = ctx
            .parameter(&req.name)
            .ok_or_else(|| ConditionError::UnknownParameter(req.name.clone()))?;
        let leaf = LogicNode::term(ctx.intern(Term::parameter(&req.name, req.predicate.clone())));

        match (&parameter.defined_by, self.expand) {
            (Some(defined_by), true) => Ok(LogicNode::all_of(vec![
                self.build_unexpanded(defined_by)?,
                leaf,
            ])),
            _ => Ok(leaf),
        }
    }

    /// Builds `spec` as written, without expansion.
    pub(super) fn build_unexpanded(&self, spec: &ConditionSpec) -> Result<LogicNode, ConditionError> {
        ConditionBuilder::new(self.ctx)
            .with_scripts(self.scripts)
            .minimal()
            .build(spec)
    }
}

fn single_or_any(mut nodes: Vec<LogicNode>) -> LogicNode {
    if nodes.len() == 1 {
        nodes.swap_remove(0)
    } else {
        LogicNode::any_of(nodes)
    }
}
