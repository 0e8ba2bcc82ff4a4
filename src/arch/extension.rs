#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Extensions, their versions, and requirements on them.

use crate::arch::version::{Version, VersionRequirement};
use crate::condition::ConditionError;
use crate::condition::spec::ConditionSpec;
use crate::logic::term::ExtensionTerm;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An extension name with a constraint on its version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionRequirement {
    /// Extension name.
    pub name: String,
    /// Accepted versions.
    #[serde(rename = "version", default, skip_serializing_if = "VersionRequirement::is_any")]
    pub requirement: VersionRequirement,
}

impl ExtensionRequirement {
    /// A requirement on extension `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, requirement: VersionRequirement) -> Self {
        Self {
            name: name.into(),
            requirement,
        }
    }

    /// The versions of `extension` this requirement accepts, in declaration order.
    #[must_use]
    pub fn satisfying_versions<'a>(&self, extension: &'a Extension) -> Vec<&'a ExtensionVersion> {
        extension
            .versions
            .iter()
            .filter(|v| self.requirement.matches(&v.version))
            .collect()
    }

    /// The single version this requirement pins, as a term.
    #[must_use]
    pub fn exact_term(&self) -> Option<ExtensionTerm> {
        self.requirement
            .exact_version()
            .map(|version| ExtensionTerm::new(self.name.clone(), version))
    }
}

impl fmt::Display for ExtensionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requirement.is_any() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} {}", self.name, self.requirement)
        }
    }
}

/// One implied requirement, applying only when `guard` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedRequirement {
    /// The implied requirement.
    pub requirement: ExtensionRequirement,
    /// Condition under which it is implied. `None` means always.
    pub guard: Option<ConditionSpec>,
}

/// The requirements an extension version implies, read from an `allOf` of
/// `extension` leaves, each optionally wrapped in `if`/`then`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ConditionSpec", into = "ConditionSpec")]
pub struct ExtensionRequirementList(Vec<GuardedRequirement>);

impl ExtensionRequirementList {
    /// A list of `entries`.
    #[must_use]
    pub const fn new(entries: Vec<GuardedRequirement>) -> Self {
        Self(entries)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &GuardedRequirement> {
        self.0.iter()
    }

    /// Whether nothing is implied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The entries that pin exactly one version with `=`, with their guards.
    /// Range requirements do not name a version to add and are left out.
    #[must_use]
    pub fn implied_extension_versions(&self) -> Vec<(ExtensionTerm, Option<&ConditionSpec>)> {
        self.0
            .iter()
            .filter_map(|entry| {
                entry
                    .requirement
                    .exact_term()
                    .map(|term| (term, entry.guard.as_ref()))
            })
            .collect()
    }

    fn collect(
        spec: ConditionSpec,
        guard: Option<ConditionSpec>,
        out: &mut Vec<GuardedRequirement>,
    ) -> Result<(), ConditionError> {
        match spec {
            ConditionSpec::Extension(requirement) => {
                out.push(GuardedRequirement { requirement, guard });
                Ok(())
            }
            ConditionSpec::AllOf(items) => items
                .into_iter()
                .try_for_each(|item| Self::collect(item, guard.clone(), out)),
            ConditionSpec::IfThen { condition, then } => {
                let guard = match guard {
                    None => *condition,
                    Some(outer) => ConditionSpec::AllOf(vec![outer, *condition]),
                };
                Self::collect(*then, Some(guard), out)
            }
            ConditionSpec::Constant(true) => Ok(()),
            other => Err(ConditionError::Grammar {
                keys: Vec::new(),
                reason: format!(
                    "implications must be an allOf of extension requirements, found {other}"
                ),
            }),
        }
    }
}

impl TryFrom<ConditionSpec> for ExtensionRequirementList {
    type Error = ConditionError;

    fn try_from(spec: ConditionSpec) -> Result<Self, Self::Error> {
        let mut entries = Vec::new();
        Self::collect(spec, None, &mut entries)?;
        Ok(Self(entries))
    }
}

impl From<ExtensionRequirementList> for ConditionSpec {
    fn from(list: ExtensionRequirementList) -> Self {
        Self::AllOf(
            list.0
                .into_iter()
                .map(|entry| {
                    let leaf = Self::Extension(entry.requirement);
                    match entry.guard {
                        None => leaf,
                        Some(guard) => Self::IfThen {
                            condition: Box::new(guard),
                            then: Box::new(leaf),
                        },
                    }
                })
                .collect(),
        )
    }
}

/// One released version of an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionVersion {
    /// The version number.
    pub version: Version,
    /// Requirements implementing this version brings along.
    #[serde(default, skip_serializing_if = "ExtensionRequirementList::is_empty")]
    pub implies: ExtensionRequirementList,
    /// Condition the rest of the architecture must meet for this version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<ConditionSpec>,
}

impl ExtensionVersion {
    /// A version implying and requiring nothing.
    #[must_use]
    pub fn new(version: Version) -> Self {
        Self {
            version,
            implies: ExtensionRequirementList::default(),
            requires: None,
        }
    }
}

/// An ISA extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Extension name, such as `Zba`.
    pub name: String,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    /// Known versions, in declaration order.
    pub versions: Vec<ExtensionVersion>,
    /// Condition under which this extension cannot be implemented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<ConditionSpec>,
}

impl Extension {
    /// The version numbered `version`.
    #[must_use]
    pub fn version(&self, version: &Version) -> Option<&ExtensionVersion> {
        self.versions.iter().find(|v| &v.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENSION: &str = r#"
name: A
long_name: Example extension
versions:
  - version: "1.0.0"
    implies:
      allOf:
        - extension: { name: B, version: "= 2.0.0" }
        - extension: { name: C, version: ">= 1.0" }
        - if: { param: { name: XLEN, equal: 64 } }
          then: { extension: { name: D, version: "1.0" } }
  - version: "2.0.0"
conflicts:
  extension: { name: Z }
"#;

    #[test]
    fn test_deserialize_extension() {
        let ext: Extension = serde_yaml::from_str(EXTENSION).unwrap();
        assert_eq!(ext.versions.len(), 2);
        assert!(ext.conflicts.is_some());
        assert!(ext.versions[1].implies.is_empty());

        let v1 = ext.version(&Version::new(1, 0, 0)).unwrap();
        assert_eq!(v1.implies.len(), 3);

        let implied = v1.implies.implied_extension_versions();
        let names: Vec<String> = implied.iter().map(|(t, _)| t.to_string()).collect();
        assert_eq!(names, vec!["B@2.0.0", "D@1.0.0"]);
        assert!(implied[0].1.is_none());
        assert!(implied[1].1.is_some());
    }

    #[test]
    fn test_satisfying_versions() {
        let ext: Extension = serde_yaml::from_str(EXTENSION).unwrap();
        let any = ExtensionRequirement::new("A", VersionRequirement::any());
        assert_eq!(any.satisfying_versions(&ext).len(), 2);
        let ge2 = ExtensionRequirement::new("A", ">= 2.0".parse().unwrap());
        let versions: Vec<Version> = ge2.satisfying_versions(&ext).iter().map(|v| v.version).collect();
        assert_eq!(versions, vec![Version::new(2, 0, 0)]);
        assert_eq!(ge2.to_string(), "A >= 2.0.0");
    }

    #[test]
    fn test_implies_must_be_extension_requirements() {
        let spec = ConditionSpec::AnyOf(vec![ConditionSpec::Constant(true)]);
        assert!(ExtensionRequirementList::try_from(spec).is_err());
    }

    #[test]
    fn test_list_round_trips_through_spec() {
        let ext: Extension = serde_yaml::from_str(EXTENSION).unwrap();
        let list = ext.versions[0].implies.clone();
        let again = ExtensionRequirementList::try_from(ConditionSpec::from(list.clone())).unwrap();
        assert_eq!(again, list);
    }
}
