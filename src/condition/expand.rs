//! Implication expansion of single extension versions.

use crate::arch::extension::{Extension, ExtensionVersion};
use crate::condition::ConditionError;
use crate::condition::builder::ConditionBuilder;
use crate::logic::node::LogicNode;
use crate::logic::term::{ExtensionTerm, Term};
use log::debug;

impl ConditionBuilder<'_> {
    /// `version` selected, together with everything it implies:
    ///
    /// `TERM(v) && requires(v) && implied_1 && (guard_2 -> implied_2) && ...`
    ///
    /// Implied requirements are themselves built with expansion; `requires`
    /// and guards are built as written. Completed expansions are reused for
    /// the lifetime of the builder.
    ///
    /// # Errors
    ///
    /// [`ConditionError::ImplicationCycle`] when `version` transitively
    /// implies itself, and any error resolving what it implies.
    pub fn expand_version(
        &mut self,
        extension: &Extension,
        version: &ExtensionVersion,
    ) -> Result<LogicNode, ConditionError> {
        let key = ExtensionTerm::new(extension.name.clone(), version.version);
        if let Some(done) = self.memo.get(&key) {
            return Ok(done.clone());
        }

        if let Some(start) = self.path.iter().position(|t| *t == key) {
            let path: Vec<String> = self.path[start..]
                .iter()
                .chain(std::iter::once(&key))
                .map(ToString::to_string)
                .collect();
            debug!("implication cycle: {}", path.join(" -> "));
            return Err(ConditionError::ImplicationCycle { path });
        }

        self.path.push(key.clone());
        let expanded = self.expand_implications(&key, version);
        self.path.pop();

        let expanded = expanded?;
        self.memo.insert(key, expanded.clone());
        Ok(expanded)
    }

    fn expand_implications(
        &mut self,
        key: &ExtensionTerm,
        version: &ExtensionVersion,
    ) -> Result<LogicNode, ConditionError> {
        let mut parts = vec![LogicNode::term(self.ctx.intern(Term::Extension(key.clone())))];

        if let Some(requires) = &version.requires {
            parts.push(self.build_unexpanded(requires)?);
        }

        for entry in version.implies.iter() {
            let implied = self.build_extension(&entry.requirement)?;
            parts.push(match &entry.guard {
                None => implied,
                Some(guard) => LogicNode::implies(self.build_unexpanded(guard)?, implied),
            });
        }

        Ok(if parts.len() == 1 {
            parts.swap_remove(0)
        } else {
            LogicNode::all_of(parts)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::arch::database::ArchDb;
    use crate::arch::extension::ExtensionRequirement;
    use crate::arch::version::VersionRequirement;
    use crate::condition::ConditionError;
    use crate::condition::builder::ConditionBuilder;
    use crate::logic::node::LogicNode;

    fn build(db: &ArchDb, name: &str, expand: bool) -> Result<LogicNode, ConditionError> {
        ConditionBuilder::new(db)
            .expanding(expand)
            .build_extension(&ExtensionRequirement::new(name, VersionRequirement::any()))
    }

    #[test]
    fn test_plain_version_is_a_term() {
        let db = ArchDb::from_yaml_str("kind: extension\nname: A\nversions: [ { version: 1.0.0 } ]\n").unwrap();
        assert_eq!(build(&db, "A", true).unwrap().to_string(), "A@1.0.0");
    }

    #[test]
    fn test_expansion_shape() {
        let db = ArchDb::from_yaml_str(
            r#"
kind: extension
name: A
versions:
  - version: "1.0.0"
    implies:
      allOf:
        - extension: { name: B, version: "= 1.0.0" }
        - if: { extension: { name: C } }
          then: { extension: { name: D, version: "= 1.0.0" } }
  - version: "2.0.0"
conflicts: { extension: { name: C } }
---
kind: extension
name: B
versions: [ { version: "1.0.0" } ]
---
kind: extension
name: C
versions: [ { version: "1.0.0" } ]
---
kind: extension
name: D
versions: [ { version: "1.0.0" } ]
"#,
        )
        .unwrap();

        assert_eq!(
            build(&db, "A", true).unwrap().to_string(),
            "(((A@1.0.0 && B@1.0.0 && (C@1.0.0 -> D@1.0.0)) || A@2.0.0) && !C@1.0.0)"
        );
        assert_eq!(build(&db, "A", false).unwrap().to_string(), "(A@1.0.0 || A@2.0.0)");
    }

    #[test]
    fn test_cycle_is_detected() {
        let db = ArchDb::from_yaml_str(
            r#"
kind: extension
name: A
versions:
  - version: "1.0.0"
    implies: { extension: { name: B, version: "= 1.0.0" } }
---
kind: extension
name: B
versions:
  - version: "1.0.0"
    implies: { extension: { name: A, version: "= 1.0.0" } }
"#,
        )
        .unwrap();

        match build(&db, "A", true) {
            Err(ConditionError::ImplicationCycle { path }) => {
                assert_eq!(path, vec!["A@1.0.0", "B@1.0.0", "A@1.0.0"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
        assert!(build(&db, "A", false).is_ok());
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let db = ArchDb::from_yaml_str(
            r#"
kind: extension
name: A
versions:
  - version: "1.0.0"
    implies:
      allOf:
        - extension: { name: B, version: "= 1.0.0" }
        - extension: { name: C, version: "= 1.0.0" }
---
kind: extension
name: B
versions:
  - version: "1.0.0"
    implies: { extension: { name: D, version: "= 1.0.0" } }
---
kind: extension
name: C
versions:
  - version: "1.0.0"
    implies: { extension: { name: D, version: "= 1.0.0" } }
---
kind: extension
name: D
versions: [ { version: "1.0.0" } ]
"#,
        )
        .unwrap();

        let tree = build(&db, "A", true).unwrap();
        assert_eq!(
            tree.to_string(),
            "(A@1.0.0 && (B@1.0.0 && D@1.0.0) && (C@1.0.0 && D@1.0.0))"
        );
    }
}
