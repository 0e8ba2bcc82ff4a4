#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The architecture database conditions are resolved against.
//!
//! Only the parts conditions need are modeled: extensions with their
//! versions, implications and conflicts, and parameters with the condition
//! that defines them. Documents are YAML, tagged with `kind`:
//!
//! ```yaml
//! kind: extension
//! name: Zba
//! versions:
//!   - version: "1.0.0"
//! ---
//! kind: parameter
//! name: XLEN
//! ```

use crate::arch::extension::Extension;
use crate::arch::parameter::Parameter;
use crate::logic::term::{Term, TermInterner};
use crate::sat::configs::SolverConfig;
use log::{debug, info};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

/// Failure to load database documents.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// A directory could not be listed.
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        /// The directory walked.
        path: PathBuf,
        /// The underlying error.
        source: walkdir::Error,
    },
    /// A document is not valid YAML or does not fit the schema.
    #[error("invalid document in {origin}: {source}")]
    Yaml {
        /// Where the document came from.
        origin: String,
        /// The underlying error.
        source: serde_yaml::Error,
    },
    /// Two definitions share a name.
    #[error("duplicate {kind} '{name}' in {origin}")]
    Duplicate {
        /// `extension` or `parameter`.
        kind: &'static str,
        /// The repeated name.
        name: String,
        /// Where the second definition came from.
        origin: String,
    },
}

/// Resolves the names a condition mentions.
pub trait ResolveContext {
    /// The extension called `name`.
    fn extension(&self, name: &str) -> Option<&Extension>;

    /// The parameter called `name`.
    fn parameter(&self, name: &str) -> Option<&Parameter>;

    /// Shares structurally equal terms.
    fn intern(&self, term: Term) -> Arc<Term> {
        Arc::new(term)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Document {
    Extension(Extension),
    Parameter(Parameter),
}

/// Extensions and parameters by name, with the solver budget and term
/// interner shared by conditions built over them.
#[derive(Debug, Default)]
pub struct ArchDb {
    extensions: BTreeMap<String, Extension>,
    parameters: BTreeMap<String, Parameter>,
    solver_config: SolverConfig,
    interner: TermInterner,
}

impl ArchDb {
    /// An empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Solver budget used by every query over conditions of this database.
    #[must_use]
    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    /// Solver budget of queries over this database.
    #[must_use]
    pub const fn solver_config(&self) -> &SolverConfig {
        &self.solver_config
    }

    /// Interner shared by every condition built here.
    #[must_use]
    pub const fn interner(&self) -> &TermInterner {
        &self.interner
    }

    /// Parses every YAML document in `text`.
    ///
    /// # Errors
    ///
    /// [`LoadError::Yaml`] for malformed documents (including invalid
    /// conditions inside them) and [`LoadError::Duplicate`] for names
    /// defined twice.
    pub fn from_yaml_str(text: &str) -> Result<Self, LoadError> {
        let mut db = Self::new();
        db.add_yaml_str(text, "<string>")?;
        Ok(db)
    }

    /// Loads every `.yaml`/`.yml` file under `dir`, in file name order.
    ///
    /// # Errors
    ///
    /// Any error from reading or parsing a file.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let mut db = Self::new();

        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|source| LoadError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e, "yaml" | "yml"));
            if !entry.file_type().is_file() || !is_yaml {
                continue;
            }

            debug!("reading {}", path.display());
            let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            db.add_yaml_str(&text, &path.display().to_string())?;
        }

        info!(
            "loaded {} extensions and {} parameters from {}",
            db.extensions.len(),
            db.parameters.len(),
            dir.display()
        );
        Ok(db)
    }

    /// Adds the documents in `text`; `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// As for [`ArchDb::from_yaml_str`].
    pub fn add_yaml_str(&mut self, text: &str, origin: &str) -> Result<(), LoadError> {
        for document in serde_yaml::Deserializer::from_str(text) {
            let document = Document::deserialize(document).map_err(|source| LoadError::Yaml {
                origin: origin.to_string(),
                source,
            })?;
            match document {
                Document::Extension(ext) => self.add_extension(ext, origin)?,
                Document::Parameter(param) => self.add_parameter(param, origin)?,
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`LoadError::Duplicate`] if the name is taken.
    pub fn add_extension(&mut self, extension: Extension, origin: &str) -> Result<(), LoadError> {
        if self.extensions.contains_key(&extension.name) {
            return Err(LoadError::Duplicate {
                kind: "extension",
                name: extension.name,
                origin: origin.to_string(),
            });
        }
        self.extensions.insert(extension.name.clone(), extension);
        Ok(())
    }

    /// # Errors
    ///
    /// [`LoadError::Duplicate`] if the name is taken.
    pub fn add_parameter(&mut self, parameter: Parameter, origin: &str) -> Result<(), LoadError> {
        if self.parameters.contains_key(&parameter.name) {
            return Err(LoadError::Duplicate {
                kind: "parameter",
                name: parameter.name,
                origin: origin.to_string(),
            });
        }
        self.parameters.insert(parameter.name.clone(), parameter);
        Ok(())
    }

    /// Extensions in name order.
    pub fn extensions(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.values()
    }

    /// Parameters in name order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }
}

impl ResolveContext for ArchDb {
    fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.get(name)
    }

    fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    fn intern(&self, term: Term) -> Arc<Term> {
        self.interner.intern(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::version::Version;

    const DB: &str = r#"
kind: extension
name: A
versions:
  - version: "1.0.0"
    implies: { extension: { name: B, version: "= 2.0.0" } }
---
kind: extension
name: B
versions:
  - version: "1.0.0"
  - version: "2.0.0"
---
kind: parameter
name: XLEN
defined_by: { extension: { name: A } }
"#;

    #[test]
    fn test_from_yaml_str() {
        let db = ArchDb::from_yaml_str(DB).unwrap();
        assert_eq!(db.extensions().count(), 2);
        assert_eq!(db.parameters().count(), 1);
        let b = db.extension("B").unwrap();
        assert!(b.version(&Version::new(2, 0, 0)).is_some());
        assert!(db.parameter("XLEN").unwrap().defined_by.is_some());
        assert!(db.extension("C").is_none());
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let text = format!("{DB}---\nkind: parameter\nname: XLEN\n");
        assert!(matches!(
            ArchDb::from_yaml_str(&text),
            Err(LoadError::Duplicate { kind: "parameter", .. })
        ));
    }

    #[test]
    fn test_invalid_condition_is_a_load_error() {
        let text = "kind: parameter\nname: X\ndefined_by: { bogus: 1 }\n";
        assert!(matches!(ArchDb::from_yaml_str(text), Err(LoadError::Yaml { .. })));
    }

    #[test]
    fn test_load_dir() {
        let dir = std::env::temp_dir().join(format!("isa-conditions-db-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("ext")).unwrap();
        std::fs::write(dir.join("ext/a.yaml"), DB).unwrap();
        std::fs::write(dir.join("notes.txt"), "not yaml").unwrap();

        let db = ArchDb::load_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(db.extensions().count(), 2);
    }

    #[test]
    fn test_interning_is_shared() {
        let db = ArchDb::new();
        let a = db.intern(Term::extension("A", Version::new(1, 0, 0)));
        let b = db.intern(Term::extension("A", Version::new(1, 0, 0)));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
