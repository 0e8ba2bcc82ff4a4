#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The declarative condition grammar.
//!
//! A condition is a boolean or a mapping with exactly one key out of
//! `allOf`, `anyOf`, `oneOf`, `noneOf`, `not`, `extension`, `param` and
//! `idl()`, or the pair `if` + `then`. The values of `extension` and `param`
//! are either a leaf (`{name, ...}`) or the same connectives over leaves.

use crate::arch::extension::ExtensionRequirement;
use crate::arch::version::VersionRequirement;
use crate::condition::ConditionError;
use crate::logic::node::LogicNode;
use crate::logic::term::{ParamPredicate, ParamValue, Term};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::fmt;

/// Key marking an opaque scripted predicate.
pub const SCRIPT_KEY: &str = "idl()";

const PREDICATE_KEYS: [&str; 5] = ["equal", "not_equal", "less_than", "greater_than", "includes"];

/// "Parameter `name` satisfies `predicate`."
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamRequirement {
    /// Parameter name.
    pub name: String,
    /// What the value must satisfy.
    pub predicate: ParamPredicate,
}

impl fmt::Display for ParamRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.predicate.key(), self.predicate.operand())
    }
}

/// A parsed condition, before names are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionSpec {
    /// `true` or `false`.
    Constant(bool),
    /// `allOf`: every item holds.
    AllOf(Vec<ConditionSpec>),
    /// `anyOf`: some item holds.
    AnyOf(Vec<ConditionSpec>),
    /// `oneOf`: exactly one item holds.
    OneOf(Vec<ConditionSpec>),
    /// `noneOf`: no item holds.
    NoneOf(Vec<ConditionSpec>),
    /// `not`.
    Not(Box<ConditionSpec>),
    /// `if` + `then`.
    IfThen {
        /// The antecedent.
        condition: Box<ConditionSpec>,
        /// What must hold when the antecedent does.
        then: Box<ConditionSpec>,
    },
    /// An `extension` leaf.
    Extension(ExtensionRequirement),
    /// A `param` leaf.
    Param(ParamRequirement),
    /// Source of an opaque scripted predicate.
    Script(String),
}

/// What a bare `{name, ...}` mapping means at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leaf {
    General,
    Extension,
    Param,
}

fn grammar(map: &Map<String, Value>, reason: impl Into<String>) -> ConditionError {
    ConditionError::Grammar {
        keys: map.keys().cloned().collect(),
        reason: reason.into(),
    }
}

impl ConditionSpec {
    /// Parses a condition value.
    ///
    /// # Errors
    ///
    /// [`ConditionError::Grammar`] when a mapping does not have exactly one
    /// recognized shape, and [`ConditionError::Version`] for malformed
    /// version requirements.
    pub fn parse(value: &Value) -> Result<Self, ConditionError> {
        Self::parse_node(value, Leaf::General)
    }

    fn parse_node(value: &Value, leaf: Leaf) -> Result<Self, ConditionError> {
        let map = match value {
            Value::Bool(b) => return Ok(Self::Constant(*b)),
            Value::Object(map) => map,
            other => {
                return Err(ConditionError::Grammar {
                    keys: Vec::new(),
                    reason: format!("expected a mapping or a boolean, found {other}"),
                });
            }
        };

        if map.contains_key("if") || map.contains_key("then") {
            return match (map.get("if"), map.get("then"), map.len()) {
                (Some(condition), Some(then), 2) => Ok(Self::IfThen {
                    condition: Box::new(Self::parse_node(condition, Leaf::General)?),
                    then: Box::new(Self::parse_node(then, leaf)?),
                }),
                (Some(_), Some(_), _) => Err(grammar(map, "`if`/`then` must not have sibling keys")),
                (Some(_), None, _) => Err(grammar(map, "`if` without `then`")),
                _ => Err(grammar(map, "`then` without `if`")),
            };
        }

        if map.contains_key("name") {
            return match leaf {
                Leaf::Extension => Self::parse_extension_leaf(map),
                Leaf::Param => Self::parse_param_leaf(map),
                Leaf::General => Err(grammar(
                    map,
                    "a `name` leaf must be nested under `extension` or `param`",
                )),
            };
        }

        let mut entries = map.iter();
        let (key, inner) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => return Err(grammar(map, "empty condition")),
            (Some(_), Some(_)) => return Err(grammar(map, "expected exactly one key")),
        };

        match key.as_str() {
            "allOf" => Self::parse_list(map, inner, leaf).map(Self::AllOf),
            "anyOf" => Self::parse_list(map, inner, leaf).map(Self::AnyOf),
            "oneOf" => Self::parse_list(map, inner, leaf).map(Self::OneOf),
            "noneOf" => Self::parse_list(map, inner, leaf).map(Self::NoneOf),
            "not" => Ok(Self::Not(Box::new(Self::parse_node(inner, leaf)?))),
            "extension" if leaf == Leaf::General => Self::parse_node(inner, Leaf::Extension),
            "param" if leaf == Leaf::General => Self::parse_node(inner, Leaf::Param),
            SCRIPT_KEY if leaf == Leaf::General => match inner {
                Value::String(source) => Ok(Self::Script(source.clone())),
                _ => Err(grammar(map, "`idl()` takes the predicate source as a string")),
            },
            other => Err(grammar(map, format!("unknown key `{other}`"))),
        }
    }

    fn parse_list(map: &Map<String, Value>, value: &Value, leaf: Leaf) -> Result<Vec<Self>, ConditionError> {
        let Value::Array(items) = value else {
            return Err(grammar(map, "expected a list of conditions"));
        };
        items.iter().map(|item| Self::parse_node(item, leaf)).collect()
    }

    fn parse_extension_leaf(map: &Map<String, Value>) -> Result<Self, ConditionError> {
        if let Some(extra) = map.keys().find(|k| !matches!(k.as_str(), "name" | "version")) {
            return Err(grammar(map, format!("unexpected key `{extra}` in extension requirement")));
        }
        let Some(Value::String(name)) = map.get("name") else {
            return Err(grammar(map, "extension name must be a string"));
        };
        let requirement = match map.get("version") {
            None => VersionRequirement::any(),
            Some(Value::String(s)) => s.parse()?,
            Some(Value::Number(n)) => n.to_string().parse()?,
            Some(_) => return Err(grammar(map, "version must be a string")),
        };
        Ok(Self::Extension(ExtensionRequirement::new(name.clone(), requirement)))
    }

    fn parse_param_leaf(map: &Map<String, Value>) -> Result<Self, ConditionError> {
        let Some(Value::String(name)) = map.get("name") else {
            return Err(grammar(map, "parameter name must be a string"));
        };
        if let Some(extra) = map
            .keys()
            .find(|k| k.as_str() != "name" && !PREDICATE_KEYS.contains(&k.as_str()))
        {
            return Err(grammar(map, format!("unexpected key `{extra}` in parameter requirement")));
        }

        let mut predicates = map.iter().filter(|(k, _)| k.as_str() != "name");
        let (key, operand) = match (predicates.next(), predicates.next()) {
            (Some(p), None) => p,
            _ => {
                return Err(grammar(
                    map,
                    format!("expected exactly one of {}", PREDICATE_KEYS.join(", ")),
                ));
            }
        };

        let value = || {
            serde_json::from_value::<ParamValue>(operand.clone())
                .map_err(|e| grammar(map, format!("invalid value for `{key}`: {e}")))
        };
        let bound = || {
            operand
                .as_i64()
                .ok_or_else(|| grammar(map, format!("`{key}` takes an integer")))
        };

        let predicate = match key.as_str() {
            "equal" => ParamPredicate::Equal(value()?),
            "not_equal" => ParamPredicate::NotEqual(value()?),
            "less_than" => ParamPredicate::LessThan(bound()?),
            "greater_than" => ParamPredicate::GreaterThan(bound()?),
            _ => ParamPredicate::Includes(value()?),
        };

        Ok(Self::Param(ParamRequirement {
            name: name.clone(),
            predicate,
        }))
    }

    /// Re-serializes into the grammar. Re-parsing yields an equal spec,
    /// except that connectives inside `extension`/`param` are lifted out.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let list = |items: &[Self]| Value::Array(items.iter().map(Self::to_value).collect());
        match self {
            Self::Constant(b) => Value::Bool(*b),
            Self::AllOf(items) => json!({ "allOf": list(items) }),
            Self::AnyOf(items) => json!({ "anyOf": list(items) }),
            Self::OneOf(items) => json!({ "oneOf": list(items) }),
            Self::NoneOf(items) => json!({ "noneOf": list(items) }),
            Self::Not(inner) => json!({ "not": inner.to_value() }),
            Self::IfThen { condition, then } => {
                json!({ "if": condition.to_value(), "then": then.to_value() })
            }
            Self::Extension(req) => {
                let mut leaf = Map::new();
                leaf.insert("name".into(), Value::String(req.name.clone()));
                if !req.requirement.is_any() {
                    leaf.insert("version".into(), Value::String(req.requirement.to_string()));
                }
                json!({ "extension": leaf })
            }
            Self::Param(req) => {
                let mut leaf = Map::new();
                leaf.insert("name".into(), Value::String(req.name.clone()));
                leaf.insert(
                    req.predicate.key().into(),
                    param_value_to_json(&req.predicate.operand()),
                );
                json!({ "param": leaf })
            }
            Self::Script(source) => json!({ (SCRIPT_KEY): source }),
        }
    }

    /// Like [`ConditionSpec::to_value`], but a constant is written in the
    /// canonical `{if: true, then: <constant>}` shape.
    #[must_use]
    pub fn to_canonical_value(&self) -> Value {
        match self {
            Self::Constant(b) => json!({ "if": true, "then": b }),
            other => other.to_value(),
        }
    }

    /// The spec that rebuilds `node`. Extension terms become exact-version
    /// requirements.
    #[must_use]
    pub fn from_logic(node: &LogicNode) -> Self {
        let list = |cs: &[LogicNode]| -> Vec<Self> { cs.iter().map(Self::from_logic).collect() };
        match node {
            LogicNode::True => Self::Constant(true),
            LogicNode::False => Self::Constant(false),
            LogicNode::Term(term) => match term.as_ref() {
                Term::Extension(e) => Self::Extension(ExtensionRequirement::new(
                    e.name.clone(),
                    VersionRequirement::exact(e.version),
                )),
                Term::Parameter(p) => Self::Param(ParamRequirement {
                    name: p.name.clone(),
                    predicate: p.predicate.clone(),
                }),
                Term::Script(s) => Self::Script(s.source.clone()),
            },
            LogicNode::Not(child) => Self::Not(Box::new(Self::from_logic(child))),
            LogicNode::And(cs) => Self::AllOf(list(cs)),
            LogicNode::Or(cs) => Self::AnyOf(list(cs)),
            LogicNode::Xor(cs) => Self::OneOf(list(cs)),
            LogicNode::NoneOf(cs) => Self::NoneOf(list(cs)),
            LogicNode::If(cond, then) => Self::IfThen {
                condition: Box::new(Self::from_logic(cond)),
                then: Box::new(Self::from_logic(then)),
            },
        }
    }
}

fn param_value_to_json(value: &ParamValue) -> Value {
    match value {
        ParamValue::Bool(b) => Value::Bool(*b),
        ParamValue::Int(i) => Value::from(*i),
        ParamValue::Str(s) => Value::String(s.clone()),
        ParamValue::Array(items) => Value::Array(items.iter().map(param_value_to_json).collect()),
    }
}

impl Serialize for ConditionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConditionSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for ConditionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::version::Version;

    fn parse(text: &str) -> Result<ConditionSpec, ConditionError> {
        let value: Value = serde_yaml::from_str(text).unwrap();
        ConditionSpec::parse(&value)
    }

    #[test]
    fn test_parse_connectives() {
        let spec = parse(
            r#"
allOf:
  - extension: { name: A, version: "= 1.0.0" }
  - noneOf:
      - extension: { name: B }
  - if: { param: { name: XLEN, equal: 64 } }
    then: { idl(): "MXLEN == 64" }
"#,
        )
        .unwrap();

        let ConditionSpec::AllOf(items) = &spec else {
            panic!("expected allOf, got {spec:?}");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0],
            ConditionSpec::Extension(ExtensionRequirement::new(
                "A",
                VersionRequirement::exact(Version::new(1, 0, 0))
            ))
        );
        assert!(matches!(&items[1], ConditionSpec::NoneOf(inner) if inner.len() == 1));
        assert!(matches!(&items[2], ConditionSpec::IfThen { .. }));
    }

    #[test]
    fn test_nested_leaf_connectives() {
        let spec = parse("extension: { anyOf: [ { name: A }, { name: B, version: '>= 2.0' } ] }").unwrap();
        assert!(matches!(spec, ConditionSpec::AnyOf(ref v) if v.len() == 2));

        let spec = parse("param: { not: { name: XLEN, less_than: 64 } }").unwrap();
        assert_eq!(
            spec,
            ConditionSpec::Not(Box::new(ConditionSpec::Param(ParamRequirement {
                name: "XLEN".into(),
                predicate: ParamPredicate::LessThan(64),
            })))
        );
    }

    #[test]
    fn test_grammar_errors() {
        let err = parse("{ allOf: [], anyOf: [] }").unwrap_err();
        assert!(matches!(err, ConditionError::Grammar { ref keys, .. } if keys.len() == 2));

        assert!(matches!(parse("{ then: true }"), Err(ConditionError::Grammar { .. })));
        assert!(matches!(parse("{ if: true }"), Err(ConditionError::Grammar { .. })));
        assert!(matches!(parse("{ if: true, then: true, not: false }"), Err(ConditionError::Grammar { .. })));
        assert!(matches!(parse("{ bogus: 1 }"), Err(ConditionError::Grammar { .. })));
        assert!(matches!(parse("{}"), Err(ConditionError::Grammar { .. })));
        assert!(matches!(parse("{ name: A }"), Err(ConditionError::Grammar { .. })));
        assert!(matches!(
            parse("param: { name: X, equal: 1, less_than: 2 }"),
            Err(ConditionError::Grammar { .. })
        ));
        assert!(matches!(
            parse("extension: { name: A, version: '=> 1.0' }"),
            Err(ConditionError::Version(_))
        ));
        assert!(matches!(parse("extension: { param: { name: X, equal: 1 } }"), Err(ConditionError::Grammar { .. })));
    }

    #[test]
    fn test_to_value_reparses() {
        let text = r#"
anyOf:
  - not: { extension: { name: A, version: "~> 1.2" } }
  - oneOf:
      - param: { name: VLEN, includes: 128 }
      - idl(): "true"
  - false
"#;
        let spec = parse(text).unwrap();
        assert_eq!(ConditionSpec::parse(&spec.to_value()).unwrap(), spec);
    }

    #[test]
    fn test_canonical_constant() {
        let value = ConditionSpec::Constant(false).to_canonical_value();
        assert_eq!(value, json!({ "if": true, "then": false }));
        let back = ConditionSpec::parse(&value).unwrap();
        assert!(matches!(back, ConditionSpec::IfThen { .. }));
    }
}
