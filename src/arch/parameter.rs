//! Architecture parameters.
use crate::condition::spec::ConditionSpec;
use serde::{Deserialize, Serialize};

/// An architecture parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Condition under which the parameter exists at all, usually the
    /// extensions that introduce it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_by: Option<ConditionSpec>,
}

impl Parameter {
    /// A parameter defined everywhere.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            defined_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_parameter() {
        let param: Parameter = serde_yaml::from_str(
            "name: VLEN\ndefined_by: { extension: { name: V } }\n",
        )
        .unwrap();
        assert_eq!(param.name, "VLEN");
        assert!(param.description.is_empty());
        assert!(matches!(param.defined_by, Some(ConditionSpec::Extension(_))));
    }
}
