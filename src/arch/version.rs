//! Extension versions and version requirements.
//!
//! A requirement is a comma-separated conjunction of `<op> <version>` items,
//! e.g. `">= 1.0, < 2.0"`. A bare version means exact equality.

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Malformed version or requirement text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Not a dotted number triple.
    #[error("invalid version '{0}': expected MAJOR[.MINOR[.PATCH]]")]
    InvalidVersion(String),
    /// Unknown comparison operator.
    #[error("invalid version operator '{0}'")]
    InvalidOperator(String),
    /// An empty item between commas.
    #[error("empty version requirement item in '{0}'")]
    EmptyItem(String),
}

/// A `major.minor.patch` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl Version {
    /// `major.minor.patch`.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    /// Missing minor or patch components default to `0`, so `"2"` is `2.0.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::InvalidVersion(s.to_string());
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let parts: Vec<u32> = trimmed
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<_, _>>()?;

        match parts.as_slice() {
            [major] => Ok(Self::new(*major, 0, 0)),
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// YAML reads `1.0` as a float, so versions accept any scalar and re-parse its text.
fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid version {other:?}"))),
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar_text(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Comparison operators for version requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal (=)
    Equal,
    /// Not equal (!=)
    NotEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal (<=)
    LessThanOrEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,
    /// Compatible (~>): same major version, at least the given one.
    Compatible,
}

impl Operator {
    /// Parse operator from string
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        match s {
            "=" | "==" => Ok(Self::Equal),
            "!=" => Ok(Self::NotEqual),
            "<" => Ok(Self::LessThan),
            "<=" => Ok(Self::LessThanOrEqual),
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterThanOrEqual),
            "~>" => Ok(Self::Compatible),
            _ => Err(VersionError::InvalidOperator(s.to_string())),
        }
    }

    /// The operator as written.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Compatible => "~>",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `<op> <version>` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionSpec {
    /// Comparison operator.
    pub op: Operator,
    /// Version compared against.
    pub version: Version,
}

impl VersionSpec {
    /// `= version`.
    #[must_use]
    pub const fn exact(version: Version) -> Self {
        Self {
            op: Operator::Equal,
            version,
        }
    }

    /// Whether `candidate` satisfies the item.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        match self.op {
            Operator::Equal => candidate == &self.version,
            Operator::NotEqual => candidate != &self.version,
            Operator::LessThan => candidate < &self.version,
            Operator::LessThanOrEqual => candidate <= &self.version,
            Operator::GreaterThan => candidate > &self.version,
            Operator::GreaterThanOrEqual => candidate >= &self.version,
            Operator::Compatible => {
                candidate.major == self.version.major && candidate >= &self.version
            }
        }
    }
}

impl FromStr for VersionSpec {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| VersionError::InvalidVersion(s.to_string()))?;
        let (op, version) = s.split_at(split);
        let op = op.trim();

        Ok(Self {
            op: if op.is_empty() {
                Operator::Equal
            } else {
                Operator::parse(op)?
            },
            version: version.parse()?,
        })
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

/// A conjunction of [`VersionSpec`]s. The empty requirement matches every version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VersionRequirement(Vec<VersionSpec>);

impl VersionRequirement {
    /// Matches every version.
    #[must_use]
    pub const fn any() -> Self {
        Self(Vec::new())
    }

    /// Matches `version` only.
    #[must_use]
    pub fn exact(version: Version) -> Self {
        Self(vec![VersionSpec::exact(version)])
    }

    /// Whether every version matches.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `candidate` satisfies every item.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        self.0.iter().all(|spec| spec.matches(candidate))
    }

    /// The single version this requirement pins with `=`, if it is exactly that.
    #[must_use]
    pub fn exact_version(&self) -> Option<Version> {
        match self.0.as_slice() {
            [VersionSpec {
                op: Operator::Equal,
                version,
            }] => Some(*version),
            _ => None,
        }
    }

    /// The items in order.
    pub fn iter(&self) -> impl Iterator<Item = &VersionSpec> {
        self.0.iter()
    }
}

impl FromStr for VersionRequirement {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::any());
        }
        s.split(',')
            .map(|item| {
                if item.trim().is_empty() {
                    Err(VersionError::EmptyItem(s.to_string()))
                } else {
                    item.parse()
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Serialize for VersionRequirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRequirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar_text(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(">= 0.0.0");
        }
        write!(f, "{}", self.0.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(v("1"), Version::new(1, 0, 0));
        assert_eq!(v("2.1"), Version::new(2, 1, 0));
        assert_eq!(v("1.12.3").to_string(), "1.12.3");
        assert!("1.a".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
    }

    #[test]
    fn test_requirement_matching() {
        let req: VersionRequirement = ">= 1.0, < 2.0".parse().unwrap();
        assert!(req.matches(&v("1.0.0")));
        assert!(req.matches(&v("1.9.9")));
        assert!(!req.matches(&v("2.0.0")));
        assert_eq!(req.exact_version(), None);

        let req: VersionRequirement = "~> 1.2".parse().unwrap();
        assert!(req.matches(&v("1.3.0")));
        assert!(!req.matches(&v("1.1.0")));
        assert!(!req.matches(&v("2.0.0")));
    }

    #[test]
    fn test_exact_forms() {
        let req: VersionRequirement = "= 2.0.0".parse().unwrap();
        assert_eq!(req.exact_version(), Some(v("2.0.0")));
        let bare: VersionRequirement = "2.0".parse().unwrap();
        assert_eq!(bare, req);
        assert_eq!(req.to_string(), "= 2.0.0");
        assert!(VersionRequirement::any().matches(&v("9.9.9")));
    }

    #[test]
    fn test_bad_requirements() {
        assert_eq!(
            "=> 1.0".parse::<VersionRequirement>(),
            Err(VersionError::InvalidOperator("=>".to_string()))
        );
        assert!(">= 1.0,".parse::<VersionRequirement>().is_err());
        assert!(">=".parse::<VersionRequirement>().is_err());
    }

    #[test]
    fn test_deserialize_numeric_yaml() {
        let version: Version = serde_yaml::from_str("1.0").unwrap();
        assert_eq!(version, Version::new(1, 0, 0));
        let version: Version = serde_yaml::from_str("\"1.2.3\"").unwrap();
        assert_eq!(version, Version::new(1, 2, 3));
        let req: VersionRequirement = serde_yaml::from_str("\">= 1.0, < 2\"").unwrap();
        assert!(req.matches(&Version::new(1, 5, 0)));
    }
}
