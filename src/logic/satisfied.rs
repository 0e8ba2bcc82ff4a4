//! Kleene three-valued truth.
use std::fmt;
use std::ops::Not;

/// Three-valued truth: certainly true, certainly false, or not determined by
/// what the configuration says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatisfiedResult {
    /// Certainly true.
    Yes,
    /// Certainly false.
    No,
    /// Not determined.
    Maybe,
}

impl SatisfiedResult {
    /// `Yes` or `Maybe`.
    #[must_use]
    pub const fn could_be_true(self) -> bool {
        !matches!(self, Self::No)
    }

    /// Certainly true.
    #[must_use]
    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    /// Certainly false.
    #[must_use]
    pub const fn is_no(self) -> bool {
        matches!(self, Self::No)
    }

    /// Kleene conjunction.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::No, _) | (_, Self::No) => Self::No,
            (Self::Yes, Self::Yes) => Self::Yes,
            _ => Self::Maybe,
        }
    }

    /// Kleene disjunction.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Yes, _) | (_, Self::Yes) => Self::Yes,
            (Self::No, Self::No) => Self::No,
            _ => Self::Maybe,
        }
    }

    /// Kleene conjunction of every item. The empty conjunction is `Yes`.
    pub fn all(items: impl IntoIterator<Item = Self>) -> Self {
        items.into_iter().fold(Self::Yes, Self::and)
    }

    /// Kleene disjunction of every item. The empty disjunction is `No`.
    pub fn any(items: impl IntoIterator<Item = Self>) -> Self {
        items.into_iter().fold(Self::No, Self::or)
    }
}

impl Not for SatisfiedResult {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
            Self::Maybe => Self::Maybe,
        }
    }
}

impl From<bool> for SatisfiedResult {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

impl fmt::Display for SatisfiedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Maybe => "maybe",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SatisfiedResult::{Maybe, No, Yes};
    use super::*;

    #[test]
    fn test_kleene_tables() {
        assert_eq!(Yes.and(Maybe), Maybe);
        assert_eq!(No.and(Maybe), No);
        assert_eq!(Yes.or(Maybe), Yes);
        assert_eq!(No.or(Maybe), Maybe);
        assert_eq!(!Maybe, Maybe);
        assert_eq!(!Yes, No);
        assert_eq!(SatisfiedResult::all([]), Yes);
        assert_eq!(SatisfiedResult::any([]), No);
    }

    #[test]
    fn test_could_be_true() {
        assert!(Yes.could_be_true());
        assert!(Maybe.could_be_true());
        assert!(!No.could_be_true());
    }
}
