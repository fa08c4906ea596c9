use serde::{Deserialize, Serialize};
use std::fmt;

/// An audience segment a campaign wants to reach.
///
/// A segment is a subset-pattern over attribute characters (gender, age,
/// income, ...). It matches a user type when every attribute character in
/// the segment also appears in the user type's label.
///
/// # Examples
///
/// ```
/// use adx_demand::core::segment::Segment;
///
/// let male_young = Segment::new("MY");
/// assert!(male_young.matches("MYH"));
/// assert!(!male_young.matches("FYH"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segment(String);

impl Segment {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns true if this segment targets the given user-type label.
    pub fn matches(&self, user_type: &str) -> bool {
        matches(user_type, &self.0)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Returns true iff every character of `segment` is present in `user_type`.
///
/// Order and repetition are irrelevant and characters are compared exactly.
/// The relation is not symmetric, and an empty segment matches every user type.
pub fn matches(user_type: &str, segment: &str) -> bool {
    segment.chars().all(|c| user_type.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_attribute_match() {
        assert!(matches("MYH", "M"));
        assert!(matches("MYH", "H"));
        assert!(!matches("FYH", "M"));
    }

    #[test]
    fn test_order_and_duplicates_ignored() {
        assert!(matches("MYH", "HM"));
        assert!(matches("MYH", "MMY"));
        assert!(matches("MYH", "HYM"));
    }

    #[test]
    fn test_not_symmetric() {
        assert!(matches("MYH", "MY"));
        assert!(!matches("MY", "MYH"));
    }

    #[test]
    fn test_empty_segment_matches_everything() {
        assert!(matches("MYH", ""));
        assert!(matches("", ""));
        assert!(Segment::new("").matches("FOL"));
    }

    #[test]
    fn test_no_normalization() {
        assert!(!matches("myh", "M"));
        assert!(!matches("MYH", " M"));
    }

    #[test]
    fn test_segment_display() {
        let s = Segment::new("FOL");
        assert_eq!(format!("{}", s), "FOL");
        assert_eq!(Segment::from("FOL"), s);
    }
}
