use crate::core::segment::Segment;
use crate::graph::matrix::Capacity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A population bucket defined by a full attribute label (e.g. `"MYH"`)
/// and the number of users it contains.
///
/// # Examples
///
/// ```
/// use adx_demand::core::user_type::UserType;
///
/// let ut = UserType::new("MYH", 100);
/// assert_eq!(ut.supply_capacity(1.423), 142);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserType {
    label: String,
    population: u64,
}

impl UserType {
    pub fn new(label: impl Into<String>, population: u64) -> Self {
        Self {
            label: label.into(),
            population,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    /// Impressions this user type can supply in one day:
    /// `floor(population * inflation)`.
    pub fn supply_capacity(&self, inflation: f64) -> Capacity {
        (self.population as f64 * inflation).floor() as Capacity
    }

    pub fn is_targeted_by(&self, segment: &Segment) -> bool {
        segment.matches(&self.label)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.population)
    }
}

/// The ordered user-type vocabulary of one simulation run.
///
/// Order is significant: it fixes the position of user-type nodes in every
/// flow network built from this audience.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    user_types: Vec<UserType>,
}

impl Audience {
    pub fn new(user_types: Vec<UserType>) -> Self {
        Self { user_types }
    }

    pub fn user_types(&self) -> &[UserType] {
        &self.user_types
    }

    pub fn len(&self) -> usize {
        self.user_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserType> {
        self.user_types.iter()
    }

    /// Total population addressable by a segment: the sum of the
    /// populations of every user type the segment matches, saturating at
    /// `u64::MAX`.
    pub fn target_size(&self, segment: &Segment) -> u64 {
        self.user_types
            .iter()
            .filter(|ut| ut.is_targeted_by(segment))
            .fold(0u64, |acc, ut| acc.saturating_add(ut.population))
    }

    /// Total population across all user types, saturating at `u64::MAX`.
    pub fn total_population(&self) -> u64 {
        self.user_types
            .iter()
            .fold(0u64, |acc, ut| acc.saturating_add(ut.population))
    }
}

impl FromIterator<UserType> for Audience {
    fn from_iter<T: IntoIterator<Item = UserType>>(iter: T) -> Self {
        Self {
            user_types: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tac_audience() -> Audience {
        vec![
            UserType::new("MYH", 517),
            UserType::new("MYL", 1836),
            UserType::new("MOH", 808),
            UserType::new("MOL", 1795),
            UserType::new("FYH", 256),
            UserType::new("FYL", 1980),
            UserType::new("FOH", 407),
            UserType::new("FOL", 2401),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_supply_capacity_floors() {
        assert_eq!(UserType::new("MY", 100).supply_capacity(1.423), 142);
        assert_eq!(UserType::new("FOL", 2401).supply_capacity(1.423), 3416);
        assert_eq!(UserType::new("X", 0).supply_capacity(1.423), 0);
    }

    #[test]
    fn test_target_size_single_attribute() {
        let audience = tac_audience();
        assert_eq!(audience.target_size(&Segment::new("M")), 517 + 1836 + 808 + 1795);
        assert_eq!(audience.target_size(&Segment::new("FOL")), 2401);
    }

    #[test]
    fn test_target_size_empty_segment_is_everyone() {
        let audience = tac_audience();
        assert_eq!(
            audience.target_size(&Segment::new("")),
            audience.total_population()
        );
    }

    #[test]
    fn test_target_size_saturates() {
        let audience: Audience = vec![UserType::new("MYH", u64::MAX), UserType::new("MYL", 10)]
            .into_iter()
            .collect();
        assert_eq!(audience.target_size(&Segment::new("MY")), u64::MAX);
        assert_eq!(audience.target_size(&Segment::new("L")), 10);
        assert_eq!(audience.total_population(), u64::MAX);
    }

    #[test]
    fn test_target_size_no_match() {
        let audience = tac_audience();
        assert_eq!(audience.target_size(&Segment::new("Z")), 0);
        assert_eq!(audience.target_size(&Segment::new("MF")), 0);
    }
}
