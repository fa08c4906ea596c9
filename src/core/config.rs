use crate::core::segment::Segment;
use crate::core::user_type::{Audience, UserType};
use crate::graph::matrix::{Capacity, UNBOUNDED};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Ratio of ad opportunities to raw population observed in the TAC AdX game.
pub const DEFAULT_IMPRESSION_INFLATION: f64 = 1.423;

/// Errors arising from an inconsistent simulation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("num_days must be positive")]
    NoDays,
    #[error("num_agents must be positive")]
    NoAgents,
    #[error("trials must be positive")]
    NoTrials,
    #[error("campaign_lengths must not be empty")]
    NoCampaignLengths,
    #[error("campaign length must be positive, got {0}")]
    ZeroCampaignLength(usize),
    #[error("reach_percents must not be empty")]
    NoReachPercents,
    #[error("reach percent must be within 0..=100, got {0}")]
    ReachPercentOutOfRange(u32),
    #[error("segments must not be empty")]
    NoSegments,
    #[error("user_types must not be empty")]
    NoUserTypes,
    #[error("{user_types} user types but {populations} population sizes")]
    PopulationMismatch {
        user_types: usize,
        populations: usize,
    },
    #[error("impression inflation factor must be finite and non-negative, got {0}")]
    InvalidInflation(f64),
    #[error("populations too large: supply over {num_days} days reaches the unbounded capacity")]
    PopulationTooLarge { num_days: usize },
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parameters of a simulated ad-exchange market.
///
/// Every field has a default reproducing the TAC AdX setup, so a JSON
/// file only needs to list the parameters it changes.
///
/// # Examples
///
/// ```
/// use adx_demand::core::config::SimulationConfig;
///
/// let config = SimulationConfig::from_json_str(r#"{ "num_days": 10, "seed": 7 }"#).unwrap();
/// assert_eq!(config.num_days, 10);
/// assert_eq!(config.campaign_lengths, vec![3, 5, 10]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of the horizon in days.
    pub num_days: usize,
    /// Number of agents; each receives one campaign on day 0.
    pub num_agents: usize,
    /// Allowed campaign durations in days.
    pub campaign_lengths: Vec<usize>,
    /// Allowed reach targets, percent of the segment's population.
    pub reach_percents: Vec<u32>,
    /// Segment vocabulary campaigns draw from.
    pub segments: Vec<Segment>,
    /// User-type labels, parallel to `populations`.
    pub user_types: Vec<String>,
    pub populations: Vec<u64>,
    /// Impression inflation constant `K`.
    pub impression_inflation_factor: f64,
    /// Master seed; `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// Number of independent trials per experiment.
    pub trials: usize,
    /// Also build and solve every daily network, not only the multi-day one.
    pub daily_flows: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let segments = [
            "M", "F", "Y", "O", "H", "L", "MY", "MO", "ML", "MH", "FY", "FO", "FL", "FH", "YL",
            "YH", "OL", "OH", "MYH", "MYL", "MOH", "MOL", "FYH", "FYL", "FOH", "FOL",
        ];
        let user_types = ["MYH", "MYL", "MOH", "MOL", "FYH", "FYL", "FOH", "FOL"];
        Self {
            num_days: 60,
            num_agents: 8,
            campaign_lengths: vec![3, 5, 10],
            reach_percents: vec![20, 50, 80],
            segments: segments.iter().map(|s| Segment::new(*s)).collect(),
            user_types: user_types.iter().map(|s| s.to_string()).collect(),
            populations: vec![517, 1836, 808, 1795, 256, 1980, 407, 2401],
            impression_inflation_factor: DEFAULT_IMPRESSION_INFLATION,
            seed: None,
            trials: 1,
            daily_flows: false,
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Check that the vocabularies are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_days == 0 {
            return Err(ConfigError::NoDays);
        }
        if self.num_agents == 0 {
            return Err(ConfigError::NoAgents);
        }
        if self.trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        if self.campaign_lengths.is_empty() {
            return Err(ConfigError::NoCampaignLengths);
        }
        if let Some(&len) = self.campaign_lengths.iter().find(|&&l| l == 0) {
            return Err(ConfigError::ZeroCampaignLength(len));
        }
        if self.reach_percents.is_empty() {
            return Err(ConfigError::NoReachPercents);
        }
        if let Some(&pct) = self.reach_percents.iter().find(|&&p| p > 100) {
            return Err(ConfigError::ReachPercentOutOfRange(pct));
        }
        if self.segments.is_empty() {
            return Err(ConfigError::NoSegments);
        }
        if self.user_types.is_empty() {
            return Err(ConfigError::NoUserTypes);
        }
        if self.user_types.len() != self.populations.len() {
            return Err(ConfigError::PopulationMismatch {
                user_types: self.user_types.len(),
                populations: self.populations.len(),
            });
        }
        let k = self.impression_inflation_factor;
        if !k.is_finite() || k < 0.0 {
            return Err(ConfigError::InvalidInflation(k));
        }
        self.check_supply_bound()
    }

    /// Population-derived capacities summed over the horizon must stay
    /// strictly below [`UNBOUNDED`].
    ///
    /// A user type contributes `floor(population * K) + 1` per day; the extra
    /// unit covers the floor slack in campaign reach capacities, which are
    /// bounded by the same products.
    fn check_supply_bound(&self) -> Result<(), ConfigError> {
        let too_large = || ConfigError::PopulationTooLarge {
            num_days: self.num_days,
        };
        let k = self.impression_inflation_factor;
        let mut daily: Capacity = 0;
        for &population in &self.populations {
            let supply = (population as f64 * k).floor();
            if supply >= UNBOUNDED as f64 {
                return Err(too_large());
            }
            daily = daily
                .checked_add(supply as Capacity)
                .and_then(|d| d.checked_add(1))
                .ok_or_else(too_large)?;
        }
        let days = Capacity::try_from(self.num_days).map_err(|_| too_large())?;
        match daily.checked_mul(days) {
            Some(total) if total < UNBOUNDED => Ok(()),
            _ => Err(too_large()),
        }
    }

    /// Build the ordered user-type vocabulary.
    pub fn audience(&self) -> Result<Audience, ConfigError> {
        if self.user_types.is_empty() {
            return Err(ConfigError::NoUserTypes);
        }
        if self.user_types.len() != self.populations.len() {
            return Err(ConfigError::PopulationMismatch {
                user_types: self.user_types.len(),
                populations: self.populations.len(),
            });
        }
        Ok(self
            .user_types
            .iter()
            .zip(&self.populations)
            .map(|(label, &population)| UserType::new(label.clone(), population))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segments.len(), 26);
        assert_eq!(config.audience().unwrap().len(), 8);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimulationConfig::from_json_str(
            r#"{ "num_days": 5, "reach_percents": [30, 60], "seed": 42 }"#,
        )
        .unwrap();
        assert_eq!(config.num_days, 5);
        assert_eq!(config.reach_percents, vec![30, 60]);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.num_agents, 8);
        assert!((config.impression_inflation_factor - 1.423).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_days_rejected() {
        let config = SimulationConfig {
            num_days: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoDays)));
    }

    #[test]
    fn test_empty_vocabularies_rejected() {
        let no_lengths = SimulationConfig {
            campaign_lengths: vec![],
            ..Default::default()
        };
        assert!(matches!(
            no_lengths.validate(),
            Err(ConfigError::NoCampaignLengths)
        ));

        let no_percents = SimulationConfig {
            reach_percents: vec![],
            ..Default::default()
        };
        assert!(matches!(
            no_percents.validate(),
            Err(ConfigError::NoReachPercents)
        ));

        let no_segments = SimulationConfig {
            segments: vec![],
            ..Default::default()
        };
        assert!(matches!(no_segments.validate(), Err(ConfigError::NoSegments)));

        let no_types = SimulationConfig {
            user_types: vec![],
            populations: vec![],
            ..Default::default()
        };
        assert!(matches!(no_types.validate(), Err(ConfigError::NoUserTypes)));
    }

    #[test]
    fn test_population_mismatch_rejected() {
        let config = SimulationConfig {
            populations: vec![1, 2, 3],
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::PopulationMismatch {
                user_types,
                populations,
            }) => {
                assert_eq!(user_types, 8);
                assert_eq!(populations, 3);
            }
            other => panic!("expected PopulationMismatch, got {:?}", other),
        }
        assert!(config.audience().is_err());
    }

    #[test]
    fn test_bad_inflation_rejected() {
        let config = SimulationConfig {
            impression_inflation_factor: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInflation(_))
        ));
    }

    #[test]
    fn test_oversized_populations_rejected() {
        let saturated = SimulationConfig {
            user_types: vec!["MYH".into(), "MYL".into()],
            populations: vec![u64::MAX, 10],
            ..Default::default()
        };
        assert!(matches!(
            saturated.validate(),
            Err(ConfigError::PopulationTooLarge { num_days: 60 })
        ));

        // each fits on its own, the horizon total does not
        let summed = SimulationConfig {
            populations: vec![5_000_000_000_000_000_000, 5_000_000_000_000_000_000],
            ..saturated.clone()
        };
        assert!(matches!(
            summed.validate(),
            Err(ConfigError::PopulationTooLarge { .. })
        ));

        let one_day = SimulationConfig {
            num_days: 1,
            populations: vec![1_000_000_000_000_000, 10],
            ..saturated.clone()
        };
        assert!(one_day.validate().is_ok());

        let long_horizon = SimulationConfig {
            num_days: 10_000,
            ..one_day
        };
        assert!(matches!(
            long_horizon.validate(),
            Err(ConfigError::PopulationTooLarge { num_days: 10_000 })
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = SimulationConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_json_values_fail_validation() {
        let result = SimulationConfig::from_json_str(r#"{ "reach_percents": [150] }"#);
        assert!(matches!(
            result,
            Err(ConfigError::ReachPercentOutOfRange(150))
        ));
    }
}
