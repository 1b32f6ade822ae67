//! Difficulty tiers for the decision engine.

use serde::{Deserialize, Serialize};

/// How often the engine plays the optimal move.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tier {
    /// Uniformly random among empty cells.
    Weak,
    /// Optimal half of the time.
    Medium,
    /// Optimal four times out of five.
    Strong,
    /// Always optimal.
    #[default]
    Perfect,
}

impl Tier {
    /// Probability that a move comes from the full search.
    pub fn optimal_probability(self) -> f64 {
        match self {
            Tier::Weak => 0.0,
            Tier::Medium => 0.5,
            Tier::Strong => 0.8,
            Tier::Perfect => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Tier::from_str("Strong").unwrap(), Tier::Strong);
        assert_eq!(Tier::from_str("weak").unwrap(), Tier::Weak);
        assert!(Tier::from_str("impossible").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for tier in <Tier as strum::IntoEnumIterator>::iter() {
            assert_eq!(Tier::from_str(&tier.to_string()).unwrap(), tier);
        }
    }
}
