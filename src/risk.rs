//! Maps a death probability (percent) to an ordinal risk tier with fixed thresholds.

use serde::{Deserialize, Serialize};

/// Upper bound of the low tier; a probability of exactly 30.0 is still low.
pub const LOW_UPPER_BOUND: f64 = 30.0;
/// Upper bound of the medium tier; a probability of exactly 70.0 is still medium.
pub const MEDIUM_UPPER_BOUND: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Classify a death probability in percent: [0, 30] low, (30, 70] medium,
    /// (70, 100] high.
    pub fn from_probability(death_probability: f64) -> Self {
        if death_probability > MEDIUM_UPPER_BOUND {
            RiskTier::High
        } else if death_probability > LOW_UPPER_BOUND {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }

    /// Patient-facing guidance shown beside the tier.
    pub fn guidance(&self) -> &'static str {
        match self {
            RiskTier::Low => "Routine follow-up is recommended.",
            RiskTier::Medium => "Closer postoperative monitoring is recommended.",
            RiskTier::High => "Intensive follow-up and adjuvant therapy review are recommended.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_values_stay_in_lower_tier() {
        assert_eq!(RiskTier::from_probability(30.0), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(70.0), RiskTier::Medium);
    }

    #[test]
    fn values_just_above_boundaries_promote() {
        assert_eq!(RiskTier::from_probability(30.000001), RiskTier::Medium);
        assert_eq!(RiskTier::from_probability(70.000001), RiskTier::High);
    }

    #[test]
    fn range_extremes() {
        assert_eq!(RiskTier::from_probability(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(100.0), RiskTier::High);
    }
}
