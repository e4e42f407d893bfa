//! Risk classification of close approaches

use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk level of a conjunction; ordering follows priority (`High` is greatest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Levels from most to least urgent
    pub const ALL: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::Low => "Low Risk",
        }
    }

    /// 0 for the most urgent level
    pub fn priority(&self) -> u8 {
        match self {
            RiskLevel::High => 0,
            RiskLevel::Medium => 1,
            RiskLevel::Low => 2,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability and range limits separating the risk levels
///
/// Both comparisons are strict: a range of exactly `high_range_km` is not
/// high risk on range alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub high_probability: f64,
    pub medium_probability: f64,
    pub high_range_km: f64,
    pub medium_range_km: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_probability: 1e-4,
            medium_probability: 1e-5,
            high_range_km: 1.0,
            medium_range_km: 5.0,
        }
    }
}

impl RiskThresholds {
    pub fn classify(&self, min_range_km: f64, probability: f64) -> RiskLevel {
        if probability > self.high_probability || min_range_km < self.high_range_km {
            RiskLevel::High
        } else if probability > self.medium_probability || min_range_km < self.medium_range_km {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Classify with the default thresholds
pub fn classify_risk(min_range_km: f64, probability: f64) -> RiskLevel {
    RiskThresholds::default().classify(min_range_km, probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify_risk(1.0, 0.0), RiskLevel::Medium);
        assert_eq!(classify_risk(0.999, 0.0), RiskLevel::High);
        assert_eq!(classify_risk(100.0, 0.00011), RiskLevel::High);
        assert_eq!(classify_risk(100.0, 0.000011), RiskLevel::Medium);
        assert_eq!(classify_risk(100.0, 0.0), RiskLevel::Low);
    }

    #[test]
    fn test_exact_thresholds_are_not_promoted() {
        assert_eq!(classify_risk(100.0, 1e-4), RiskLevel::Medium);
        assert_eq!(classify_risk(100.0, 1e-5), RiskLevel::Low);
        assert_eq!(classify_risk(5.0, 0.0), RiskLevel::Low);
        assert_eq!(classify_risk(4.99, 0.0), RiskLevel::Medium);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RiskThresholds {
            high_probability: 1e-3,
            ..RiskThresholds::default()
        };
        assert_eq!(thresholds.classify(100.0, 5e-4), RiskLevel::Medium);
        assert_eq!(thresholds.classify(100.0, 2e-3), RiskLevel::High);
    }

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        let priorities: Vec<u8> = RiskLevel::ALL.iter().map(RiskLevel::priority).collect();
        assert_eq!(priorities, vec![0, 1, 2]);
        assert_eq!(RiskLevel::High.label(), "High Risk");
    }

    #[test]
    fn test_thresholds_from_partial_json() {
        let thresholds: RiskThresholds =
            serde_json::from_str(r#"{"medium_range_km": 10.0}"#).unwrap();
        assert_eq!(thresholds.medium_range_km, 10.0);
        assert_eq!(thresholds.high_probability, 1e-4);
    }
}
