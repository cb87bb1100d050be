//! Segment label sets. Labels are exclusive within a dimension only; a
//! customer can carry one label from each dimension at the same time.

use serde::{Deserialize, Serialize};

/// Spending tier relative to the population's percentile thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendTier {
    Low,
    Medium,
    High,
}

impl SpendTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpendTier::Low => "low",
            SpendTier::Medium => "medium",
            SpendTier::High => "high",
        }
    }
}

/// Lifetime-value tier over cumulative spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClvTier {
    Low,
    Medium,
    High,
}

impl ClvTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClvTier::Low => "low",
            ClvTier::Medium => "medium",
            ClvTier::High => "high",
        }
    }
}

/// Churn-risk flag for top-tier spenders, derived from recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnRisk {
    AtRisk,
    Stable,
}

impl ChurnRisk {
    /// A customer is at risk once their inactivity exceeds the threshold.
    pub fn from_inactivity(days_inactive: i64, threshold_days: i64) -> Self {
        if days_inactive > threshold_days {
            ChurnRisk::AtRisk
        } else {
            ChurnRisk::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_churn_risk_threshold_is_exclusive() {
        assert_eq!(ChurnRisk::from_inactivity(30, 30), ChurnRisk::Stable);
        assert_eq!(ChurnRisk::from_inactivity(31, 30), ChurnRisk::AtRisk);
    }
}
