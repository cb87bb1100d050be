use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{PulseError, PulseResult};

/// Root application configuration. Loaded from environment variables
/// with the prefix `PURCHASE_PULSE__`; CLI flags are layered on top by
/// the binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Path of the transactions CSV file.
    #[serde(default = "default_data_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// "As of" date for recency and window math. `None` means today;
    /// injectable so runs are reproducible.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
    /// Days without a purchase before a customer counts as inactive.
    #[serde(default = "default_inactivity_threshold_days")]
    pub inactivity_threshold_days: i64,
    /// How far back the baseline activity window starts, in months.
    #[serde(default = "default_past_window_months")]
    pub past_window_months: u32,
    /// Boundary between the baseline and recent windows, in months.
    #[serde(default = "default_split_months")]
    pub split_months: u32,
    #[serde(default = "default_top_n_declining")]
    pub top_n_declining: usize,
    #[serde(default = "default_top_n_items")]
    pub top_n_items: usize,
    /// Tier breakpoints, ascending: the medium cut and the high cut.
    #[serde(default = "default_tier_percentiles")]
    pub tier_percentiles: Vec<f64>,
}

fn default_data_path() -> String {
    "data/transactions.csv".to_string()
}
fn default_inactivity_threshold_days() -> i64 {
    30
}
fn default_past_window_months() -> u32 {
    12
}
fn default_split_months() -> u32 {
    6
}
fn default_top_n_declining() -> usize {
    10
}
fn default_top_n_items() -> usize {
    10
}
fn default_tier_percentiles() -> Vec<f64> {
    vec![0.50, 0.75]
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reference_date: None,
            inactivity_threshold_days: default_inactivity_threshold_days(),
            past_window_months: default_past_window_months(),
            split_months: default_split_months(),
            top_n_declining: default_top_n_declining(),
            top_n_items: default_top_n_items(),
            tier_percentiles: default_tier_percentiles(),
        }
    }
}

impl AnalysisConfig {
    /// The reference date with the "today" default applied.
    pub fn resolved_reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    pub fn validate(&self) -> PulseResult<()> {
        if self.tier_percentiles.len() != 2 {
            return Err(PulseError::Config(format!(
                "tier_percentiles must hold exactly two breakpoints, got {}",
                self.tier_percentiles.len()
            )));
        }
        let (lo, hi) = (self.tier_percentiles[0], self.tier_percentiles[1]);
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo >= hi {
            return Err(PulseError::Config(format!(
                "tier_percentiles must be ascending within [0, 1], got [{}, {}]",
                lo, hi
            )));
        }
        if self.split_months == 0 || self.split_months >= self.past_window_months {
            return Err(PulseError::Config(format!(
                "split_months ({}) must be positive and smaller than past_window_months ({})",
                self.split_months, self.past_window_months
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("PURCHASE_PULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.inactivity_threshold_days, 30);
        assert_eq!(config.tier_percentiles, vec![0.50, 0.75]);
    }

    #[test]
    fn test_rejects_descending_percentiles() {
        let config = AnalysisConfig {
            tier_percentiles: vec![0.75, 0.50],
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_windows() {
        let config = AnalysisConfig {
            past_window_months: 6,
            split_months: 6,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reference_date_injectable() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let config = AnalysisConfig {
            reference_date: Some(date),
            ..AnalysisConfig::default()
        };
        assert_eq!(config.resolved_reference_date(), date);
    }
}
