// ⚙️ Report configuration - thresholds for every operation
//
// Defaults reproduce the fixed constants of the reporting queries:
//   High-Spender > 1000, Mid-Spender 500..=1000, top 3 products,
//   frequent > 5 transactions, churn after 6 months,
//   high-frequency > 10 transactions within 1 day, outliers beyond 3 sigma.

use crate::money::Money;
use anyhow::{ensure, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Totals strictly above this are High-Spender
    pub high_spender_threshold: Money,

    /// Totals at or above this (and not High) are Mid-Spender
    pub mid_spender_threshold: Money,

    /// Products kept per customer in the top-N ranking
    pub top_products_per_customer: usize,

    /// Customers need strictly more transactions than this to count as frequent
    pub frequent_customer_min_transactions: usize,

    /// Customers need strictly more distinct active days than this to repeat
    pub repeat_customer_min_active_days: usize,

    /// Months without a transaction before a customer is churned
    pub churn_months: u32,

    /// Transactions needed (strictly more) to raise a high-frequency flag
    pub high_frequency_min_transactions: usize,

    /// First-to-last span must be strictly shorter than this
    pub high_frequency_window_hours: i64,

    /// Outlier band half-width in population standard deviations
    pub outlier_sigmas: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            high_spender_threshold: Money::from_units(1000),
            mid_spender_threshold: Money::from_units(500),
            top_products_per_customer: 3,
            frequent_customer_min_transactions: 5,
            repeat_customer_min_active_days: 1,
            churn_months: 6,
            high_frequency_min_transactions: 10,
            high_frequency_window_hours: 24,
            outlier_sigmas: 3,
        }
    }
}

impl ReportConfig {
    /// Load from a JSON file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ReportConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.mid_spender_threshold <= self.high_spender_threshold,
            "mid_spender_threshold ({}) must not exceed high_spender_threshold ({})",
            self.mid_spender_threshold,
            self.high_spender_threshold
        );
        ensure!(
            self.high_frequency_window_hours > 0,
            "high_frequency_window_hours must be positive"
        );
        ensure!(
            Duration::try_hours(self.high_frequency_window_hours).is_some(),
            "high_frequency_window_hours ({}) is out of range",
            self.high_frequency_window_hours
        );
        Ok(())
    }

    /// Unvalidated configs with an oversized window get the largest
    /// representable duration
    pub fn high_frequency_window(&self) -> Duration {
        Duration::try_hours(self.high_frequency_window_hours).unwrap_or(Duration::MAX)
    }
}
