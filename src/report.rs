// 📋 Report bundle - every query run once against the same snapshot

use crate::clock::{Clock, FixedClock};
use crate::entities::Snapshot;
use crate::queries::*;
use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

/// Section names, in report order
pub const SECTIONS: &[&str] = &[
    "customer_transactions",
    "customer_product_transactions",
    "customer_totals",
    "spend_segments",
    "running_spend",
    "top_products",
    "frequent_customers",
    "repeat_customers",
    "category_shares",
    "monthly_sales",
    "churned_customers",
    "customer_ranks",
    "regional_popularity",
    "high_frequency_flags",
    "outliers",
    "amount_statistics",
];

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Reference time used for churn and high-frequency checks
    pub generated_at: NaiveDateTime,

    pub customer_transactions: Vec<CustomerTransaction>,
    pub customer_product_transactions: Vec<CustomerProductTransaction>,
    pub customer_totals: Vec<CustomerTotal>,
    pub spend_segments: Vec<CustomerSegment>,
    pub running_spend: Vec<RunningSpend>,
    pub top_products: Vec<RankedProduct>,
    pub frequent_customers: Vec<FrequentCustomer>,
    pub repeat_customers: Vec<RepeatCustomer>,
    pub category_shares: Vec<CategoryShare>,
    pub monthly_sales: Vec<MonthlySales>,
    pub churned_customers: Vec<ChurnedCustomer>,
    pub customer_ranks: Vec<CustomerRank>,
    pub regional_popularity: Vec<RegionalProductPopularity>,
    pub high_frequency_flags: Vec<HighFrequencyFlag>,
    pub outliers: Vec<OutlierTransaction>,
    pub amount_statistics: Option<AmountStatistics>,
}

impl Report {
    /// Run all fifteen queries. The clock is read once so every
    /// time-relative section shares the same "now".
    pub fn generate<C: Clock>(engine: &AnalyticsEngine<C>, snapshot: &Snapshot) -> Report {
        let now = engine.clock().now();
        let pinned = AnalyticsEngine::with_clock(engine.config.clone(), FixedClock(now));

        // #3 feeds #4 directly rather than being recomputed
        let customer_totals = pinned.total_spend_per_customer(snapshot);
        let spend_segments = segment_customers(
            &customer_totals,
            pinned.config.high_spender_threshold,
            pinned.config.mid_spender_threshold,
        );

        let report = Report {
            generated_at: now,
            customer_transactions: pinned.customer_transactions(snapshot),
            customer_product_transactions: pinned.customer_product_transactions(snapshot),
            customer_totals,
            spend_segments,
            running_spend: pinned.running_spend(snapshot),
            top_products: pinned.top_products_per_customer(snapshot),
            frequent_customers: pinned.frequent_customer_averages(snapshot),
            repeat_customers: pinned.repeat_customers(snapshot),
            category_shares: pinned.category_sales_share(snapshot),
            monthly_sales: pinned.monthly_sales(snapshot),
            churned_customers: pinned.churned_customers(snapshot),
            customer_ranks: pinned.rank_customers_by_average(snapshot),
            regional_popularity: pinned.product_popularity_by_region(snapshot),
            high_frequency_flags: pinned.high_frequency_customers(snapshot),
            outliers: pinned.outlier_transactions(snapshot),
            amount_statistics: amount_statistics(snapshot),
        };

        info!(
            customers = snapshot.customers.len(),
            transactions = snapshot.transactions.len(),
            %now,
            "report generated"
        );
        report
    }

    /// One section as JSON, by name (see `SECTIONS`)
    pub fn section(&self, name: &str) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        value
            .get_mut(name)
            .map(serde_json::Value::take)
            .ok_or_else(|| anyhow!("unknown section '{}' (expected one of: {})", name, SECTIONS.join(", ")))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::entities::parse_timestamp;
    use crate::queries::fixtures::*;

    fn report() -> Report {
        let now = parse_timestamp("2024-03-01").unwrap().unwrap();
        let engine = AnalyticsEngine::with_clock(ReportConfig::default(), FixedClock(now));
        Report::generate(&engine, &alice_and_bob())
    }

    #[test]
    fn test_generate_fills_every_section() {
        let report = report();

        assert_eq!(report.customer_transactions.len(), 3);
        assert_eq!(report.customer_totals.len(), 2);
        assert_eq!(report.spend_segments.len(), 2);
        assert_eq!(report.running_spend.len(), 3);
        assert_eq!(report.monthly_sales.len(), 2);
        assert!(report.churned_customers.is_empty());
        assert_eq!(report.amount_statistics.unwrap().count, 3);
    }

    #[test]
    fn test_every_section_name_resolves() {
        let report = report();
        for name in SECTIONS {
            assert!(report.section(name).is_ok(), "missing section {}", name);
        }
        assert!(report.section("generated_at").is_ok());
        assert!(report.section("nope").is_err());
    }

    #[test]
    fn test_section_json_shape() {
        let segments = report().section("spend_segments").unwrap();

        assert_eq!(segments[0]["customer_name"], "Alice");
        assert_eq!(segments[0]["total_spent"], "1200.00");
        assert_eq!(segments[0]["segment"], "High-Spender");
        assert_eq!(segments[1]["segment"], "Low-Spender");
    }

    #[test]
    fn test_report_on_empty_snapshot() {
        let now = parse_timestamp("2024-03-01").unwrap().unwrap();
        let engine = AnalyticsEngine::with_clock(ReportConfig::default(), FixedClock(now));
        let report = Report::generate(&engine, &Snapshot::default());

        assert!(report.customer_totals.is_empty());
        assert!(report.category_shares.is_empty());
        assert!(report.outliers.is_empty());
        assert!(report.amount_statistics.is_none());
        assert!(report.to_json_pretty().is_ok());
    }
}
