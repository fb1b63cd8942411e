// 🔎 Analytical Query Set
//
// Fifteen read-only reports over a Snapshot. Every function here is pure:
// same snapshot (and reference time) in, same rows out, in a fixed order.
//
//   #1  customer_transactions          #9  category_sales_share
//   #2  customer_product_transactions  #10 monthly_sales
//   #3  total_spend_per_customer       #11 churned_customers
//   #4  spend_segments                 #12 rank_customers_by_average
//   #5  running_spend                  #13 product_popularity_by_region
//   #6  top_products_per_customer      #14 high_frequency_customers
//   #7  frequent_customer_averages     #15 outlier_transactions
//   #8  repeat_customers

pub mod activity;
pub mod joins;
pub mod outliers;
pub mod ranking;
pub mod running;
pub mod sales;
pub mod spending;
pub mod window;

pub use activity::{
    churn_cutoff, churned_customers, high_frequency_customers, repeat_customers,
    ChurnedCustomer, HighFrequencyFlag, RepeatCustomer,
};
pub use joins::{
    customer_product_transactions, customer_transactions, CustomerProductTransaction,
    CustomerTransaction,
};
pub use outliers::{amount_statistics, outlier_transactions, AmountStatistics, OutlierTransaction};
pub use ranking::{
    customer_product_spend, rank_customers_by_average, top_products, top_products_per_customer,
    CustomerProductSpend, CustomerRank, RankedProduct,
};
pub use running::{running_spend, RunningSpend};
pub use sales::{
    category_sales_share, category_shares, category_totals, monthly_sales,
    product_popularity_by_region, CategoryShare, CategoryTotal, MonthlySales,
    RegionalProductPopularity, YearMonth,
};
pub use spending::{
    frequent_customer_averages, segment_customers, spend_segments, total_spend_per_customer,
    CustomerSegment, CustomerTotal, FrequentCustomer, SpendSegment,
};

use crate::clock::{Clock, SystemClock};
use crate::config::ReportConfig;
use crate::entities::Snapshot;

// ============================================================================
// ANALYTICS ENGINE
// ============================================================================

/// Runs the query set with configured thresholds and an injected clock.
///
/// The free functions above take every parameter explicitly; the engine just
/// supplies them from `ReportConfig` and reads "now" from its clock.
pub struct AnalyticsEngine<C: Clock = SystemClock> {
    pub config: ReportConfig,
    clock: C,
}

impl AnalyticsEngine<SystemClock> {
    pub fn new() -> Self {
        AnalyticsEngine {
            config: ReportConfig::default(),
            clock: SystemClock,
        }
    }
}

impl Default for AnalyticsEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> AnalyticsEngine<C> {
    pub fn with_clock(config: ReportConfig, clock: C) -> Self {
        AnalyticsEngine { config, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn customer_transactions(&self, snapshot: &Snapshot) -> Vec<CustomerTransaction> {
        customer_transactions(snapshot)
    }

    pub fn customer_product_transactions(&self, snapshot: &Snapshot) -> Vec<CustomerProductTransaction> {
        customer_product_transactions(snapshot)
    }

    pub fn total_spend_per_customer(&self, snapshot: &Snapshot) -> Vec<CustomerTotal> {
        total_spend_per_customer(snapshot)
    }

    pub fn spend_segments(&self, snapshot: &Snapshot) -> Vec<CustomerSegment> {
        spend_segments(
            snapshot,
            self.config.high_spender_threshold,
            self.config.mid_spender_threshold,
        )
    }

    pub fn running_spend(&self, snapshot: &Snapshot) -> Vec<RunningSpend> {
        running_spend(snapshot)
    }

    pub fn top_products_per_customer(&self, snapshot: &Snapshot) -> Vec<RankedProduct> {
        top_products_per_customer(snapshot, self.config.top_products_per_customer)
    }

    pub fn frequent_customer_averages(&self, snapshot: &Snapshot) -> Vec<FrequentCustomer> {
        frequent_customer_averages(snapshot, self.config.frequent_customer_min_transactions)
    }

    pub fn repeat_customers(&self, snapshot: &Snapshot) -> Vec<RepeatCustomer> {
        repeat_customers(snapshot, self.config.repeat_customer_min_active_days)
    }

    pub fn category_sales_share(&self, snapshot: &Snapshot) -> Vec<CategoryShare> {
        category_sales_share(snapshot)
    }

    pub fn monthly_sales(&self, snapshot: &Snapshot) -> Vec<MonthlySales> {
        monthly_sales(snapshot)
    }

    pub fn churned_customers(&self, snapshot: &Snapshot) -> Vec<ChurnedCustomer> {
        churned_customers(snapshot, self.clock.now(), self.config.churn_months)
    }

    pub fn rank_customers_by_average(&self, snapshot: &Snapshot) -> Vec<CustomerRank> {
        rank_customers_by_average(snapshot)
    }

    pub fn product_popularity_by_region(&self, snapshot: &Snapshot) -> Vec<RegionalProductPopularity> {
        product_popularity_by_region(snapshot)
    }

    pub fn high_frequency_customers(&self, snapshot: &Snapshot) -> Vec<HighFrequencyFlag> {
        high_frequency_customers(
            snapshot,
            self.clock.now(),
            self.config.high_frequency_min_transactions,
            self.config.high_frequency_window(),
        )
    }

    pub fn outlier_transactions(&self, snapshot: &Snapshot) -> Vec<OutlierTransaction> {
        outlier_transactions(snapshot, self.config.outlier_sigmas)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::clock::FixedClock;
    use crate::entities::parse_timestamp;
    use crate::money::Money;

    fn engine_at(raw: &str) -> AnalyticsEngine<FixedClock> {
        let now = parse_timestamp(raw).unwrap().unwrap();
        AnalyticsEngine::with_clock(ReportConfig::default(), FixedClock(now))
    }

    #[test]
    fn test_engine_uses_injected_clock() {
        let snapshot = alice_and_bob();

        // Shortly after the last purchase nobody has churned
        assert!(engine_at("2024-03-01").churned_customers(&snapshot).is_empty());

        // A year later both have
        let churned = engine_at("2025-03-01").churned_customers(&snapshot);
        assert_eq!(churned.len(), 2);
    }

    #[test]
    fn test_engine_uses_configured_thresholds() {
        let snapshot = alice_and_bob();
        let mut engine = engine_at("2024-03-01");

        assert_eq!(engine.spend_segments(&snapshot)[0].segment, SpendSegment::HighSpender);

        engine.config.high_spender_threshold = Money::from_units(5000);
        engine.config.mid_spender_threshold = Money::from_units(1000);
        assert_eq!(engine.spend_segments(&snapshot)[0].segment, SpendSegment::MidSpender);

        engine.config.top_products_per_customer = 0;
        assert!(engine.top_products_per_customer(&snapshot).is_empty());
    }

    #[test]
    fn test_example_from_three_transactions() {
        let snapshot = alice_and_bob();
        let engine = engine_at("2024-03-01");

        let totals = engine.total_spend_per_customer(&snapshot);
        assert_eq!(totals[0].total_spent, Money::from_units(1200));
        assert_eq!(totals[1].total_spent, Money::from_units(100));

        let segments = engine.spend_segments(&snapshot);
        assert_eq!(segments[0].segment, SpendSegment::HighSpender);
        assert_eq!(segments[1].segment, SpendSegment::LowSpender);

        let alice: Vec<Money> = engine
            .running_spend(&snapshot)
            .into_iter()
            .filter(|r| r.customer_id == 1)
            .map(|r| r.cumulative_spent)
            .collect();
        assert_eq!(alice, vec![Money::from_units(600), Money::from_units(1200)]);
    }
}
