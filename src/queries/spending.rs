// 💰 Customer spending (#3, #4, #7)
//
// Totals are aggregated first; segmentation and frequency filters are a
// second stage over those totals, never applied per transaction.

use super::joins::with_customers;
use crate::entities::Snapshot;
use crate::money::{ExactAverage, Money};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

// ============================================================================
// #3 TOTAL SPEND PER CUSTOMER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerTotal {
    pub customer_id: i64,
    pub customer_name: String,
    pub total_spent: Money,
    pub transaction_count: usize,
}

impl CustomerTotal {
    pub fn average(&self) -> ExactAverage {
        ExactAverage::new(self.total_spent, self.transaction_count)
    }
}

/// Customers with at least one transaction, highest total first
/// (ties: lower customer_id first).
pub fn total_spend_per_customer(snapshot: &Snapshot) -> Vec<CustomerTotal> {
    let mut totals: BTreeMap<i64, CustomerTotal> = BTreeMap::new();

    for (t, c) in with_customers(snapshot) {
        let entry = totals.entry(c.customer_id).or_insert_with(|| CustomerTotal {
            customer_id: c.customer_id,
            customer_name: c.name.clone(),
            total_spent: Money::ZERO,
            transaction_count: 0,
        });
        entry.total_spent += t.amount_spent;
        entry.transaction_count += 1;
    }

    let mut rows: Vec<CustomerTotal> = totals.into_values().collect();
    rows.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then(a.customer_id.cmp(&b.customer_id))
    });

    debug!(rows = rows.len(), "total_spend_per_customer");
    rows
}

// ============================================================================
// #4 SPEND SEGMENTATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpendSegment {
    #[serde(rename = "High-Spender")]
    HighSpender,
    #[serde(rename = "Mid-Spender")]
    MidSpender,
    #[serde(rename = "Low-Spender")]
    LowSpender,
}

impl SpendSegment {
    /// High: total > high. Mid: mid <= total <= high. Low: below mid.
    pub fn classify(total: Money, high: Money, mid: Money) -> SpendSegment {
        if total > high {
            SpendSegment::HighSpender
        } else if total >= mid {
            SpendSegment::MidSpender
        } else {
            SpendSegment::LowSpender
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpendSegment::HighSpender => "High-Spender",
            SpendSegment::MidSpender => "Mid-Spender",
            SpendSegment::LowSpender => "Low-Spender",
        }
    }
}

impl fmt::Display for SpendSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSegment {
    pub customer_id: i64,
    pub customer_name: String,
    pub total_spent: Money,
    pub segment: SpendSegment,
}

/// Stage 2 of #4: label already-aggregated totals, keeping their order
pub fn segment_customers(totals: &[CustomerTotal], high: Money, mid: Money) -> Vec<CustomerSegment> {
    totals
        .iter()
        .map(|t| CustomerSegment {
            customer_id: t.customer_id,
            customer_name: t.customer_name.clone(),
            total_spent: t.total_spent,
            segment: SpendSegment::classify(t.total_spent, high, mid),
        })
        .collect()
}

/// #4 - totals (#3) then segmentation
pub fn spend_segments(snapshot: &Snapshot, high: Money, mid: Money) -> Vec<CustomerSegment> {
    let rows = segment_customers(&total_spend_per_customer(snapshot), high, mid);
    debug!(rows = rows.len(), "spend_segments");
    rows
}

// ============================================================================
// #7 AVERAGE TRANSACTION VALUE FOR FREQUENT CUSTOMERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentCustomer {
    pub customer_id: i64,
    pub customer_name: String,
    pub transaction_count: usize,
    /// Rounded to the cent
    pub avg_spent: Money,
}

/// Customers with strictly more than `min_transactions` transactions,
/// in customer_id order.
pub fn frequent_customer_averages(snapshot: &Snapshot, min_transactions: usize) -> Vec<FrequentCustomer> {
    let mut rows: Vec<FrequentCustomer> = total_spend_per_customer(snapshot)
        .into_iter()
        .filter(|t| t.transaction_count > min_transactions)
        .map(|t| FrequentCustomer {
            avg_spent: t.average().rounded(),
            customer_id: t.customer_id,
            customer_name: t.customer_name,
            transaction_count: t.transaction_count,
        })
        .collect();

    rows.sort_by_key(|r| r.customer_id);

    debug!(rows = rows.len(), min_transactions, "frequent_customer_averages");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures::*;

    fn high() -> Money {
        Money::from_units(1000)
    }

    fn mid() -> Money {
        Money::from_units(500)
    }

    #[test]
    fn test_alice_and_bob_totals() {
        let rows = total_spend_per_customer(&alice_and_bob());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].customer_name, "Alice");
        assert_eq!(rows[0].total_spent, Money::from_units(1200));
        assert_eq!(rows[0].transaction_count, 2);
        assert_eq!(rows[1].customer_name, "Bob");
        assert_eq!(rows[1].total_spent, Money::from_units(100));
    }

    #[test]
    fn test_totals_exclude_customers_without_transactions() {
        let mut snapshot = alice_and_bob();
        snapshot.customers.push(customer(3, "Carol"));

        let rows = total_spend_per_customer(&snapshot);
        assert!(rows.iter().all(|r| r.customer_id != 3));
        assert!(frequent_customer_averages(&snapshot, 0)
            .iter()
            .all(|r| r.customer_id != 3));
    }

    #[test]
    fn test_totals_tie_broken_by_customer_id() {
        let snapshot = snapshot_with(
            vec![customer(5, "Eve"), customer(2, "Bob")],
            vec![
                tx(1, 5, 1, "2024-01-01", "50.00"),
                tx(2, 2, 1, "2024-01-01", "50.00"),
            ],
        );

        let ids: Vec<i64> = total_spend_per_customer(&snapshot)
            .iter()
            .map(|r| r.customer_id)
            .collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn test_segment_boundaries() {
        assert_eq!(
            SpendSegment::classify(Money::from_units(1000), high(), mid()),
            SpendSegment::MidSpender
        );
        assert_eq!(
            SpendSegment::classify("1000.01".parse::<Money>().unwrap(), high(), mid()),
            SpendSegment::HighSpender
        );
        assert_eq!(
            SpendSegment::classify(Money::from_units(500), high(), mid()),
            SpendSegment::MidSpender
        );
        assert_eq!(
            SpendSegment::classify("499.99".parse::<Money>().unwrap(), high(), mid()),
            SpendSegment::LowSpender
        );
        assert_eq!(SpendSegment::HighSpender.to_string(), "High-Spender");
    }

    #[test]
    fn test_segments_follow_totals() {
        let segments = spend_segments(&alice_and_bob(), high(), mid());

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].customer_name, "Alice");
        assert_eq!(segments[0].segment, SpendSegment::HighSpender);
        assert_eq!(segments[1].customer_name, "Bob");
        assert_eq!(segments[1].segment, SpendSegment::LowSpender);
    }

    #[test]
    fn test_segmentation_applies_after_aggregation() {
        // Three 400.00 purchases: each is Low on its own, the total is High
        let snapshot = snapshot_with(
            vec![customer(1, "Alice")],
            vec![
                tx(1, 1, 1, "2024-01-01", "400.00"),
                tx(2, 1, 1, "2024-01-02", "400.00"),
                tx(3, 1, 1, "2024-01-03", "400.00"),
            ],
        );

        let segments = spend_segments(&snapshot, high(), mid());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].segment, SpendSegment::HighSpender);
    }

    #[test]
    fn test_segment_serializes_label() {
        let json = serde_json::to_string(&SpendSegment::MidSpender).unwrap();
        assert_eq!(json, "\"Mid-Spender\"");
    }

    #[test]
    fn test_frequent_customers_need_more_than_five() {
        let mut transactions = Vec::new();
        for i in 0..6 {
            transactions.push(tx(i, 1, 1, "2024-01-01", "10.00"));
        }
        for i in 10..15 {
            transactions.push(tx(i, 2, 1, "2024-01-01", "10.00"));
        }
        transactions.push(tx(20, 1, 1, "2024-01-02", "20.01"));

        let snapshot = snapshot_with(vec![customer(1, "Alice"), customer(2, "Bob")], transactions);
        let rows = frequent_customer_averages(&snapshot, 5);

        // Bob has exactly five and is excluded
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customer_id, 1);
        assert_eq!(rows[0].transaction_count, 7);
        // 80.01 / 7 = 11.43
        assert_eq!(rows[0].avg_spent, "11.43".parse::<Money>().unwrap());
    }

    #[test]
    fn test_empty_input() {
        let snapshot = Snapshot::default();
        assert!(total_spend_per_customer(&snapshot).is_empty());
        assert!(spend_segments(&snapshot, high(), mid()).is_empty());
        assert!(frequent_customer_averages(&snapshot, 5).is_empty());
    }
}
