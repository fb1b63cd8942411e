// 🏆 Rankings (#6, #12)
//
// Top products per customer is two stages: aggregate spend per
// (customer, product), then number rows within each customer and cut off.

use super::joins::with_customers_and_products;
use super::spending::total_spend_per_customer;
use super::window;
use crate::entities::Snapshot;
use crate::money::{ExactAverage, Money};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// #6 TOP PRODUCTS PER CUSTOMER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProductSpend {
    pub customer_id: i64,
    pub customer_name: String,
    pub product_id: i64,
    pub product_name: String,
    pub total_spent: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProduct {
    pub customer_id: i64,
    pub customer_name: String,
    pub product_id: i64,
    pub product_name: String,
    pub total_spent: Money,
    /// 1-indexed position within the customer
    pub rank: usize,
}

/// Stage 1 of #6: spend per (customer, product)
pub fn customer_product_spend(snapshot: &Snapshot) -> Vec<CustomerProductSpend> {
    let mut spend: BTreeMap<(i64, i64), CustomerProductSpend> = BTreeMap::new();

    for (t, c, p) in with_customers_and_products(snapshot) {
        spend
            .entry((c.customer_id, p.product_id))
            .or_insert_with(|| CustomerProductSpend {
                customer_id: c.customer_id,
                customer_name: c.name.clone(),
                product_id: p.product_id,
                product_name: p.product_name.clone(),
                total_spent: Money::ZERO,
            })
            .total_spent += t.amount_spent;
    }

    spend.into_values().collect()
}

/// Stage 2 of #6: keep at most `limit` products per customer.
///
/// Products are ordered by spend descending, equal spend by product_id, and
/// numbered 1..; anything past `limit` is dropped even when tied.
pub fn top_products(spend: &[CustomerProductSpend], limit: usize) -> Vec<RankedProduct> {
    let mut sorted: Vec<&CustomerProductSpend> = spend.iter().collect();
    sorted.sort_by(|a, b| {
        a.customer_id
            .cmp(&b.customer_id)
            .then(b.total_spent.cmp(&a.total_spent))
            .then(a.product_id.cmp(&b.product_id))
    });

    let numbers = window::row_numbers(&sorted, |s| s.customer_id);

    sorted
        .into_iter()
        .zip(numbers)
        .filter(|(_, rank)| *rank <= limit)
        .map(|(s, rank)| RankedProduct {
            customer_id: s.customer_id,
            customer_name: s.customer_name.clone(),
            product_id: s.product_id,
            product_name: s.product_name.clone(),
            total_spent: s.total_spent,
            rank,
        })
        .collect()
}

/// #6
pub fn top_products_per_customer(snapshot: &Snapshot, limit: usize) -> Vec<RankedProduct> {
    let rows = top_products(&customer_product_spend(snapshot), limit);
    debug!(rows = rows.len(), limit, "top_products_per_customer");
    rows
}

// ============================================================================
// #12 CUSTOMER RANKING BY AVERAGE TRANSACTION VALUE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRank {
    pub customer_id: i64,
    pub customer_name: String,
    /// Rounded to the cent; ranking uses the exact average
    pub avg_spent: Money,
    pub spending_rank: usize,
}

/// Rank customers by average transaction value, highest first.
///
/// Equal averages share a rank and the next rank skips (1, 1, 3).
pub fn rank_customers_by_average(snapshot: &Snapshot) -> Vec<CustomerRank> {
    let mut averages: Vec<(ExactAverage, i64, String)> = total_spend_per_customer(snapshot)
        .into_iter()
        .map(|t| (t.average(), t.customer_id, t.customer_name))
        .collect();

    averages.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let ranks = window::ranks(&averages, |_| (), |a, b| a.0 == b.0);

    let rows: Vec<CustomerRank> = averages
        .into_iter()
        .zip(ranks)
        .map(|((avg, customer_id, customer_name), spending_rank)| CustomerRank {
            customer_id,
            customer_name,
            avg_spent: avg.rounded(),
            spending_rank,
        })
        .collect();

    debug!(rows = rows.len(), "rank_customers_by_average");
    rows
}
