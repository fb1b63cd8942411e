// 📈 Running cumulative spend (#5)

use super::joins::with_customers;
use super::window;
use crate::entities::Snapshot;
use crate::money::Money;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningSpend {
    pub customer_id: i64,
    pub customer_name: String,
    pub transaction_id: i64,
    pub transaction_date: NaiveDateTime,
    pub amount_spent: Money,
    pub cumulative_spent: Money,
}

/// Cumulative spend per customer in date order.
///
/// The sum resets for each customer. Transactions with the same timestamp
/// are accumulated one at a time in transaction_id order. Undated
/// transactions are left out.
pub fn running_spend(snapshot: &Snapshot) -> Vec<RunningSpend> {
    let mut dated: Vec<RunningSpend> = with_customers(snapshot)
        .into_iter()
        .filter_map(|(t, c)| {
            t.transaction_date.map(|date| RunningSpend {
                customer_id: c.customer_id,
                customer_name: c.name.clone(),
                transaction_id: t.transaction_id,
                transaction_date: date,
                amount_spent: t.amount_spent,
                cumulative_spent: Money::ZERO,
            })
        })
        .collect();

    dated.sort_by(|a, b| {
        a.customer_id
            .cmp(&b.customer_id)
            .then(a.transaction_date.cmp(&b.transaction_date))
            .then(a.transaction_id.cmp(&b.transaction_id))
    });

    let sums = window::running_sum(&dated, |r| r.customer_id, |r| r.amount_spent);
    for (row, sum) in dated.iter_mut().zip(sums) {
        row.cumulative_spent = sum;
    }

    debug!(rows = dated.len(), "running_spend");
    dated
}
