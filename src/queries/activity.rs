// 🕒 Customer activity over time (#8, #11, #14)
//
// All three work on dated transactions only. Churn and high-frequency
// checks take the reference time as an argument; nothing here reads the
// wall clock.

use super::joins::with_customers;
use crate::entities::Snapshot;
use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

// ============================================================================
// #8 REPEAT CUSTOMERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatCustomer {
    pub customer_id: i64,
    pub customer_name: String,
    /// Distinct calendar days with at least one transaction
    pub active_days: usize,
}

/// Customers active on strictly more than `min_active_days` distinct days
pub fn repeat_customers(snapshot: &Snapshot, min_active_days: usize) -> Vec<RepeatCustomer> {
    let mut days: BTreeMap<i64, (String, BTreeSet<NaiveDate>)> = BTreeMap::new();

    for (t, c) in with_customers(snapshot) {
        if let Some(day) = t.day() {
            days.entry(c.customer_id)
                .or_insert_with(|| (c.name.clone(), BTreeSet::new()))
                .1
                .insert(day);
        }
    }

    let rows: Vec<RepeatCustomer> = days
        .into_iter()
        .filter(|(_, (_, active))| active.len() > min_active_days)
        .map(|(customer_id, (customer_name, active))| RepeatCustomer {
            customer_id,
            customer_name,
            active_days: active.len(),
        })
        .collect();

    debug!(rows = rows.len(), "repeat_customers");
    rows
}

// ============================================================================
// #11 CHURNED CUSTOMERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnedCustomer {
    pub customer_id: i64,
    pub customer_name: String,
    /// None = never transacted (or only undated transactions)
    pub last_transaction_date: Option<NaiveDateTime>,
}

/// Start of the trailing activity window: `now` minus `months` calendar months.
/// Clamps to the end of shorter months (Aug 31 - 6 months = Feb 28/29).
pub fn churn_cutoff(now: NaiveDateTime, months: u32) -> NaiveDateTime {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Customers whose last dated transaction is before the cutoff, plus every
/// customer with no dated transaction at all. Outer join: customers are never
/// dropped for lack of transactions.
pub fn churned_customers(snapshot: &Snapshot, now: NaiveDateTime, months: u32) -> Vec<ChurnedCustomer> {
    let cutoff = churn_cutoff(now, months);

    let mut last_seen: HashMap<i64, NaiveDateTime> = HashMap::new();
    for t in &snapshot.transactions {
        if let Some(date) = t.transaction_date {
            last_seen
                .entry(t.customer_id)
                .and_modify(|last| *last = (*last).max(date))
                .or_insert(date);
        }
    }

    let mut rows: Vec<ChurnedCustomer> = snapshot
        .customers
        .iter()
        .filter_map(|c| {
            let last = last_seen.get(&c.customer_id).copied();
            match last {
                Some(date) if date >= cutoff => None,
                _ => Some(ChurnedCustomer {
                    customer_id: c.customer_id,
                    customer_name: c.name.clone(),
                    last_transaction_date: last,
                }),
            }
        })
        .collect();

    rows.sort_by_key(|r| r.customer_id);

    debug!(rows = rows.len(), %cutoff, "churned_customers");
    rows
}

// ============================================================================
// #14 HIGH-FREQUENCY FLAG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighFrequencyFlag {
    pub customer_id: i64,
    pub customer_name: String,
    pub transaction_count: usize,
    pub first_transaction: NaiveDateTime,
    pub last_transaction: NaiveDateTime,
}

impl HighFrequencyFlag {
    pub fn span(&self) -> Duration {
        self.last_transaction - self.first_transaction
    }
}

/// Flag customers with strictly more than `min_transactions` dated
/// transactions whose first-to-last span is strictly shorter than `window`.
///
/// Only transactions at or before `now` are considered; future-dated rows
/// have not happened yet as of the reference time. The span covers the
/// customer's whole dated history up to `now`, so a burst that ended long
/// before `now` is still flagged as long as nothing else was bought since.
pub fn high_frequency_customers(
    snapshot: &Snapshot,
    now: NaiveDateTime,
    min_transactions: usize,
    window: Duration,
) -> Vec<HighFrequencyFlag> {
    let mut activity: BTreeMap<i64, HighFrequencyFlag> = BTreeMap::new();

    for (t, c) in with_customers(snapshot) {
        let Some(date) = t.transaction_date else {
            continue;
        };
        if date > now {
            continue;
        }

        activity
            .entry(c.customer_id)
            .and_modify(|flag| {
                flag.transaction_count += 1;
                flag.first_transaction = flag.first_transaction.min(date);
                flag.last_transaction = flag.last_transaction.max(date);
            })
            .or_insert_with(|| HighFrequencyFlag {
                customer_id: c.customer_id,
                customer_name: c.name.clone(),
                transaction_count: 1,
                first_transaction: date,
                last_transaction: date,
            });
    }

    let rows: Vec<HighFrequencyFlag> = activity
        .into_values()
        .filter(|flag| flag.transaction_count > min_transactions && flag.span() < window)
        .collect();

    debug!(rows = rows.len(), "high_frequency_customers");
    rows
}
