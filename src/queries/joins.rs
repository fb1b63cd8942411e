// 🔗 Row-level joins (#1, #2)
//
// Inner-join semantics: a transaction whose customer (or product) is missing
// is dropped, not reported with blanks.

use crate::entities::{Customer, Product, Snapshot, Transaction};
use crate::money::Money;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerTransaction {
    pub transaction_id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub transaction_date: Option<NaiveDateTime>,
    pub amount_spent: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProductTransaction {
    pub transaction_id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub transaction_date: Option<NaiveDateTime>,
    pub amount_spent: Money,
}

/// Transactions paired with their customer, in transaction_id order
pub(crate) fn with_customers(snapshot: &Snapshot) -> Vec<(&Transaction, &Customer)> {
    let customers = snapshot.customers_by_id();

    let mut joined: Vec<(&Transaction, &Customer)> = snapshot
        .transactions
        .iter()
        .filter_map(|t| customers.get(&t.customer_id).map(|c| (t, *c)))
        .collect();

    joined.sort_by_key(|(t, _)| t.transaction_id);
    joined
}

/// Transactions paired with customer and product, in transaction_id order
pub(crate) fn with_customers_and_products(
    snapshot: &Snapshot,
) -> Vec<(&Transaction, &Customer, &Product)> {
    let products = snapshot.products_by_id();

    with_customers(snapshot)
        .into_iter()
        .filter_map(|(t, c)| products.get(&t.product_id).map(|p| (t, c, *p)))
        .collect()
}

/// #1 - one row per transaction with its customer
pub fn customer_transactions(snapshot: &Snapshot) -> Vec<CustomerTransaction> {
    let rows: Vec<CustomerTransaction> = with_customers(snapshot)
        .into_iter()
        .map(|(t, c)| CustomerTransaction {
            transaction_id: t.transaction_id,
            customer_id: c.customer_id,
            customer_name: c.name.clone(),
            transaction_date: t.transaction_date,
            amount_spent: t.amount_spent,
        })
        .collect();

    debug!(rows = rows.len(), "customer_transactions");
    rows
}

/// #2 - one row per transaction with its customer and product
pub fn customer_product_transactions(snapshot: &Snapshot) -> Vec<CustomerProductTransaction> {
    let rows: Vec<CustomerProductTransaction> = with_customers_and_products(snapshot)
        .into_iter()
        .map(|(t, c, p)| CustomerProductTransaction {
            transaction_id: t.transaction_id,
            customer_id: c.customer_id,
            customer_name: c.name.clone(),
            product_id: p.product_id,
            product_name: p.product_name.clone(),
            category: p.category.clone(),
            transaction_date: t.transaction_date,
            amount_spent: t.amount_spent,
        })
        .collect();

    debug!(rows = rows.len(), "customer_product_transactions");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures::*;

    #[test]
    fn test_customer_transactions_inner_join() {
        let mut snapshot = alice_and_bob();
        // Customer 99 does not exist
        snapshot.transactions.push(tx(200, 99, 1, "2024-01-05", "10.00"));

        let rows = customer_transactions(&snapshot);

        assert_eq!(rows.len(), 3);
        let ids: Vec<i64> = rows.iter().map(|r| r.transaction_id).collect();
        assert_eq!(ids, vec![101, 102, 103]);
        assert_eq!(rows[0].customer_name, "Alice");
        assert_eq!(rows[2].customer_name, "Bob");
    }

    #[test]
    fn test_customer_product_transactions_drops_unknown_products() {
        let mut snapshot = alice_and_bob();
        snapshot.transactions.push(tx(104, 2, 42, "2024-01-07", "15.00"));

        let rows = customer_product_transactions(&snapshot);

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.product_name == "Laptop"));
        assert!(rows.iter().all(|r| r.category == "Electronics"));
    }

    #[test]
    fn test_joins_on_empty_snapshot() {
        let snapshot = Snapshot::default();
        assert!(customer_transactions(&snapshot).is_empty());
        assert!(customer_product_transactions(&snapshot).is_empty());
    }
}
