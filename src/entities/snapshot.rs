// 📸 Snapshot - the four relations as read at one point in time

use super::{Customer, Product, Region, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only view of Customers, Transactions, Products and Regions.
///
/// Every query takes `&Snapshot`; nothing in the analytical layer mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub customers: Vec<Customer>,
    pub transactions: Vec<Transaction>,
    pub products: Vec<Product>,
    #[serde(default)]
    pub regions: Vec<Region>,
}

impl Snapshot {
    pub fn new(
        customers: Vec<Customer>,
        transactions: Vec<Transaction>,
        products: Vec<Product>,
        regions: Vec<Region>,
    ) -> Self {
        Snapshot {
            customers,
            transactions,
            products,
            regions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
            && self.transactions.is_empty()
            && self.products.is_empty()
            && self.regions.is_empty()
    }

    pub fn customers_by_id(&self) -> HashMap<i64, &Customer> {
        self.customers.iter().map(|c| (c.customer_id, c)).collect()
    }

    pub fn products_by_id(&self) -> HashMap<i64, &Product> {
        self.products.iter().map(|p| (p.product_id, p)).collect()
    }

    pub fn regions_by_id(&self) -> HashMap<i64, &Region> {
        self.regions.iter().map(|r| (r.region_id, r)).collect()
    }

    /// Transactions whose customer or product does not exist
    pub fn orphaned_transactions(&self) -> Vec<&Transaction> {
        let customers = self.customers_by_id();
        let products = self.products_by_id();

        self.transactions
            .iter()
            .filter(|t| {
                !customers.contains_key(&t.customer_id) || !products.contains_key(&t.product_id)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_orphaned_transactions() {
        let snapshot = Snapshot::new(
            vec![Customer::new(1, "Alice")],
            vec![
                Transaction::new(10, 1, 100, None, Money::from_units(5)),
                Transaction::new(11, 2, 100, None, Money::from_units(5)), // no customer 2
                Transaction::new(12, 1, 999, None, Money::from_units(5)), // no product 999
            ],
            vec![Product::new(100, "Widget", "Tools")],
            vec![],
        );

        let orphans: Vec<i64> = snapshot
            .orphaned_transactions()
            .iter()
            .map(|t| t.transaction_id)
            .collect();

        assert_eq!(orphans, vec![11, 12]);
        assert!(!snapshot.is_empty());
        assert!(Snapshot::default().is_empty());
    }
}
