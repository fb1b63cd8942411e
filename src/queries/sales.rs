// 🛒 Sales breakdowns (#9, #10, #13)

use super::joins::with_customers_and_products;
use crate::entities::Snapshot;
use crate::money::{Money, Percent};
use chrono::Datelike;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

// ============================================================================
// #9 CATEGORY SHARE OF TOTAL SALES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_sales: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub total_sales: Money,
    /// None when total sales across all categories is zero
    pub percent_of_total_sales: Option<Percent>,
}

/// Stage 1 of #9: sales per product category, in category order.
/// Transactions for unknown products have no category and are dropped.
pub fn category_totals(snapshot: &Snapshot) -> Vec<CategoryTotal> {
    let products = snapshot.products_by_id();
    let mut totals: BTreeMap<&str, Money> = BTreeMap::new();

    for t in &snapshot.transactions {
        if let Some(product) = products.get(&t.product_id) {
            *totals.entry(product.category.as_str()).or_default() += t.amount_spent;
        }
    }

    totals
        .into_iter()
        .map(|(category, total_sales)| CategoryTotal {
            category: category.to_string(),
            total_sales,
        })
        .collect()
}

/// Stage 2 of #9: divide each category by the global total.
///
/// Largest share first, ties by category name.
pub fn category_shares(totals: &[CategoryTotal]) -> Vec<CategoryShare> {
    let grand_total: Money = totals.iter().map(|t| t.total_sales).sum();

    let mut rows: Vec<CategoryShare> = totals
        .iter()
        .map(|t| CategoryShare {
            category: t.category.clone(),
            total_sales: t.total_sales,
            percent_of_total_sales: Percent::of(t.total_sales, grand_total),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_sales
            .cmp(&a.total_sales)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

/// #9
pub fn category_sales_share(snapshot: &Snapshot) -> Vec<CategoryShare> {
    let rows = category_shares(&category_totals(snapshot));
    debug!(rows = rows.len(), "category_sales_share");
    rows
}

// ============================================================================
// #10 MONTHLY SALES
// ============================================================================

/// Calendar month, displayed `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        YearMonth { year, month }
    }

    pub fn of<D: Datelike>(date: &D) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub month: YearMonth,
    pub total_sales: Money,
    pub transaction_count: usize,
}

/// Sales per calendar month, earliest first. Months without sales are
/// absent; undated transactions are left out.
pub fn monthly_sales(snapshot: &Snapshot) -> Vec<MonthlySales> {
    let mut months: BTreeMap<YearMonth, (Money, usize)> = BTreeMap::new();

    for t in &snapshot.transactions {
        if let Some(date) = t.transaction_date {
            let entry = months.entry(YearMonth::of(&date)).or_default();
            entry.0 += t.amount_spent;
            entry.1 += 1;
        }
    }

    let rows: Vec<MonthlySales> = months
        .into_iter()
        .map(|(month, (total_sales, transaction_count))| MonthlySales {
            month,
            total_sales,
            transaction_count,
        })
        .collect();

    debug!(rows = rows.len(), "monthly_sales");
    rows
}

// ============================================================================
// #13 PRODUCT POPULARITY PER REGION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalProductPopularity {
    pub region_id: i64,
    pub region_name: String,
    pub product_id: i64,
    pub product_name: String,
    pub purchase_count: usize,
}

/// Purchases per (region, product), grouped by region, most purchased first
/// within a region (ties by product_id). Customers without a known region
/// are dropped.
pub fn product_popularity_by_region(snapshot: &Snapshot) -> Vec<RegionalProductPopularity> {
    let regions = snapshot.regions_by_id();
    let mut counts: HashMap<(i64, i64), RegionalProductPopularity> = HashMap::new();

    for (_, c, p) in with_customers_and_products(snapshot) {
        let Some(region) = c.region_id.and_then(|id| regions.get(&id)) else {
            continue;
        };

        counts
            .entry((region.region_id, p.product_id))
            .or_insert_with(|| RegionalProductPopularity {
                region_id: region.region_id,
                region_name: region.region_name.clone(),
                product_id: p.product_id,
                product_name: p.product_name.clone(),
                purchase_count: 0,
            })
            .purchase_count += 1;
    }

    let mut rows: Vec<RegionalProductPopularity> = counts.into_values().collect();
    rows.sort_by(|a, b| {
        a.region_id
            .cmp(&b.region_id)
            .then(b.purchase_count.cmp(&a.purchase_count))
            .then(a.product_id.cmp(&b.product_id))
    });

    debug!(rows = rows.len(), "product_popularity_by_region");
    rows
}
