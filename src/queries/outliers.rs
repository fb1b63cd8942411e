// 📊 Statistical outliers (#15)
//
// Convention: POPULATION standard deviation (divide by n, not n - 1) over
// every transaction in the snapshot.
//
// The band test |x - mean| > k * sigma is rearranged into integers:
//   (n*x - S)^2 > k^2 * (n*Q - S^2)
// where S = sum of cents and Q = sum of squared cents. Mean and sigma are
// only converted to f64 for display (and the z-score).

use crate::entities::Snapshot;
use crate::money::Money;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmountStatistics {
    pub count: usize,
    /// Mean amount, in currency units
    pub mean: f64,
    /// Population standard deviation, in currency units
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierTransaction {
    pub transaction_id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub transaction_date: Option<NaiveDateTime>,
    pub amount_spent: Money,
    /// Signed distance from the mean in standard deviations
    pub z_score: f64,
}

/// Exact sums over amounts in cents
#[derive(Debug, Clone, Copy)]
struct Moments {
    n: i128,
    sum: i128,
    sum_sq: i128,
}

impl Moments {
    fn of(snapshot: &Snapshot) -> Option<Moments> {
        if snapshot.transactions.is_empty() {
            return None;
        }

        let mut m = Moments { n: 0, sum: 0, sum_sq: 0 };
        for t in &snapshot.transactions {
            let x = t.amount_spent.cents() as i128;
            m.n += 1;
            m.sum += x;
            m.sum_sq += x * x;
        }
        Some(m)
    }

    /// n^2 * variance, in cents^2
    fn scaled_variance(&self) -> i128 {
        self.n * self.sum_sq - self.sum * self.sum
    }

    fn statistics(&self) -> AmountStatistics {
        let n = self.n as f64;
        AmountStatistics {
            count: self.n as usize,
            mean: self.sum as f64 / n / 100.0,
            std_dev: (self.scaled_variance() as f64).sqrt() / n / 100.0,
        }
    }

    fn is_outlier(&self, amount: Money, sigmas: u32) -> bool {
        let k = sigmas as i128;
        let deviation = self.n * amount.cents() as i128 - self.sum;

        let exact = deviation
            .checked_mul(deviation)
            .zip(k.checked_mul(k).and_then(|k2| k2.checked_mul(self.scaled_variance())));

        match exact {
            Some((lhs, rhs)) => lhs > rhs,
            // Astronomical totals: fall back to floating point
            None => {
                let stats = self.statistics();
                (amount.as_f64() - stats.mean).abs() > sigmas as f64 * stats.std_dev
            }
        }
    }
}

/// Count, mean and population standard deviation of amount_spent.
/// None when there are no transactions.
pub fn amount_statistics(snapshot: &Snapshot) -> Option<AmountStatistics> {
    Moments::of(snapshot).map(|m| m.statistics())
}

/// Transactions whose amount lies strictly outside mean ± `sigmas` sigma,
/// in transaction_id order. A constant amount column has no outliers.
pub fn outlier_transactions(snapshot: &Snapshot, sigmas: u32) -> Vec<OutlierTransaction> {
    let Some(moments) = Moments::of(snapshot) else {
        return Vec::new();
    };
    let stats = moments.statistics();

    let mut rows: Vec<OutlierTransaction> = snapshot
        .transactions
        .iter()
        .filter(|t| moments.is_outlier(t.amount_spent, sigmas))
        .map(|t| OutlierTransaction {
            transaction_id: t.transaction_id,
            customer_id: t.customer_id,
            product_id: t.product_id,
            transaction_date: t.transaction_date,
            amount_spent: t.amount_spent,
            z_score: (t.amount_spent.as_f64() - stats.mean) / stats.std_dev,
        })
        .collect();

    rows.sort_by_key(|r| r.transaction_id);

    debug!(
        rows = rows.len(),
        mean = stats.mean,
        std_dev = stats.std_dev,
        "outlier_transactions"
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures::*;

    fn amounts_snapshot(amounts: &[&str]) -> Snapshot {
        let transactions = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| tx(i as i64 + 1, 1, 1, "2024-01-01", a))
            .collect();
        snapshot_with(vec![customer(1, "Alice")], transactions)
    }

    #[test]
    fn test_population_std_dev() {
        // Classic example: population sigma = 2, sample sigma = 2.138
        let snapshot = amounts_snapshot(&["2", "4", "4", "4", "5", "5", "7", "9"]);
        let stats = amount_statistics(&snapshot).unwrap();

        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-9);
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_detects_outlier() {
        let mut amounts = vec!["10.00"; 20];
        amounts.push("1000.00");
        let snapshot = amounts_snapshot(&amounts);

        let rows = outlier_transactions(&snapshot, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_id, 21);
        assert!(rows[0].z_score > 3.0);
    }

    #[test]
    fn test_band_boundary_is_exclusive() {
        // mean 5, population sigma 2: with k = 1, band is [3, 7]
        let snapshot = amounts_snapshot(&["2", "4", "4", "4", "5", "5", "7", "9"]);
        let ids: Vec<i64> = outlier_transactions(&snapshot, 1)
            .iter()
            .map(|r| r.transaction_id)
            .collect();

        // 2 and 9 are outside; 7 sits exactly on the edge and is kept in
        assert_eq!(ids, vec![1, 8]);
    }

    #[test]
    fn test_population_sigma_flags_what_sample_sigma_would_not() {
        // mean 10, population sigma sqrt(2/3) = 0.816, sample sigma exactly 1.
        // At k = 1 both ends are outliers; with sample sigma they would sit
        // on the band edge and be kept.
        let snapshot = amounts_snapshot(&["9", "10", "11"]);
        let rows = outlier_transactions(&snapshot, 1);

        let ids: Vec<i64> = rows.iter().map(|r| r.transaction_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!((rows[1].z_score - 1.5_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_constant_amounts_have_no_outliers() {
        let snapshot = amounts_snapshot(&["25.00", "25.00", "25.00"]);
        assert!(outlier_transactions(&snapshot, 3).is_empty());
        assert_eq!(amount_statistics(&snapshot).unwrap().std_dev, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let snapshot = Snapshot::default();
        assert!(outlier_transactions(&snapshot, 3).is_empty());
        assert!(amount_statistics(&snapshot).is_none());
    }
}
