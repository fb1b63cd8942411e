// 🪟 Window primitives - sort-then-scan
//
// Each function expects `rows` already sorted by (partition key, order key)
// and returns one value per row, in the same order. Per-partition state
// resets whenever the partition key changes.

use crate::money::Money;

/// Cumulative sum per partition, one row at a time (ROWS frame).
pub fn running_sum<T, K, P, V>(rows: &[T], partition: P, value: V) -> Vec<Money>
where
    K: PartialEq,
    P: Fn(&T) -> K,
    V: Fn(&T) -> Money,
{
    let mut out = Vec::with_capacity(rows.len());
    let mut current: Option<K> = None;
    let mut sum = Money::ZERO;

    for row in rows {
        let key = partition(row);
        if current.as_ref() != Some(&key) {
            sum = Money::ZERO;
            current = Some(key);
        }
        sum += value(row);
        out.push(sum);
    }

    out
}

/// ROW_NUMBER(): 1, 2, 3, ... per partition, ties broken by input order.
pub fn row_numbers<T, K, P>(rows: &[T], partition: P) -> Vec<usize>
where
    K: PartialEq,
    P: Fn(&T) -> K,
{
    let mut out = Vec::with_capacity(rows.len());
    let mut current: Option<K> = None;
    let mut n = 0;

    for row in rows {
        let key = partition(row);
        if current.as_ref() != Some(&key) {
            n = 0;
            current = Some(key);
        }
        n += 1;
        out.push(n);
    }

    out
}

/// RANK(): peers share a rank and the next distinct value skips ahead
/// (1, 1, 3). `peers` decides whether two adjacent rows tie.
pub fn ranks<T, K, P, E>(rows: &[T], partition: P, peers: E) -> Vec<usize>
where
    K: PartialEq,
    P: Fn(&T) -> K,
    E: Fn(&T, &T) -> bool,
{
    let mut out = Vec::with_capacity(rows.len());
    let mut current: Option<K> = None;
    let mut position = 0;
    let mut rank = 0;

    for (i, row) in rows.iter().enumerate() {
        let key = partition(row);
        if current.as_ref() != Some(&key) {
            position = 0;
            rank = 0;
            current = Some(key);
        }
        position += 1;
        if position == 1 || !peers(&rows[i - 1], row) {
            rank = position;
        }
        out.push(rank);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_sum_resets_per_partition() {
        let rows = vec![("a", 100), ("a", 250), ("b", 10), ("b", 5), ("a", 1)];
        let sums = running_sum(&rows, |r| r.0, |r| Money::from_cents(r.1));

        let cents: Vec<i64> = sums.iter().map(Money::cents).collect();
        // "a" appears again after "b", so it starts a fresh partition
        assert_eq!(cents, vec![100, 350, 10, 15, 1]);
    }

    #[test]
    fn test_row_numbers() {
        let rows = vec![1, 1, 1, 2, 3, 3];
        assert_eq!(row_numbers(&rows, |r| *r), vec![1, 2, 3, 1, 1, 2]);
    }

    #[test]
    fn test_ranks_with_ties() {
        // (partition, score) sorted by score desc within partition
        let rows = vec![(1, 90), (1, 90), (1, 80), (1, 80), (1, 70), (2, 50), (2, 50)];
        let r = ranks(&rows, |r| r.0, |a, b| a.1 == b.1);
        assert_eq!(r, vec![1, 1, 3, 3, 5, 1, 1]);
    }

    #[test]
    fn test_empty_input() {
        let rows: Vec<(i32, i64)> = vec![];
        assert!(running_sum(&rows, |r| r.0, |r| Money::from_cents(r.1)).is_empty());
        assert!(row_numbers(&rows, |r| r.0).is_empty());
        assert!(ranks(&rows, |r| r.0, |a, b| a.1 == b.1).is_empty());
    }
}
