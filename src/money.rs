// 💵 Money & Percent - exact fixed-point amounts
//
// Amounts are stored as integer cents so that sums over many transactions
// never drift. Only the outlier statistics leave integer space (for sqrt).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

// ============================================================================
// MONEY
// ============================================================================

/// Monetary amount in cents.
///
/// Serialized as a decimal string ("1200.00") so no precision is lost in JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole units, e.g. `Money::from_units(1000)` is 1000.00
    pub fn from_units(units: i64) -> Self {
        Money(units.saturating_mul(100))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Average of `count` amounts summing to `total`, rounded half away from
    /// zero to the cent. Returns zero for an empty group.
    pub fn average(total: Money, count: usize) -> Money {
        if count == 0 {
            return Money::ZERO;
        }
        Money(div_round_half_away(total.0 as i128, count as i128) as i64)
    }
}

/// Integer division rounding half away from zero. `den` must be positive.
pub(crate) fn div_round_half_away(num: i128, den: i128) -> i128 {
    let quotient = num / den;
    let remainder = num % den;
    if remainder.abs() * 2 >= den {
        quotient + num.signum()
    } else {
        quotient
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = anyhow::Error;

    /// Parses "600", "600.5", "600.50", "-12.30" and "$1,200.00".
    /// More than two fractional digits is rejected rather than rounded.
    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| *c != '$' && *c != ',')
            .collect();

        if cleaned.is_empty() {
            bail!("empty amount");
        }

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if frac.len() > 2 {
            bail!("amount '{}' has more than two decimal places", s);
        }
        if whole.is_empty() && frac.is_empty() {
            bail!("invalid amount '{}'", s);
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            bail!("invalid amount '{}'", s);
        }

        let whole_cents: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .with_context(|| format!("invalid amount '{}'", s))?
                .checked_mul(100)
                .with_context(|| format!("amount '{}' out of range", s))?
        };
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>()? * 10,
            _ => frac.parse::<i64>()?,
        };

        let cents = whole_cents
            .checked_add(frac_cents)
            .with_context(|| format!("amount '{}' out of range", s))?;
        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl TryFrom<String> for Money {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

// Totals saturate at the i64 bounds instead of wrapping around
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// ============================================================================
// EXACT AVERAGE
// ============================================================================

/// Average kept as a fraction so that comparisons (ranking, ties) are exact.
#[derive(Debug, Clone, Copy)]
pub struct ExactAverage {
    pub total: Money,
    pub count: usize,
}

impl ExactAverage {
    pub fn new(total: Money, count: usize) -> Self {
        ExactAverage { total, count }
    }

    /// Rounded to the cent for display
    pub fn rounded(&self) -> Money {
        Money::average(self.total, self.count)
    }
}

impl PartialEq for ExactAverage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ExactAverage {}

impl PartialOrd for ExactAverage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExactAverage {
    // a/b vs c/d  <=>  a*d vs c*b  (b, d > 0)
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.total.0 as i128 * other.count.max(1) as i128;
        let rhs = other.total.0 as i128 * self.count.max(1) as i128;
        lhs.cmp(&rhs)
    }
}

// ============================================================================
// PERCENT
// ============================================================================

/// Percentage with two decimals, stored as hundredths of a percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percent(i64);

impl Percent {
    /// `100 * part / whole`, rounded to two decimals.
    /// Returns `None` when `whole` is zero: there is nothing to divide by.
    pub fn of(part: Money, whole: Money) -> Option<Percent> {
        if whole.0 == 0 {
            return None;
        }
        let (num, den) = if whole.0 < 0 {
            (-(part.0 as i128) * 10_000, -(whole.0 as i128))
        } else {
            (part.0 as i128 * 10_000, whole.0 as i128)
        };
        Some(Percent(div_round_half_away(num, den) as i64))
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Percent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money() {
        assert_eq!("600".parse::<Money>().unwrap(), Money::from_cents(60_000));
        assert_eq!("600.5".parse::<Money>().unwrap(), Money::from_cents(60_050));
        assert_eq!("1000.01".parse::<Money>().unwrap(), Money::from_cents(100_001));
        assert_eq!("$1,200.00".parse::<Money>().unwrap(), Money::from_cents(120_000));
        assert_eq!(".75".parse::<Money>().unwrap(), Money::from_cents(75));
        assert_eq!("-12.30".parse::<Money>().unwrap(), Money::from_cents(-1_230));

        assert!("".parse::<Money>().is_err());
        assert!("12.345".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
    }

    #[test]
    fn test_parse_money_range() {
        let max = "92233720368547758.07".parse::<Money>().unwrap();
        assert_eq!(max, Money::from_cents(i64::MAX));

        assert!("92233720368547758.08".parse::<Money>().is_err());
        assert!("92233720368547759".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn test_totals_saturate() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max + Money::from_cents(1), max);

        let mut total = max;
        total += Money::from_units(10);
        assert_eq!(total, max);
        assert!(!total.is_negative());

        let total: Money = vec![max, max, max].into_iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_display_money() {
        assert_eq!(Money::from_cents(120_000).to_string(), "1200.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1_230).to_string(), "-12.30");
    }

    #[test]
    fn test_sum_is_exact() {
        // 0.1 summed ten thousand times drifts in f64, never in cents
        let amounts = vec![Money::from_cents(10); 10_000];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, Money::from_units(1_000));
    }

    #[test]
    fn test_average_rounding() {
        assert_eq!(Money::average(Money::from_cents(100), 3), Money::from_cents(33));
        assert_eq!(Money::average(Money::from_cents(200), 3), Money::from_cents(67));
        assert_eq!(Money::average(Money::from_cents(5), 2), Money::from_cents(3));
        assert_eq!(Money::average(Money::from_cents(-5), 2), Money::from_cents(-3));
        assert_eq!(Money::average(Money::from_cents(500), 0), Money::ZERO);
    }

    #[test]
    fn test_exact_average_ordering() {
        let a = ExactAverage::new(Money::from_cents(100), 3); // 33.333..
        let b = ExactAverage::new(Money::from_cents(200), 6); // 33.333..
        let c = ExactAverage::new(Money::from_cents(101), 3); // 33.666..

        assert_eq!(a, b);
        assert!(c > a);
        assert_eq!(a.rounded(), Money::from_cents(33));
        assert_eq!(c.rounded(), Money::from_cents(34));
    }

    #[test]
    fn test_percent_of() {
        let p = Percent::of(Money::from_cents(1), Money::from_cents(3)).unwrap();
        assert_eq!(p.hundredths(), 3_333);
        assert_eq!(p.to_string(), "33.33");

        let p = Percent::of(Money::from_cents(2), Money::from_cents(3)).unwrap();
        assert_eq!(p.hundredths(), 6_667);

        assert_eq!(Percent::of(Money::from_cents(5), Money::ZERO), None);
    }

    #[test]
    fn test_money_serde_as_string() {
        let json = serde_json::to_string(&Money::from_cents(60_000)).unwrap();
        assert_eq!(json, "\"600.00\"");

        let back: Money = serde_json::from_str("\"600.00\"").unwrap();
        assert_eq!(back, Money::from_cents(60_000));
    }
}
