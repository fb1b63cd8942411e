// 🧾 Transaction entity - append-only fact rows
//
// The date may be unknown. Date-based operations skip such rows instead of
// treating them as epoch zero.

use crate::money::Money;
use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: i64,

    /// Owning customer (may dangle: joins drop such rows)
    pub customer_id: i64,

    pub product_id: i64,

    /// None = date unknown
    pub transaction_date: Option<NaiveDateTime>,

    /// Always >= 0, enforced at ingestion
    pub amount_spent: Money,
}

impl Transaction {
    pub fn new(
        transaction_id: i64,
        customer_id: i64,
        product_id: i64,
        transaction_date: Option<NaiveDateTime>,
        amount_spent: Money,
    ) -> Self {
        Transaction {
            transaction_id,
            customer_id,
            product_id,
            transaction_date,
            amount_spent,
        }
    }

    /// Calendar day of the transaction, if known
    pub fn day(&self) -> Option<NaiveDate> {
        self.transaction_date.map(|dt| dt.date())
    }
}

/// Parse a transaction timestamp.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and
/// RFC 3339 (converted to UTC). Blank input is an unknown date.
pub fn parse_timestamp(raw: &str) -> Result<Option<NaiveDateTime>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(dt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.naive_utc()));
    }

    bail!("unrecognized transaction date '{}'", raw)
}
