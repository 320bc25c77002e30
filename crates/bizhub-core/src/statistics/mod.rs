//! Aggregations over fetched rows for the analytics endpoints.
//!
//! Every function here is a pure reduction; callers fetch the rows.

pub mod complaints;
pub mod contracts;
pub mod renewals;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;

pub use complaints::{complaint_stats, ComplaintStats};
pub use contracts::{contract_stats, ContractStats};
pub use renewals::{humanitarian_renewal_stats, HumanitarianRenewalStats};

/// A labelled count, e.g. one bar of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountBucket {
    pub key: String,
    pub count: usize,
}

impl CountBucket {
    pub fn new(key: impl Into<String>, count: usize) -> Self {
        Self { key: key.into(), count }
    }
}

/// `YYYY-MM` bucket key.
pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Keys of the `count` months ending with the month of `now`, oldest first.
pub fn trailing_months(now: DateTime<Utc>, count: u32) -> Vec<String> {
    let first_of_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
    (0..count)
        .rev()
        .filter_map(|back| first_of_month.checked_sub_months(Months::new(back)))
        .map(|d| d.format("%Y-%m").to_string())
        .collect()
}

/// Counts keys in first-seen order, then sorts by count descending.
pub(crate) fn count_by<I, K>(keys: I) -> Vec<CountBucket>
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    let mut buckets: Vec<CountBucket> = Vec::new();
    for key in keys {
        let key = key.into();
        match buckets.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.count += 1,
            None => buckets.push(CountBucket::new(key, 1)),
        }
    }
    // stable sort keeps first-seen order among equal counts
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
