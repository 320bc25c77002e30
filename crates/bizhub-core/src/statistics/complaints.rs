//! Complaint statistics

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use super::{count_by, month_key, round2, CountBucket};
use crate::domain::{Complaint, ComplaintStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintStats {
    pub total: usize,
    /// Every status, zero-filled, in lifecycle order
    pub by_status: Vec<CountBucket>,
    /// Priorities 1-5, zero-filled
    pub by_priority: Vec<CountBucket>,
    /// Provider id, most complaints first; `unassigned` for complaints without provider
    pub by_provider: Vec<CountBucket>,
    /// `YYYY-MM`, oldest first
    pub by_month: Vec<CountBucket>,
    pub average_resolution_days: f64,
    /// Percentage of complaints resolved or closed
    pub resolution_rate: f64,
}

pub fn complaint_stats(complaints: &[Complaint]) -> ComplaintStats {
    let total = complaints.len();

    let by_status = ComplaintStatus::ALL
        .iter()
        .map(|status| CountBucket::new(status.as_str(), complaints.iter().filter(|c| c.status == *status).count()))
        .collect();

    let by_priority = (1..=5i16)
        .map(|p| CountBucket::new(p.to_string(), complaints.iter().filter(|c| c.priority == p).count()))
        .collect();

    let by_provider = count_by(
        complaints
            .iter()
            .map(|c| c.provider_id.map(|id: Uuid| id.to_string()).unwrap_or_else(|| "unassigned".to_string())),
    );

    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for complaint in complaints {
        *months.entry(month_key(complaint.created_at)).or_default() += 1;
    }
    let by_month = months.into_iter().map(|(k, v)| CountBucket::new(k, v)).collect();

    let resolution_days: Vec<f64> = complaints.iter().filter_map(Complaint::resolution_days).collect();
    let average_resolution_days = if resolution_days.is_empty() {
        0.0
    } else {
        round2(resolution_days.iter().sum::<f64>() / resolution_days.len() as f64)
    };

    let resolved = complaints.iter().filter(|c| c.status.is_resolved()).count();
    let resolution_rate = if total == 0 {
        0.0
    } else {
        round2(resolved as f64 / total as f64 * 100.0)
    };

    ComplaintStats {
        total,
        by_status,
        by_priority,
        by_provider,
        by_month,
        average_resolution_days,
        resolution_rate,
    }
}
