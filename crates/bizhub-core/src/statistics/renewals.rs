//! Humanitarian renewal statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{month_key, trailing_months, CountBucket};
use crate::domain::{HumanitarianRenewal, HumanitarianRenewalStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: HumanitarianRenewalStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HumanitarianRenewalStats {
    pub total: usize,
    pub in_progress: usize,
    pub awaiting_signature: usize,
    pub completed: usize,
    /// Mean share of the four checklist flags, percent
    pub average_progress: u8,
    pub by_status: Vec<StatusCount>,
    /// Renewals created in each of the last six months, oldest first
    pub monthly: Vec<CountBucket>,
}

pub fn humanitarian_renewal_stats(renewals: &[HumanitarianRenewal], now: DateTime<Utc>) -> HumanitarianRenewalStats {
    let count = |status: HumanitarianRenewalStatus| renewals.iter().filter(|r| r.sub_status == status).count();

    let by_status = HumanitarianRenewalStatus::ALL
        .iter()
        .map(|s| StatusCount { status: *s, label: s.label(), count: count(*s) })
        .collect();

    let monthly = trailing_months(now, 6)
        .into_iter()
        .map(|month| {
            let n = renewals.iter().filter(|r| month_key(r.created_at) == month).count();
            CountBucket::new(month, n)
        })
        .collect();

    let average_progress = if renewals.is_empty() {
        0
    } else {
        let sum: u32 = renewals.iter().map(|r| u32::from(r.progress_percentage())).sum();
        (f64::from(sum) / renewals.len() as f64).round() as u8
    };

    HumanitarianRenewalStats {
        total: renewals.len(),
        in_progress: renewals.iter().filter(|r| !r.sub_status.is_final()).count(),
        awaiting_signature: count(HumanitarianRenewalStatus::AwaitingSignature),
        completed: count(HumanitarianRenewalStatus::FinalProcessing),
        average_progress,
        by_status,
        monthly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CreateHumanitarianRenewalInput;
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn renewal(status: HumanitarianRenewalStatus, flags: usize, created_at: DateTime<Utc>) -> HumanitarianRenewal {
        let mut r = HumanitarianRenewal::new(
            CreateHumanitarianRenewalInput {
                contract_id: Uuid::new_v4(),
                humanitarian_org_id: Uuid::new_v4(),
                proposed_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                proposed_end_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                proposed_revenue: None,
                sub_status: Some(status),
                notes: None,
                documents_received: flags > 0,
                legal_approved: flags > 1,
                financial_approved: flags > 2,
                signature_received: flags > 3,
            },
            Uuid::new_v4(),
        )
        .unwrap();
        r.created_at = created_at;
        r
    }

    #[test]
    fn test_renewal_stats() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();
        let march = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        let last_year = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let stats = humanitarian_renewal_stats(
            &[
                renewal(HumanitarianRenewalStatus::AwaitingSignature, 3, march),
                renewal(HumanitarianRenewalStatus::FinalProcessing, 4, march),
                renewal(HumanitarianRenewalStatus::DocumentCollection, 0, last_year),
            ],
            now,
        );

        assert_eq!(stats.total, 3);
        assert_eq!(stats.in_progress, 2);
        assert_eq!(stats.awaiting_signature, 1);
        assert_eq!(stats.completed, 1);
        // (75 + 100 + 0) / 3
        assert_eq!(stats.average_progress, 58);
        assert_eq!(stats.monthly.len(), 6);
        assert_eq!(stats.monthly.last(), Some(&CountBucket::new("2025-03", 2)));
        assert_eq!(stats.monthly.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(stats.by_status[3].label, "Awaiting signature");
    }
}
