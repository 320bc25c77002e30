//! Contract statistics

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::{month_key, CountBucket};
use crate::domain::{Contract, ContractStatus, ContractType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractStats {
    pub total: usize,
    pub by_status: Vec<CountBucket>,
    pub by_type: Vec<CountBucket>,
    /// ACTIVE contracts ending within the threshold
    pub expiring_soon: usize,
    /// ACTIVE contracts already past their end date, awaiting the expiry sweep
    pub overdue: usize,
    pub average_revenue_percentage: f64,
    /// New contracts per `YYYY-MM`, oldest first
    pub created_by_month: Vec<CountBucket>,
}

pub fn contract_stats(contracts: &[Contract], today: NaiveDate, expiring_days: i64) -> ContractStats {
    let by_status = ContractStatus::ALL
        .iter()
        .map(|s| CountBucket::new(s.as_str(), contracts.iter().filter(|c| c.status == *s).count()))
        .collect();

    let by_type = ContractType::ALL
        .iter()
        .map(|t| CountBucket::new(t.as_str(), contracts.iter().filter(|c| c.contract_type == *t).count()))
        .collect();

    let expiring_soon = contracts.iter().filter(|c| c.is_expiring_soon(today, expiring_days)).count();
    let overdue = contracts
        .iter()
        .filter(|c| c.status == ContractStatus::Active && c.end_date < today)
        .count();

    let average_revenue_percentage = if contracts.is_empty() {
        0.0
    } else {
        super::round2(contracts.iter().map(|c| c.revenue_percentage).sum::<f64>() / contracts.len() as f64)
    };

    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for contract in contracts {
        *months.entry(month_key(contract.created_at)).or_default() += 1;
    }

    ContractStats {
        total: contracts.len(),
        by_status,
        by_type,
        expiring_soon,
        overdue,
        average_revenue_percentage,
        created_by_month: months.into_iter().map(|(k, v)| CountBucket::new(k, v)).collect(),
    }
}
