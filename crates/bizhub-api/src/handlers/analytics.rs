use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use bizhub_core::domain::ComplaintFilter;
use bizhub_core::statistics::{ComplaintStats, ContractStats};

use super::{ok, ApiResult};
use crate::extractors::{ApiQuery, AuthUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContractStatsQuery {
    pub expiring_days: Option<i64>,
}

/// GET /analytics/complaints?date_from=..&date_to=..
pub async fn complaints(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(range): ApiQuery<DateRangeQuery>,
) -> ApiResult<ComplaintStats> {
    let filter = ComplaintFilter {
        date_from: range.date_from,
        date_to: range.date_to,
        ..Default::default()
    };
    ok(state.statistics.complaint_stats(&actor, &filter).await?)
}

/// GET /analytics/contracts?expiring_days=N
pub async fn contracts(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(query): ApiQuery<ContractStatsQuery>,
) -> ApiResult<ContractStats> {
    let days = query.expiring_days.unwrap_or(state.expiring_soon_days);
    ok(state.statistics.contract_stats(&actor, Utc::now().date_naive(), days).await?)
}
