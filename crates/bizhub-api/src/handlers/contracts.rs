//! Contracts, their status lifecycle and the renewal workflow

use axum::extract::State;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use bizhub_core::domain::{
    Contract, ContractFilter, ContractInput, ContractRenewal, ContractStatus, ContractStatusLog, RenewalCompletion,
    RenewalSubStatus,
};
use bizhub_core::services::{ExpiringContract, StartRenewalInput};
use bizhub_shared::Page;

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser, PageParams};
use crate::response::Deleted;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: ContractStatus,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SubStatusRequest {
    pub sub_status: RenewalSubStatus,
    pub comments: Option<String>,
}

/// New term for a completed renewal; omitted dates fall back to the
/// renewal's proposed term.
#[derive(Debug, Default, Deserialize)]
pub struct CompleteRenewalRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub revenue_percentage: Option<f64>,
    pub comments: Option<String>,
}

impl From<CompleteRenewalRequest> for RenewalCompletion {
    fn from(req: CompleteRenewalRequest) -> Self {
        RenewalCompletion {
            start_date: req.start_date,
            end_date: req.end_date,
            revenue_percentage: req.revenue_percentage,
            comments: req.comments,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<ContractFilter>,
) -> ApiResult<Page<Contract>> {
    ok(state.contracts.list(&actor, &filter, page.pagination()).await?)
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(input): ApiJson<ContractInput>,
) -> Created<Contract> {
    created(state.contracts.create(&actor, input).await?)
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Contract> {
    ok(state.contracts.get(&actor, id).await?)
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ContractInput>,
) -> ApiResult<Contract> {
    ok(state.contracts.update(&actor, id, input).await?)
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.contracts.delete(&actor, id).await?;
    ok(Deleted { deleted: 1 })
}

/// PUT /contracts/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ChangeStatusRequest>,
) -> ApiResult<Contract> {
    ok(state.contracts.change_status(&actor, id, req.status, req.comments).await?)
}

/// GET /contracts/{id}/status-history
pub async fn status_history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<ContractStatusLog>> {
    ok(state.contracts.status_history(&actor, id).await?)
}

/// GET /contracts/expiring?days=N
pub async fn expiring(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(query): ApiQuery<ExpiringQuery>,
) -> ApiResult<Vec<ExpiringContract>> {
    let days = query.days.unwrap_or(state.expiring_soon_days);
    ok(state.contracts.expiring(&actor, days, Utc::now().date_naive()).await?)
}

// ----------------------------------------------------------------------------
// Renewal workflow
// ----------------------------------------------------------------------------

/// GET /contracts/{id}/renewal
pub async fn active_renewal(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Option<ContractRenewal>> {
    ok(state.renewals.active_for_contract(&actor, id).await?)
}

/// POST /contracts/{id}/renewal
pub async fn start_renewal(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<StartRenewalInput>,
) -> Created<ContractRenewal> {
    created(state.renewals.start(&actor, id, input).await?)
}

/// PUT /contracts/{id}/renewal/sub-status
pub async fn update_renewal_sub_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SubStatusRequest>,
) -> ApiResult<ContractRenewal> {
    ok(state.renewals.update_sub_status(&actor, id, req.sub_status, req.comments).await?)
}

/// POST /contracts/{id}/renewal/complete
pub async fn complete_renewal(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CompleteRenewalRequest>,
) -> ApiResult<Contract> {
    ok(state.renewals.complete(&actor, id, req.into()).await?)
}

/// GET /contracts/{id}/renewals
pub async fn renewal_history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<ContractRenewal>> {
    ok(state.renewals.history(&actor, id).await?)
}
