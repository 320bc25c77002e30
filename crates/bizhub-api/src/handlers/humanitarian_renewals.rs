use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use bizhub_core::domain::{
    CreateHumanitarianRenewalInput, HumanitarianRenewal, HumanitarianRenewalDetails, HumanitarianRenewalFilter,
    UpdateHumanitarianRenewalInput,
};
use bizhub_core::statistics::HumanitarianRenewalStats;
use bizhub_shared::Page;

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser, PageParams};
use crate::response::Deleted;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<HumanitarianRenewalFilter>,
) -> ApiResult<Page<HumanitarianRenewalDetails>> {
    ok(state.humanitarian_renewals.list(&actor, &filter, page.pagination()).await?)
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(input): ApiJson<CreateHumanitarianRenewalInput>,
) -> Created<HumanitarianRenewal> {
    created(state.humanitarian_renewals.create(&actor, input).await?)
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<HumanitarianRenewalDetails> {
    ok(state.humanitarian_renewals.get(&actor, id).await?)
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateHumanitarianRenewalInput>,
) -> ApiResult<HumanitarianRenewal> {
    ok(state.humanitarian_renewals.update(&actor, id, input).await?)
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.humanitarian_renewals.delete(&actor, id).await?;
    ok(Deleted { deleted: 1 })
}

/// POST /humanitarian-renewals/bulk-delete
pub async fn bulk_delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(req): ApiJson<BulkDeleteRequest>,
) -> ApiResult<Deleted> {
    let deleted = state.humanitarian_renewals.bulk_delete(&actor, &req.ids).await?;
    ok(Deleted { deleted })
}

/// GET /humanitarian-renewals/statistics
pub async fn statistics(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<HumanitarianRenewalStats> {
    ok(state.humanitarian_renewals.statistics(&actor, Utc::now()).await?)
}
