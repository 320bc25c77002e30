//! Providers, humanitarian organizations, parking services and the service
//! catalog share the same CRUD surface.

use axum::extract::State;
use uuid::Uuid;

use bizhub_core::domain::{
    DirectoryFilter, HumanitarianOrg, HumanitarianOrgInput, ParkingService, ParkingServiceInput, Provider,
    ProviderInput, ServiceOffering, ServiceOfferingInput,
};
use bizhub_shared::Page;

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser, PageParams};
use crate::response::Deleted;
use crate::state::AppState;

// ----------------------------------------------------------------------------
// Providers
// ----------------------------------------------------------------------------

pub async fn list_provider(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<DirectoryFilter>,
) -> ApiResult<Page<Provider>> {
    ok(state.providers.list(&actor, &filter, page.pagination()).await?)
}

pub async fn create_provider(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(input): ApiJson<ProviderInput>,
) -> Created<Provider> {
    created(state.providers.create(&actor, input).await?)
}

pub async fn get_provider(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Provider> {
    ok(state.providers.get(&actor, id).await?)
}

pub async fn update_provider(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ProviderInput>,
) -> ApiResult<Provider> {
    ok(state.providers.update(&actor, id, input).await?)
}

pub async fn delete_provider(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.providers.delete(&actor, id).await?;
    ok(Deleted { deleted: 1 })
}

// ----------------------------------------------------------------------------
// Humanitarian organizations
// ----------------------------------------------------------------------------

pub async fn list_humanitarian_org(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<DirectoryFilter>,
) -> ApiResult<Page<HumanitarianOrg>> {
    ok(state.humanitarian_orgs.list(&actor, &filter, page.pagination()).await?)
}

pub async fn create_humanitarian_org(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(input): ApiJson<HumanitarianOrgInput>,
) -> Created<HumanitarianOrg> {
    created(state.humanitarian_orgs.create(&actor, input).await?)
}

pub async fn get_humanitarian_org(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<HumanitarianOrg> {
    ok(state.humanitarian_orgs.get(&actor, id).await?)
}

pub async fn update_humanitarian_org(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<HumanitarianOrgInput>,
) -> ApiResult<HumanitarianOrg> {
    ok(state.humanitarian_orgs.update(&actor, id, input).await?)
}

pub async fn delete_humanitarian_org(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.humanitarian_orgs.delete(&actor, id).await?;
    ok(Deleted { deleted: 1 })
}

// ----------------------------------------------------------------------------
// Parking services
// ----------------------------------------------------------------------------

pub async fn list_parking_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<DirectoryFilter>,
) -> ApiResult<Page<ParkingService>> {
    ok(state.parking_services.list(&actor, &filter, page.pagination()).await?)
}

pub async fn create_parking_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(input): ApiJson<ParkingServiceInput>,
) -> Created<ParkingService> {
    created(state.parking_services.create(&actor, input).await?)
}

pub async fn get_parking_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ParkingService> {
    ok(state.parking_services.get(&actor, id).await?)
}

pub async fn update_parking_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ParkingServiceInput>,
) -> ApiResult<ParkingService> {
    ok(state.parking_services.update(&actor, id, input).await?)
}

pub async fn delete_parking_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.parking_services.delete(&actor, id).await?;
    ok(Deleted { deleted: 1 })
}

// ----------------------------------------------------------------------------
// Service catalog
// ----------------------------------------------------------------------------

pub async fn list_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<DirectoryFilter>,
) -> ApiResult<Page<ServiceOffering>> {
    ok(state.catalog.list(&actor, &filter, page.pagination()).await?)
}

pub async fn create_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(input): ApiJson<ServiceOfferingInput>,
) -> Created<ServiceOffering> {
    created(state.catalog.create(&actor, input).await?)
}

pub async fn get_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ServiceOffering> {
    ok(state.catalog.get(&actor, id).await?)
}

pub async fn update_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ServiceOfferingInput>,
) -> ApiResult<ServiceOffering> {
    ok(state.catalog.update(&actor, id, input).await?)
}

pub async fn delete_service(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.catalog.delete(&actor, id).await?;
    ok(Deleted { deleted: 1 })
}
