// ============================================================================
// BizHub Core - Directory Services
// File: crates/bizhub-core/src/services/directory_service.rs
// ============================================================================
//! Counterparty directories (providers, humanitarian organizations, parking
//! services) and the service catalog

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use bizhub_shared::{Page, Pagination};

use crate::domain::{
    ActivityAction, ActivityLog, Actor, DirectoryFilter, EntityKind, HumanitarianOrg, HumanitarianOrgInput,
    ParkingService, ParkingServiceInput, Provider, ProviderInput, ServiceOffering, ServiceOfferingInput, Severity,
};
use crate::error::DomainError;
use crate::policy::{self, Action, Resource};
use crate::repositories::{
    ActivityRecorder, HumanitarianOrgRepository, ParkingServiceRepository, ProviderRepository,
    ServiceOfferingRepository,
};

/// `Conflict` when `existing` belongs to another record than `current`.
fn ensure_unique(kind: &str, field: &str, value: &str, existing: Option<Uuid>, current: Option<Uuid>) -> Result<(), DomainError> {
    match existing {
        Some(id) if Some(id) != current => Err(DomainError::Conflict(format!(
            "{} with {} '{}' already exists",
            kind, field, value
        ))),
        _ => Ok(()),
    }
}

fn audit(action: ActivityAction, entity: EntityKind, id: Uuid, actor: &Actor, name: &str) -> ActivityLog {
    let severity = match action {
        ActivityAction::ProviderDeleted
        | ActivityAction::HumanitarianOrgDeleted
        | ActivityAction::ParkingServiceDeleted
        | ActivityAction::ServiceDeleted => Severity::Warning,
        _ => Severity::Info,
    };
    ActivityLog::builder(action, entity)
        .entity_id(id)
        .user(actor.user_id)
        .severity(severity)
        .details(name.to_string())
        .build()
}

// ============================================================================
// Providers
// ============================================================================

pub struct ProviderService {
    repo: Arc<dyn ProviderRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl ProviderService {
    pub fn new(repo: Arc<dyn ProviderRepository>, activity: Arc<dyn ActivityRecorder>) -> Self {
        Self { repo, activity }
    }

    pub async fn create(&self, actor: &Actor, input: ProviderInput) -> Result<Provider, DomainError> {
        policy::require(actor, Resource::Provider, Action::Create)?;
        let provider = Provider::new(input)?;
        let existing = self.repo.find_by_name(&provider.name).await?.map(|p| p.id);
        ensure_unique("Provider", "name", &provider.name, existing, None)?;

        let created = self.repo.create(&provider).await?;
        self.activity.record(audit(ActivityAction::ProviderCreated, EntityKind::Provider, created.id, actor, &created.name));
        info!("Provider created: {}", created.name);
        Ok(created)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: ProviderInput) -> Result<Provider, DomainError> {
        policy::require(actor, Resource::Provider, Action::Update)?;
        let mut provider = self.load(id).await?;
        provider.apply_update(input)?;
        let existing = self.repo.find_by_name(&provider.name).await?.map(|p| p.id);
        ensure_unique("Provider", "name", &provider.name, existing, Some(id))?;

        let updated = self.repo.update(&provider).await?;
        self.activity.record(audit(ActivityAction::ProviderUpdated, EntityKind::Provider, id, actor, &updated.name));
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        policy::require(actor, Resource::Provider, Action::Delete)?;
        let provider = self.load(id).await?;
        self.repo.delete(id).await?;
        self.activity.record(audit(ActivityAction::ProviderDeleted, EntityKind::Provider, id, actor, &provider.name));
        warn!("Provider {} deleted by {}", provider.name, actor.user_id);
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Provider, DomainError> {
        policy::require(actor, Resource::Provider, Action::View)?;
        self.load(id).await
    }

    pub async fn list(&self, actor: &Actor, filter: &DirectoryFilter, page: Pagination) -> Result<Page<Provider>, DomainError> {
        policy::require(actor, Resource::Provider, Action::View)?;
        self.repo.list(filter, page).await
    }

    async fn load(&self, id: Uuid) -> Result<Provider, DomainError> {
        self.repo.find_by_id(id).await?.ok_or_else(|| DomainError::not_found("Provider", id))
    }
}

// ============================================================================
// Humanitarian organizations
// ============================================================================

pub struct HumanitarianOrgService {
    repo: Arc<dyn HumanitarianOrgRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl HumanitarianOrgService {
    pub fn new(repo: Arc<dyn HumanitarianOrgRepository>, activity: Arc<dyn ActivityRecorder>) -> Self {
        Self { repo, activity }
    }

    pub async fn create(&self, actor: &Actor, input: HumanitarianOrgInput) -> Result<HumanitarianOrg, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::Create)?;
        let org = HumanitarianOrg::new(input)?;
        self.ensure_unique(&org, None).await?;

        let created = self.repo.create(&org).await?;
        self.activity.record(audit(
            ActivityAction::HumanitarianOrgCreated,
            EntityKind::HumanitarianOrg,
            created.id,
            actor,
            &created.name,
        ));
        info!("Humanitarian organization created: {}", created.name);
        Ok(created)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: HumanitarianOrgInput) -> Result<HumanitarianOrg, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::Update)?;
        let mut org = self.load(id).await?;
        org.apply_update(input)?;
        self.ensure_unique(&org, Some(id)).await?;

        let updated = self.repo.update(&org).await?;
        self.activity.record(audit(
            ActivityAction::HumanitarianOrgUpdated,
            EntityKind::HumanitarianOrg,
            id,
            actor,
            &updated.name,
        ));
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::Delete)?;
        let org = self.load(id).await?;
        self.repo.delete(id).await?;
        self.activity.record(audit(
            ActivityAction::HumanitarianOrgDeleted,
            EntityKind::HumanitarianOrg,
            id,
            actor,
            &org.name,
        ));
        warn!("Humanitarian organization {} deleted by {}", org.name, actor.user_id);
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<HumanitarianOrg, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::View)?;
        self.load(id).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &DirectoryFilter,
        page: Pagination,
    ) -> Result<Page<HumanitarianOrg>, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::View)?;
        self.repo.list(filter, page).await
    }

    /// Name is always unique, email only when given.
    async fn ensure_unique(&self, org: &HumanitarianOrg, current: Option<Uuid>) -> Result<(), DomainError> {
        let existing = self.repo.find_by_name(&org.name).await?.map(|o| o.id);
        ensure_unique("Humanitarian organization", "name", &org.name, existing, current)?;
        if let Some(email) = &org.email {
            let existing = self.repo.find_by_email(email).await?.map(|o| o.id);
            ensure_unique("Humanitarian organization", "email", email, existing, current)?;
        }
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<HumanitarianOrg, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Humanitarian organization", id))
    }
}

// ============================================================================
// Parking services
// ============================================================================

pub struct ParkingDirectoryService {
    repo: Arc<dyn ParkingServiceRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl ParkingDirectoryService {
    pub fn new(repo: Arc<dyn ParkingServiceRepository>, activity: Arc<dyn ActivityRecorder>) -> Self {
        Self { repo, activity }
    }

    pub async fn create(&self, actor: &Actor, input: ParkingServiceInput) -> Result<ParkingService, DomainError> {
        policy::require(actor, Resource::Parking, Action::Create)?;
        let service = ParkingService::new(input)?;
        let existing = self.repo.find_by_name(&service.name).await?.map(|s| s.id);
        ensure_unique("Parking service", "name", &service.name, existing, None)?;

        let created = self.repo.create(&service).await?;
        self.activity.record(audit(
            ActivityAction::ParkingServiceCreated,
            EntityKind::ParkingService,
            created.id,
            actor,
            &created.name,
        ));
        info!("Parking service created: {}", created.name);
        Ok(created)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: ParkingServiceInput) -> Result<ParkingService, DomainError> {
        policy::require(actor, Resource::Parking, Action::Update)?;
        let mut service = self.load(id).await?;
        service.apply_update(input)?;
        let existing = self.repo.find_by_name(&service.name).await?.map(|s| s.id);
        ensure_unique("Parking service", "name", &service.name, existing, Some(id))?;

        let updated = self.repo.update(&service).await?;
        self.activity.record(audit(
            ActivityAction::ParkingServiceUpdated,
            EntityKind::ParkingService,
            id,
            actor,
            &updated.name,
        ));
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        policy::require(actor, Resource::Parking, Action::Delete)?;
        let service = self.load(id).await?;
        self.repo.delete(id).await?;
        self.activity.record(audit(
            ActivityAction::ParkingServiceDeleted,
            EntityKind::ParkingService,
            id,
            actor,
            &service.name,
        ));
        warn!("Parking service {} deleted by {}", service.name, actor.user_id);
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<ParkingService, DomainError> {
        policy::require(actor, Resource::Parking, Action::View)?;
        self.load(id).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &DirectoryFilter,
        page: Pagination,
    ) -> Result<Page<ParkingService>, DomainError> {
        policy::require(actor, Resource::Parking, Action::View)?;
        self.repo.list(filter, page).await
    }

    async fn load(&self, id: Uuid) -> Result<ParkingService, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Parking service", id))
    }
}

// ============================================================================
// Service catalog
// ============================================================================

pub struct CatalogService {
    repo: Arc<dyn ServiceOfferingRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn ServiceOfferingRepository>, activity: Arc<dyn ActivityRecorder>) -> Self {
        Self { repo, activity }
    }

    pub async fn create(&self, actor: &Actor, input: ServiceOfferingInput) -> Result<ServiceOffering, DomainError> {
        policy::require(actor, Resource::Service, Action::Create)?;
        let service = ServiceOffering::new(input)?;
        let existing = self.repo.find_by_name(&service.name).await?.map(|s| s.id);
        ensure_unique("Service", "name", &service.name, existing, None)?;

        let created = self.repo.create(&service).await?;
        self.activity.record(audit(ActivityAction::ServiceCreated, EntityKind::Service, created.id, actor, &created.name));
        info!("Service created: {} ({})", created.name, created.service_type.as_str());
        Ok(created)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: ServiceOfferingInput) -> Result<ServiceOffering, DomainError> {
        policy::require(actor, Resource::Service, Action::Update)?;
        let mut service = self.load(id).await?;
        service.apply_update(input)?;
        let existing = self.repo.find_by_name(&service.name).await?.map(|s| s.id);
        ensure_unique("Service", "name", &service.name, existing, Some(id))?;

        let updated = self.repo.update(&service).await?;
        self.activity.record(audit(ActivityAction::ServiceUpdated, EntityKind::Service, id, actor, &updated.name));
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        policy::require(actor, Resource::Service, Action::Delete)?;
        let service = self.load(id).await?;
        self.repo.delete(id).await?;
        self.activity.record(audit(ActivityAction::ServiceDeleted, EntityKind::Service, id, actor, &service.name));
        warn!("Service {} deleted by {}", service.name, actor.user_id);
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<ServiceOffering, DomainError> {
        policy::require(actor, Resource::Service, Action::View)?;
        self.load(id).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &DirectoryFilter,
        page: Pagination,
    ) -> Result<Page<ServiceOffering>, DomainError> {
        policy::require(actor, Resource::Service, Action::View)?;
        self.repo.list(filter, page).await
    }

    async fn load(&self, id: Uuid) -> Result<ServiceOffering, DomainError> {
        self.repo.find_by_id(id).await?.ok_or_else(|| DomainError::not_found("Service", id))
    }
}
