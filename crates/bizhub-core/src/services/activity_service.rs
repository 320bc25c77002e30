// ============================================================================
// BizHub Core - Activity Log Service
// File: crates/bizhub-core/src/services/activity_service.rs
// ============================================================================

use std::sync::Arc;

use bizhub_shared::{Page, Pagination};

use crate::domain::{ActivityFilter, ActivityLog, Actor};
use crate::error::DomainError;
use crate::policy::{self, Action, Resource};
use crate::repositories::ActivityLogRepository;

/// Read side of the audit trail. Writes go through `ActivityRecorder`.
pub struct ActivityService {
    repo: Arc<dyn ActivityLogRepository>,
}

impl ActivityService {
    pub fn new(repo: Arc<dyn ActivityLogRepository>) -> Self {
        Self { repo }
    }

    /// Newest entries first.
    pub async fn search(
        &self,
        actor: &Actor,
        filter: &ActivityFilter,
        page: Pagination,
    ) -> Result<Page<ActivityLog>, DomainError> {
        policy::require(actor, Resource::ActivityLog, Action::View)?;
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if to < from {
                return Err(DomainError::validation(vec!["'to' must not be before 'from'".into()]));
            }
        }
        self.repo.search(filter, page).await
    }
}
