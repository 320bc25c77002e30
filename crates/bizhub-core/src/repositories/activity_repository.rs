//! Activity log ports

use async_trait::async_trait;
use bizhub_shared::{Page, Pagination};

use crate::domain::{ActivityFilter, ActivityLog};
use crate::error::DomainError;

/// Write side of the audit trail. Recording is fire-and-forget and must
/// never fail the mutation it describes.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
pub trait ActivityRecorder: Send + Sync {
    fn record(&self, entry: ActivityLog);
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Newest first
    async fn search(&self, filter: &ActivityFilter, page: Pagination) -> Result<Page<ActivityLog>, DomainError>;
}
