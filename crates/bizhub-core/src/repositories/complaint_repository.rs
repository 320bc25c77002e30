//! Complaint repository trait (port)

use async_trait::async_trait;
use bizhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Complaint, ComplaintComment, ComplaintFilter, ComplaintStatusHistory};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Complaint>, DomainError>;
    async fn list(&self, filter: &ComplaintFilter, page: Pagination) -> Result<Page<Complaint>, DomainError>;
    /// Unpaginated rows matching `filter`, for statistics.
    async fn find_matching(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>, DomainError>;
    /// Inserts the complaint together with its first history row.
    async fn create(&self, complaint: &Complaint, history: ComplaintStatusHistory) -> Result<Complaint, DomainError>;
    /// Updates the complaint and, when given, appends a history row in the same transaction.
    async fn update(
        &self,
        complaint: &Complaint,
        history: Option<ComplaintStatusHistory>,
    ) -> Result<Complaint, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
    async fn add_comment(&self, comment: &ComplaintComment) -> Result<ComplaintComment, DomainError>;
    async fn comments(&self, complaint_id: Uuid, include_internal: bool) -> Result<Vec<ComplaintComment>, DomainError>;
    async fn history(&self, complaint_id: Uuid) -> Result<Vec<ComplaintStatusHistory>, DomainError>;
}
