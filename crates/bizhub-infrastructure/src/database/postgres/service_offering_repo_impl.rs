// ============================================================================
// BizHub Infrastructure - PostgreSQL Service Catalog Repository
// File: crates/bizhub-infrastructure/src/database/postgres/service_offering_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use bizhub_core::domain::{DirectoryFilter, ServiceOffering, ServiceType};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::ServiceOfferingRepository;
use bizhub_shared::{Page, Pagination};

use super::directory_filter::push_directory_filters;
use crate::database::error::map_db_error;

const SERVICE_COLUMNS: &str = "id, name, service_type, description, is_active, created_at, updated_at";

pub struct PgServiceOfferingRepository {
    pool: PgPool,
}

impl PgServiceOfferingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ServiceRow {
    id: Uuid,
    name: String,
    service_type: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ServiceRow> for ServiceOffering {
    fn from(row: ServiceRow) -> Self {
        ServiceOffering {
            id: row.id,
            name: row.name,
            service_type: ServiceType::from_str(&row.service_type).unwrap_or(ServiceType::Vas),
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ServiceOfferingRepository for PgServiceOfferingRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceOffering>, DomainError> {
        let row: Option<ServiceRow> = sqlx::query_as(&format!("SELECT {} FROM services WHERE id = $1", SERVICE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("finding service", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ServiceOffering>, DomainError> {
        let row: Option<ServiceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM services WHERE LOWER(name) = LOWER($1)",
            SERVICE_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding service by name", e))?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, filter: &DirectoryFilter, page: Pagination) -> Result<Page<ServiceOffering>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM services");
        push_directory_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting services", e))?;

        let mut query = QueryBuilder::new(format!("SELECT {} FROM services", SERVICE_COLUMNS));
        push_directory_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ServiceRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("listing services", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }

    async fn create(&self, service: &ServiceOffering) -> Result<ServiceOffering, DomainError> {
        let row: ServiceRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO services (id, name, service_type, description, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(service.id)
        .bind(&service.name)
        .bind(service.service_type.as_str())
        .bind(&service.description)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating service", e))?;

        Ok(row.into())
    }

    async fn update(&self, service: &ServiceOffering) -> Result<ServiceOffering, DomainError> {
        let row: Option<ServiceRow> = sqlx::query_as(&format!(
            r#"
            UPDATE services
            SET name = $2, service_type = $3, description = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(service.id)
        .bind(&service.name)
        .bind(service.service_type.as_str())
        .bind(&service.description)
        .bind(service.is_active)
        .bind(service.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating service", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Service", service.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting service", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Service", id));
        }
        Ok(())
    }
}
