// ============================================================================
// BizHub Infrastructure - PostgreSQL Parking Service Repository
// File: crates/bizhub-infrastructure/src/database/postgres/parking_service_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use bizhub_core::domain::{DirectoryFilter, ParkingService};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::ParkingServiceRepository;
use bizhub_shared::{Page, Pagination};

use super::directory_filter::push_directory_filters;
use crate::database::error::map_db_error;

const PARKING_COLUMNS: &str = r#"
    id, name, description, contact_name, email, phone, address, additional_emails,
    is_active, created_at, updated_at"#;

pub struct PgParkingServiceRepository {
    pool: PgPool,
}

impl PgParkingServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ParkingRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    contact_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    additional_emails: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ParkingRow> for ParkingService {
    fn from(row: ParkingRow) -> Self {
        ParkingService {
            id: row.id,
            name: row.name,
            description: row.description,
            contact_name: row.contact_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            additional_emails: row.additional_emails,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ParkingServiceRepository for PgParkingServiceRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ParkingService>, DomainError> {
        let row: Option<ParkingRow> =
            sqlx::query_as(&format!("SELECT {} FROM parking_services WHERE id = $1", PARKING_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding parking service", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ParkingService>, DomainError> {
        let row: Option<ParkingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parking_services WHERE LOWER(name) = LOWER($1)",
            PARKING_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding parking service by name", e))?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, filter: &DirectoryFilter, page: Pagination) -> Result<Page<ParkingService>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM parking_services");
        push_directory_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting parking services", e))?;

        let mut query = QueryBuilder::new(format!("SELECT {} FROM parking_services", PARKING_COLUMNS));
        push_directory_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ParkingRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("listing parking services", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }

    async fn create(&self, service: &ParkingService) -> Result<ParkingService, DomainError> {
        let row: ParkingRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO parking_services (
                id, name, description, contact_name, email, phone, address, additional_emails,
                is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            PARKING_COLUMNS
        ))
        .bind(service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.contact_name)
        .bind(&service.email)
        .bind(&service.phone)
        .bind(&service.address)
        .bind(&service.additional_emails)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating parking service", e))?;

        Ok(row.into())
    }

    async fn update(&self, service: &ParkingService) -> Result<ParkingService, DomainError> {
        let row: Option<ParkingRow> = sqlx::query_as(&format!(
            r#"
            UPDATE parking_services
            SET name = $2, description = $3, contact_name = $4, email = $5, phone = $6,
                address = $7, additional_emails = $8, is_active = $9, updated_at = $10
            WHERE id = $1
            RETURNING {}
            "#,
            PARKING_COLUMNS
        ))
        .bind(service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.contact_name)
        .bind(&service.email)
        .bind(&service.phone)
        .bind(&service.address)
        .bind(&service.additional_emails)
        .bind(service.is_active)
        .bind(service.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating parking service", e))?;

        row.map(Into::into)
            .ok_or_else(|| DomainError::not_found("Parking service", service.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM parking_services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting parking service", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Parking service", id));
        }
        Ok(())
    }
}
