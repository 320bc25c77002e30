// ============================================================================
// BizHub Infrastructure - PostgreSQL Provider Repository
// File: crates/bizhub-infrastructure/src/database/postgres/provider_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use bizhub_core::domain::{DirectoryFilter, Provider};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::ProviderRepository;
use bizhub_shared::{Page, Pagination};

use super::directory_filter::push_directory_filters;
use crate::database::error::map_db_error;

const PROVIDER_COLUMNS: &str = "id, name, contact_name, email, phone, address, is_active, created_at, updated_at";

pub struct PgProviderRepository {
    pool: PgPool,
}

impl PgProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProviderRow {
    id: Uuid,
    name: String,
    contact_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Provider {
            id: row.id,
            name: row.name,
            contact_name: row.contact_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProviderRepository for PgProviderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Provider>, DomainError> {
        let row: Option<ProviderRow> =
            sqlx::query_as(&format!("SELECT {} FROM providers WHERE id = $1", PROVIDER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding provider", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Provider>, DomainError> {
        let row: Option<ProviderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM providers WHERE LOWER(name) = LOWER($1)",
            PROVIDER_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding provider by name", e))?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, filter: &DirectoryFilter, page: Pagination) -> Result<Page<Provider>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM providers");
        push_directory_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting providers", e))?;

        let mut query = QueryBuilder::new(format!("SELECT {} FROM providers", PROVIDER_COLUMNS));
        push_directory_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ProviderRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("listing providers", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }

    async fn create(&self, provider: &Provider) -> Result<Provider, DomainError> {
        let row: ProviderRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO providers (id, name, contact_name, email, phone, address, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PROVIDER_COLUMNS
        ))
        .bind(provider.id)
        .bind(&provider.name)
        .bind(&provider.contact_name)
        .bind(&provider.email)
        .bind(&provider.phone)
        .bind(&provider.address)
        .bind(provider.is_active)
        .bind(provider.created_at)
        .bind(provider.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating provider", e))?;

        Ok(row.into())
    }

    async fn update(&self, provider: &Provider) -> Result<Provider, DomainError> {
        let row: Option<ProviderRow> = sqlx::query_as(&format!(
            r#"
            UPDATE providers
            SET name = $2, contact_name = $3, email = $4, phone = $5, address = $6,
                is_active = $7, updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            PROVIDER_COLUMNS
        ))
        .bind(provider.id)
        .bind(&provider.name)
        .bind(&provider.contact_name)
        .bind(&provider.email)
        .bind(&provider.phone)
        .bind(&provider.address)
        .bind(provider.is_active)
        .bind(provider.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating provider", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Provider", provider.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM providers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting provider", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Provider", id));
        }
        Ok(())
    }
}
