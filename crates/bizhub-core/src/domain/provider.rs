// ============================================================================
// BizHub Core - Provider Entity
// File: crates/bizhub-core/src/domain/provider.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::directory::clean;
use crate::error::DomainError;

/// Content / VAS provider operating under a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProviderInput {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 100, message = "Contact name too long"))]
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Phone number too long"))]
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "Address too long"))]
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl Provider {
    pub fn new(input: ProviderInput) -> Result<Self, DomainError> {
        input.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            contact_name: clean(input.contact_name),
            email: clean(input.email).map(|e| e.to_lowercase()),
            phone: clean(input.phone),
            address: clean(input.address),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, input: ProviderInput) -> Result<(), DomainError> {
        input.validate()?;
        self.name = input.name.trim().to_string();
        self.contact_name = clean(input.contact_name);
        self.email = clean(input.email).map(|e| e.to_lowercase());
        self.phone = clean(input.phone);
        self.address = clean(input.address);
        self.is_active = input.is_active.unwrap_or(self.is_active);
        self.updated_at = Utc::now();
        Ok(())
    }
}
