// ============================================================================
// BizHub Core - Service Catalog Entity
// File: crates/bizhub-core/src/domain/service_offering.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::directory::clean;
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Vas,
    Bulk,
    Humanitarian,
    Parking,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Vas => "VAS",
            ServiceType::Bulk => "BULK",
            ServiceType::Humanitarian => "HUMANITARIAN",
            ServiceType::Parking => "PARKING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "VAS" => Some(ServiceType::Vas),
            "BULK" => Some(ServiceType::Bulk),
            "HUMANITARIAN" => Some(ServiceType::Humanitarian),
            "PARKING" => Some(ServiceType::Parking),
            _ => None,
        }
    }
}

/// A service in the catalog that contracts and complaints refer to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub name: String,
    pub service_type: ServiceType,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServiceOfferingInput {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    pub service_type: ServiceType,
    #[validate(length(max = 2000, message = "Description too long"))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl ServiceOffering {
    pub fn new(input: ServiceOfferingInput) -> Result<Self, DomainError> {
        input.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            service_type: input.service_type,
            description: clean(input.description),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, input: ServiceOfferingInput) -> Result<(), DomainError> {
        input.validate()?;
        self.name = input.name.trim().to_string();
        self.service_type = input.service_type;
        self.description = clean(input.description);
        self.is_active = input.is_active.unwrap_or(self.is_active);
        self.updated_at = Utc::now();
        Ok(())
    }
}
