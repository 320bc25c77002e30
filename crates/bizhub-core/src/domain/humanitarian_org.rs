// ============================================================================
// BizHub Core - Humanitarian Organization Entity
// File: crates/bizhub-core/src/domain/humanitarian_org.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::directory::clean;
use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanitarianOrg {
    pub id: Uuid,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub mission: Option<String>,
    /// Tax identification number
    pub pib: Option<String>,
    pub registration_number: Option<String>,
    pub bank: Option<String>,
    pub account_number: Option<String>,
    /// Short SMS number used for donations
    pub short_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HumanitarianOrgInput {
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
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,
    #[validate(length(max = 2000, message = "Mission too long"))]
    pub mission: Option<String>,
    #[validate(length(max = 20, message = "PIB too long"))]
    pub pib: Option<String>,
    #[validate(length(max = 50, message = "Registration number too long"))]
    pub registration_number: Option<String>,
    #[validate(length(max = 100, message = "Bank name too long"))]
    pub bank: Option<String>,
    #[validate(length(max = 50, message = "Account number too long"))]
    pub account_number: Option<String>,
    #[validate(length(max = 20, message = "Short number too long"))]
    pub short_number: Option<String>,
    pub is_active: Option<bool>,
}

impl HumanitarianOrg {
    pub fn new(input: HumanitarianOrgInput) -> Result<Self, DomainError> {
        let now = Utc::now();
        let mut org = Self {
            id: Uuid::new_v4(),
            name: String::new(),
            contact_name: None,
            email: None,
            phone: None,
            address: None,
            website: None,
            mission: None,
            pib: None,
            registration_number: None,
            bank: None,
            account_number: None,
            short_number: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        org.apply_update(input)?;
        org.updated_at = now;
        Ok(org)
    }

    pub fn apply_update(&mut self, input: HumanitarianOrgInput) -> Result<(), DomainError> {
        input.validate()?;
        self.name = input.name.trim().to_string();
        self.contact_name = clean(input.contact_name);
        self.email = clean(input.email).map(|e| e.to_lowercase());
        self.phone = clean(input.phone);
        self.address = clean(input.address);
        self.website = clean(input.website);
        self.mission = clean(input.mission);
        self.pib = clean(input.pib);
        self.registration_number = clean(input.registration_number);
        self.bank = clean(input.bank);
        self.account_number = clean(input.account_number);
        self.short_number = clean(input.short_number);
        self.is_active = input.is_active.unwrap_or(self.is_active);
        self.updated_at = Utc::now();
        Ok(())
    }
}
