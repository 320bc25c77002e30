// ============================================================================
// BizHub Core - Parking Service Entity
// File: crates/bizhub-core/src/domain/parking_service.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use super::directory::clean;
use crate::error::DomainError;

/// Municipal parking operator billed through SMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingService {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub additional_emails: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ParkingServiceInput {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description too long"))]
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Contact name too long"))]
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Phone number too long"))]
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "Address too long"))]
    pub address: Option<String>,
    #[serde(default)]
    pub additional_emails: Vec<String>,
    pub is_active: Option<bool>,
}

impl ParkingServiceInput {
    fn cleaned_additional_emails(&self) -> Result<Vec<String>, DomainError> {
        let mut emails: Vec<String> = Vec::new();
        for email in self.additional_emails.iter().map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()) {
            if !email.validate_email() {
                return Err(DomainError::ValidationError(format!("Invalid additional email: {}", email)));
            }
            if !emails.contains(&email) {
                emails.push(email);
            }
        }
        Ok(emails)
    }
}

impl ParkingService {
    pub fn new(input: ParkingServiceInput) -> Result<Self, DomainError> {
        let now = Utc::now();
        let mut service = Self {
            id: Uuid::new_v4(),
            name: String::new(),
            description: None,
            contact_name: None,
            email: None,
            phone: None,
            address: None,
            additional_emails: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        service.apply_update(input)?;
        service.updated_at = now;
        Ok(service)
    }

    pub fn apply_update(&mut self, input: ParkingServiceInput) -> Result<(), DomainError> {
        input.validate()?;
        let additional_emails = input.cleaned_additional_emails()?;

        self.name = input.name.trim().to_string();
        self.description = clean(input.description);
        self.contact_name = clean(input.contact_name);
        self.email = clean(input.email).map(|e| e.to_lowercase());
        self.phone = clean(input.phone);
        self.address = clean(input.address);
        self.additional_emails = additional_emails;
        self.is_active = input.is_active.unwrap_or(self.is_active);
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(additional: Vec<&str>) -> ParkingServiceInput {
        ParkingServiceInput {
            name: "Parking Servis Novi Sad".into(),
            description: None,
            contact_name: None,
            email: None,
            phone: None,
            address: None,
            additional_emails: additional.into_iter().map(String::from).collect(),
            is_active: None,
        }
    }

    #[test]
    fn test_additional_emails_deduplicated() {
        let service = ParkingService::new(input(vec!["Ops@parking.example", "ops@parking.example ", ""])).unwrap();
        assert_eq!(service.additional_emails, vec!["ops@parking.example".to_string()]);
    }

    #[test]
    fn test_invalid_additional_email() {
        assert!(ParkingService::new(input(vec!["broken"])).is_err());
    }
}
