//! Domain errors

use std::fmt::Display;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("User not active")]
    UserNotActive,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Too many login attempts, try again later")]
    TooManyAttempts,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Password too short")]
    PasswordTooShort,

    #[error("Password too long")]
    PasswordTooLong,

    #[error("Password too weak")]
    PasswordTooWeak,

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Display) -> Self {
        DomainError::NotFound { entity, id: id.to_string() }
    }

    /// Status names are rendered with spaces, e.g. `RENEWAL IN PROGRESS`.
    pub fn invalid_transition(from: &str, to: &str) -> Self {
        DomainError::InvalidTransition {
            from: from.replace('_', " "),
            to: to.replace('_', " "),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }

    pub fn validation(messages: Vec<String>) -> Self {
        DomainError::ValidationError(messages.join("; "))
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::validation(validation_messages(&errors))
    }
}

impl From<bizhub_security::PasswordError> for DomainError {
    fn from(error: bizhub_security::PasswordError) -> Self {
        use bizhub_security::PasswordError;
        match error {
            PasswordError::TooShort => DomainError::PasswordTooShort,
            PasswordError::TooLong => DomainError::PasswordTooLong,
            PasswordError::TooWeak => DomainError::PasswordTooWeak,
            other => DomainError::PasswordHashError(other.to_string()),
        }
    }
}

/// Flattens field errors into readable messages, ordered by field name.
pub fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid ({})", field, e.code),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = DomainError::invalid_transition("TERMINATED", "RENEWAL_IN_PROGRESS");
        assert_eq!(err.to_string(), "Cannot change status from TERMINATED to RENEWAL IN PROGRESS");
    }

    #[test]
    fn test_not_found_message() {
        let err = DomainError::not_found("Contract", "42");
        assert_eq!(err.to_string(), "Contract not found: 42");
    }
}
