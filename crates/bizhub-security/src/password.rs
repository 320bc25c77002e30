//! Password hashing with Argon2 and strength checks with zxcvbn

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use bizhub_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use thiserror::Error;
use zxcvbn::zxcvbn;

/// Minimum zxcvbn score (0-4) accepted for new passwords.
pub const MIN_PASSWORD_SCORE: u8 = 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
    #[error("Verification failed")]
    VerificationFailed,
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
    #[error("Password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,
    #[error("Password is too weak")]
    TooWeak,
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Rejects passwords outside the length bounds or guessable from
    /// `user_inputs` (name, email) and common dictionaries.
    pub fn check_strength(password: &str, user_inputs: &[&str]) -> Result<(), PasswordError> {
        let length = password.chars().count();
        if length < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort);
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong);
        }
        if (zxcvbn(password, user_inputs).score() as u8) < MIN_PASSWORD_SCORE {
            return Err(PasswordError::TooWeak);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash("correct horse battery staple").unwrap();
        assert!(PasswordService::verify("correct horse battery staple", &hash).unwrap());
        assert!(!PasswordService::verify("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_verify_with_garbage_hash_errors() {
        assert!(PasswordService::verify("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_strength_rules() {
        assert_eq!(PasswordService::check_strength("short", &[]), Err(PasswordError::TooShort));
        assert_eq!(
            PasswordService::check_strength(&"a".repeat(MAX_PASSWORD_LENGTH + 1), &[]),
            Err(PasswordError::TooLong)
        );
        assert_eq!(PasswordService::check_strength("password", &[]), Err(PasswordError::TooWeak));
        assert!(PasswordService::check_strength("Tr4vel-Kiosk-Meadow-91", &[]).is_ok());
    }
}
