//! Mapping from sqlx errors to domain errors

use bizhub_core::error::DomainError;
use tracing::error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Logs the failure and converts it. Constraint violations become
/// `Conflict` / `ValidationError` so callers get a 409 / 400 instead of a 500.
pub fn map_db_error(context: &str, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        let constraint = db.constraint().unwrap_or("unknown");
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return DomainError::Conflict(format!("{}: duplicate value ({})", context, constraint));
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return DomainError::Conflict(format!("{}: record is still referenced ({})", context, constraint));
            }
            Some(CHECK_VIOLATION) => {
                return DomainError::ValidationError(format!("{}: value out of range ({})", context, constraint));
            }
            _ => {}
        }
    }
    error!("Database error {}: {}", context, e);
    DomainError::DatabaseError(e.to_string())
}

/// Decodes a TEXT enum column. Unknown values surface as `DatabaseError`.
pub fn decode_column<T>(column: &str, raw: &str, parse: impl FnOnce(&str) -> Option<T>) -> Result<T, DomainError> {
    parse(raw).ok_or_else(|| {
        error!("Unknown value {:?} in column {}", raw, column);
        DomainError::DatabaseError(format!("unknown {} value '{}'", column, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_become_database_error() {
        let err = map_db_error("finding contract", sqlx::Error::RowNotFound);
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }

    #[test]
    fn test_unknown_enum_value_is_database_error() {
        let parse = |s: &str| (s == "ACTIVE").then_some(1u8);
        assert_eq!(decode_column("contracts.status", "ACTIVE", parse).unwrap(), 1);

        let err = decode_column("contracts.status", "ARCHIVED", parse).unwrap_err();
        assert!(matches!(err, DomainError::DatabaseError(msg) if msg.contains("ARCHIVED")));
    }
}
