//! # BizHub Core
//!
//! Domain entities, status state machines, role permissions, statistics,
//! repository traits (ports) and application services.

pub mod domain;
pub mod policy;
pub mod statistics;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
