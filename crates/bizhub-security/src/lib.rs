//! # BizHub Security
//!
//! Security utilities: JWT access tokens, password hashing and strength
//! checks, login rate limiting.

pub mod jwt;
pub mod password;
pub mod rate_limit;

pub use jwt::{Claims, JwtError, JwtService};
pub use password::{PasswordError, PasswordService};
pub use rate_limit::LoginRateLimiter;
