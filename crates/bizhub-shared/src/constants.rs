//! Application-wide constants

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const ACTIVITY_LOG_PAGE_SIZE: u32 = 50;
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 28_800;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const DEFAULT_EXPIRING_SOON_DAYS: i64 = 30;
pub const RENEWAL_TERM_DAYS: i64 = 365;
pub const DEFAULT_REVENUE_PERCENTAGE: f64 = 10.0;
