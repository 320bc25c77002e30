//! Asynchronous audit trail writer

pub mod activity_logger;

pub use activity_logger::{ActivityLogWorkers, ActivityLogger, LoggerConfig};
