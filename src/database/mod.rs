//! Database Module
//!
//! Database connection management and migrations for the auth service.

pub mod connection;

// Re-export commonly used types
pub use connection::{run_migrations, DatabaseConfig, DatabasePool};
