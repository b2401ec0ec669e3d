//! Data Models Module
//!
//! This module contains all data structures used throughout the auth service:
//! profiles, token claims, and request/response types with validation.

pub mod auth;
pub mod requests;
pub mod user;

// Re-export commonly used types
pub use auth::*;
pub use requests::*;
pub use user::*;
