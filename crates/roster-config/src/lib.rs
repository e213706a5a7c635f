//! # Roster Config
//!
//! Configuration types for the Roster API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`jwt`]: JWT verification configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: Connection pool sizing
//! - [`service`]: Operation deadlines and storage backend selection
//!
//! # Example
//!
//! ```ignore
//! use roster_config::{CorsConfig, DatabaseConfig, JwtConfig, ServiceConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let service_config = ServiceConfig::from_env();
//! ```

pub mod cors;
pub mod database;
pub mod jwt;
pub mod service;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use service::{ServiceConfig, StorageBackend};
