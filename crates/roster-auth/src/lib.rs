//! # Roster Auth
//!
//! Subject identity resolution for the Roster API.
//!
//! This crate provides:
//!
//! - [`claims`]: JWT claim structure carrying the subject and granted scopes
//! - [`jwt`]: Token creation and verification utilities
//! - [`identity`]: The [`IdentityResolver`] seam and its JWT implementation
//!
//! The rest of the service only ever sees a verified [`Subject`]; how the
//! bearer token was checked is this crate's concern.
//!
//! # Example
//!
//! ```ignore
//! use roster_auth::{IdentityResolver, JwtIdentityResolver, create_access_token};
//! use roster_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, vec!["classes.get".into()], &config)?;
//!
//! let resolver = JwtIdentityResolver::new(config);
//! let subject = resolver.resolve_subject(&token).await?;
//! assert!(subject.has_scope("classes.get"));
//! ```

pub mod claims;
pub mod identity;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use identity::{IdentityResolver, JwtIdentityResolver, Subject};
pub use jwt::{create_access_token, verify_token};
