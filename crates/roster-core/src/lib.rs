//! # Roster Core
//!
//! Core types, errors, and authorization rules for the Roster API.
//!
//! - [`errors`]: Application error taxonomy with HTTP response conversion
//! - [`role`]: The Student < Administrator < Owner hierarchy
//! - [`policy`]: Pure authorization decisions for class and member actions
//! - [`scopes`]: OAuth scope names required per operation
//! - [`serde`]: Custom serde deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use roster_core::policy::{Action, Seat, authorize};
//! use roster_core::Role;
//!
//! let actor = Seat::new(owner_id, Role::Owner);
//! let target = Seat::new(student_id, Role::Student);
//! let decision = authorize(Action::SetRole(Role::Owner), Some(actor), Some(target))?;
//! ```

pub mod errors;
pub mod policy;
pub mod role;
pub mod scopes;
pub mod serde;

pub use errors::AppError;
pub use policy::{Action, Decision, Denial, Seat, authorize};
pub use role::{Role, RoleError};
