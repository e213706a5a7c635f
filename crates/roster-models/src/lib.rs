//! # Roster Models
//!
//! Domain models and DTOs for the Roster API.
//!
//! # Modules
//!
//! - [`ids`]: Strongly-typed UUID newtypes for every entity
//! - [`classes`]: Class and member entities, request DTOs and list responses
//!
//! # Example
//!
//! ```ignore
//! use roster_models::{Class, Member, CreateClassDto};
//! use roster_core::{Action, authorize};
//!
//! let seat = member.map(|m| m.seat());
//! authorize(Action::ReadClass, seat, None)?;
//! ```

pub mod classes;
pub mod ids;

// Re-export commonly used types at crate root for convenience
pub use classes::{
    Class, ClassListResponse, CreateClassDto, Member, MemberListResponse, SetRoleDto,
    UpdateClassDto,
};
pub use ids::{ClassId, MemberId, UnitId, UserId};
