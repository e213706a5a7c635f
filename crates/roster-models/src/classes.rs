//! Class and membership domain models and DTOs.

use roster_core::{Role, Seat};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::ids::{ClassId, MemberId, UnitId, UserId};

/// A classroom. Deleting a class only flips `active`; rows are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub current_unit: Option<UnitId>,
    pub active: bool,
}

impl Class {
    /// A new active class with no current unit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ClassId::new(),
            name: name.into(),
            current_unit: None,
            active: true,
        }
    }
}

/// One user's enrollment in one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Member {
    pub id: MemberId,
    pub user_id: UserId,
    pub class_id: ClassId,
    pub role: Role,
}

impl Member {
    pub fn new(user_id: UserId, class_id: ClassId, role: Role) -> Self {
        Self {
            id: MemberId::new(),
            user_id,
            class_id,
            role,
        }
    }

    /// The member's seat as seen by the authorization policy.
    pub fn seat(&self) -> Seat {
        Seat::new(self.user_id.into_inner(), self.role)
    }
}

fn validate_class_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if (1..=255).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::new("class_name")
            .with_message("name must be between 1 and 255 characters".into()))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClassDto {
    #[validate(custom(function = "validate_class_name"))]
    #[schema(example = "Algebra I")]
    pub name: String,
}

/// Partial update of a class.
///
/// An omitted `current_unit` leaves it unchanged; `null` or `""` clears it.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClassDto {
    #[validate(custom(function = "validate_class_name"))]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "roster_core::serde::deserialize_patch_uuid"
    )]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub current_unit: Option<Option<Uuid>>,
}

impl UpdateClassDto {
    /// The new name, trimmed, if one was given.
    pub fn trimmed_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim)
    }

    /// `Some(None)` clears the current unit; `None` leaves it unchanged.
    pub fn unit_change(&self) -> Option<Option<UnitId>> {
        self.current_unit.map(|unit| unit.map(UnitId::from_uuid))
    }
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct SetRoleDto {
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassListResponse {
    pub classes: Vec<Class>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberListResponse {
    pub members: Vec<Member>,
}
