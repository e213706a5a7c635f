//! Authorization policy for class and membership operations.
//!
//! The policy is a pure function of the acting subject's [`Seat`] in a class,
//! the target's seat (for member-targeting actions) and the requested
//! [`Action`]. It never performs I/O; callers look the seats up first.
//!
//! | Action | Requirement |
//! |--------|-------------|
//! | Read class / list members | actor is a member |
//! | Update / delete class | actor is Administrator or higher |
//! | Join | actor is not a member |
//! | Leave (self) | actor is a member and not the Owner |
//! | Remove member | actor >= Administrator and actor strictly outranks target |
//! | Set role (non-Owner) | actor >= Administrator and actor strictly outranks target |
//! | Set role to Owner | actor is Owner; resolves to a handoff |
//!
//! Non-membership is reported as [`Denial::NotFound`] so that non-members
//! cannot tell whether a class exists.

use uuid::Uuid;

use crate::errors::AppError;
use crate::role::Role;

/// A subject's place in one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    pub user_id: Uuid,
    pub role: Role,
}

impl Seat {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadClass,
    UpdateClass,
    DeleteClass,
    ListMembers,
    JoinClass,
    LeaveClass,
    RemoveMember,
    SetRole(Role),
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::ReadClass => "read_class",
            Action::UpdateClass => "update_class",
            Action::DeleteClass => "delete_class",
            Action::ListMembers => "list_members",
            Action::JoinClass => "join_class",
            Action::LeaveClass => "leave_class",
            Action::RemoveMember => "remove_member",
            Action::SetRole(_) => "set_role",
        }
    }
}

/// What the caller should execute once an action is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Single-row role update of the target.
    AssignRole(Role),
    /// Paired update: actor becomes Administrator, target becomes Owner.
    Handoff,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("class not found")]
    NotFound,
    #[error("member not found")]
    TargetNotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("user is already enrolled")]
    AlreadyEnrolled,
    #[error("new owner must be chosen before user can leave class")]
    OwnershipRequired,
}

impl Denial {
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::NotFound | Denial::TargetNotFound => "not_found",
            Denial::Forbidden(_) => "forbidden",
            Denial::AlreadyEnrolled => "already_enrolled",
            Denial::OwnershipRequired => "ownership_required",
        }
    }
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotFound => AppError::not_found("class"),
            Denial::TargetNotFound => AppError::not_found("member"),
            Denial::Forbidden(msg) => AppError::forbidden(msg),
            Denial::AlreadyEnrolled => AppError::AlreadyEnrolled,
            Denial::OwnershipRequired => AppError::OwnershipRequired,
        }
    }
}

/// Decides whether `actor` may perform `action`, optionally against `target`.
///
/// `actor` is `None` when the acting subject has no membership in the class;
/// `target` is `None` when the targeted user has no membership. `target` is
/// ignored for actions that do not address another member.
pub fn authorize(
    action: Action,
    actor: Option<Seat>,
    target: Option<Seat>,
) -> Result<Decision, Denial> {
    match action {
        Action::JoinClass => match actor {
            Some(_) => Err(Denial::AlreadyEnrolled),
            None => Ok(Decision::Allow),
        },
        Action::ReadClass | Action::ListMembers => {
            member(actor)?;
            Ok(Decision::Allow)
        }
        Action::UpdateClass | Action::DeleteClass => {
            let actor = member(actor)?;
            if !actor.role.at_least(Role::Administrator) {
                return Err(Denial::Forbidden("administrator role required"));
            }
            Ok(Decision::Allow)
        }
        Action::LeaveClass => {
            let actor = member(actor)?;
            if actor.role == Role::Owner {
                return Err(Denial::OwnershipRequired);
            }
            Ok(Decision::Allow)
        }
        Action::RemoveMember => {
            over_target(member(actor)?, target)?;
            Ok(Decision::Allow)
        }
        Action::SetRole(new_role) => {
            let actor = member(actor)?;
            over_target(actor, target)?;
            if new_role == Role::Owner {
                if actor.role != Role::Owner {
                    return Err(Denial::Forbidden("only the owner can transfer ownership"));
                }
                return Ok(Decision::Handoff);
            }
            Ok(Decision::AssignRole(new_role))
        }
    }
}

fn member(actor: Option<Seat>) -> Result<Seat, Denial> {
    actor.ok_or(Denial::NotFound)
}

/// Shared rule for actions addressed at another member.
fn over_target(actor: Seat, target: Option<Seat>) -> Result<Seat, Denial> {
    if target.is_some_and(|t| t.user_id == actor.user_id) {
        return Err(Denial::Forbidden("cannot target yourself; use leave instead"));
    }
    if !actor.role.at_least(Role::Administrator) {
        return Err(Denial::Forbidden("administrator role required"));
    }
    let target = target.ok_or(Denial::TargetNotFound)?;
    if !actor.role.outranks(target.role) {
        return Err(Denial::Forbidden("must outrank the target member"));
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(role: Role) -> Seat {
        Seat::new(Uuid::new_v4(), role)
    }

    #[test]
    fn test_non_member_sees_not_found() {
        for action in [
            Action::ReadClass,
            Action::UpdateClass,
            Action::DeleteClass,
            Action::ListMembers,
            Action::LeaveClass,
            Action::RemoveMember,
            Action::SetRole(Role::Student),
        ] {
            assert_eq!(
                authorize(action, None, Some(seat(Role::Student))),
                Err(Denial::NotFound),
                "{}",
                action.label()
            );
        }
    }

    #[test]
    fn test_any_member_can_read_and_list() {
        for role in Role::ALL {
            assert_eq!(
                authorize(Action::ReadClass, Some(seat(role)), None),
                Ok(Decision::Allow)
            );
            assert_eq!(
                authorize(Action::ListMembers, Some(seat(role)), None),
                Ok(Decision::Allow)
            );
        }
    }

    #[test]
    fn test_update_and_delete_require_administrator() {
        for action in [Action::UpdateClass, Action::DeleteClass] {
            assert!(matches!(
                authorize(action, Some(seat(Role::Student)), None),
                Err(Denial::Forbidden(_))
            ));
            assert_eq!(
                authorize(action, Some(seat(Role::Administrator)), None),
                Ok(Decision::Allow)
            );
            assert_eq!(
                authorize(action, Some(seat(Role::Owner)), None),
                Ok(Decision::Allow)
            );
        }
    }

    #[test]
    fn test_join_rejects_existing_member() {
        assert_eq!(authorize(Action::JoinClass, None, None), Ok(Decision::Allow));
        assert_eq!(
            authorize(Action::JoinClass, Some(seat(Role::Student)), None),
            Err(Denial::AlreadyEnrolled)
        );
    }

    #[test]
    fn test_owner_cannot_leave_without_handoff() {
        assert_eq!(
            authorize(Action::LeaveClass, Some(seat(Role::Owner)), None),
            Err(Denial::OwnershipRequired)
        );
        assert_eq!(
            authorize(Action::LeaveClass, Some(seat(Role::Administrator)), None),
            Ok(Decision::Allow)
        );
        assert_eq!(
            authorize(Action::LeaveClass, Some(seat(Role::Student)), None),
            Ok(Decision::Allow)
        );
    }

    #[test]
    fn test_actor_not_outranking_target_is_forbidden() {
        for actor_role in Role::ALL {
            for target_role in Role::ALL {
                if actor_role.outranks(target_role) {
                    continue;
                }
                let actor = seat(actor_role);
                let target = seat(target_role);
                assert!(
                    matches!(
                        authorize(Action::RemoveMember, Some(actor), Some(target)),
                        Err(Denial::Forbidden(_))
                    ),
                    "remove {actor_role} -> {target_role}"
                );
                for new_role in Role::ALL {
                    assert!(
                        matches!(
                            authorize(Action::SetRole(new_role), Some(actor), Some(target)),
                            Err(Denial::Forbidden(_))
                        ),
                        "set {actor_role} -> {target_role} as {new_role}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_self_targeting_is_forbidden_for_every_role() {
        for role in Role::ALL {
            let me = seat(role);
            assert!(matches!(
                authorize(Action::RemoveMember, Some(me), Some(me)),
                Err(Denial::Forbidden(_))
            ));
            assert!(matches!(
                authorize(Action::SetRole(Role::Student), Some(me), Some(me)),
                Err(Denial::Forbidden(_))
            ));
        }
    }

    #[test]
    fn test_administrator_cannot_touch_peer_administrator() {
        let actor = seat(Role::Administrator);
        let peer = seat(Role::Administrator);
        assert!(matches!(
            authorize(Action::RemoveMember, Some(actor), Some(peer)),
            Err(Denial::Forbidden(_))
        ));
    }

    #[test]
    fn test_missing_target_is_not_found_for_administrators() {
        assert_eq!(
            authorize(Action::RemoveMember, Some(seat(Role::Owner)), None),
            Err(Denial::TargetNotFound)
        );
        // a student probing for members learns nothing beyond "forbidden"
        assert!(matches!(
            authorize(Action::RemoveMember, Some(seat(Role::Student)), None),
            Err(Denial::Forbidden(_))
        ));
    }

    #[test]
    fn test_assign_non_owner_role() {
        assert_eq!(
            authorize(
                Action::SetRole(Role::Administrator),
                Some(seat(Role::Owner)),
                Some(seat(Role::Student))
            ),
            Ok(Decision::AssignRole(Role::Administrator))
        );
        assert_eq!(
            authorize(
                Action::SetRole(Role::Student),
                Some(seat(Role::Owner)),
                Some(seat(Role::Administrator))
            ),
            Ok(Decision::AssignRole(Role::Student))
        );
        assert_eq!(
            authorize(
                Action::SetRole(Role::Administrator),
                Some(seat(Role::Administrator)),
                Some(seat(Role::Student))
            ),
            Ok(Decision::AssignRole(Role::Administrator))
        );
    }

    #[test]
    fn test_only_owner_can_hand_off() {
        assert_eq!(
            authorize(
                Action::SetRole(Role::Owner),
                Some(seat(Role::Owner)),
                Some(seat(Role::Student))
            ),
            Ok(Decision::Handoff)
        );
        assert!(matches!(
            authorize(
                Action::SetRole(Role::Owner),
                Some(seat(Role::Administrator)),
                Some(seat(Role::Student))
            ),
            Err(Denial::Forbidden(_))
        ));
    }

    #[test]
    fn test_denial_maps_onto_error_taxonomy() {
        assert!(matches!(AppError::from(Denial::NotFound), AppError::NotFound(_)));
        assert!(matches!(
            AppError::from(Denial::Forbidden("x")),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            AppError::from(Denial::AlreadyEnrolled),
            AppError::AlreadyEnrolled
        ));
        assert!(matches!(
            AppError::from(Denial::OwnershipRequired),
            AppError::OwnershipRequired
        ));
    }
}
