use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use roster_core::{Action, AppError, Decision, Role};
use roster_models::{ClassId, Member, UserId};

use crate::access::enforce;
use crate::coordinator::{MembershipCoordinator, with_deadline};
use crate::metrics::{
    track_member_joined, track_member_left, track_ownership_handoff, track_role_changed,
};
use crate::storage::{ClassStore, StoreError};

#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn ClassStore>,
    coordinator: MembershipCoordinator,
    timeout: Duration,
}

impl MemberService {
    pub fn new(store: Arc<dyn ClassStore>, timeout: Duration) -> Self {
        Self {
            coordinator: MembershipCoordinator::new(store.clone(), timeout),
            store,
            timeout,
        }
    }

    /// Enrolls `subject` as a Student.
    #[instrument(skip(self))]
    pub async fn join_class(&self, subject: UserId, class_id: ClassId) -> Result<Member, AppError> {
        with_deadline(self.timeout, "join_class", async {
            let existing = self.store.member_by_user_and_class(subject, class_id).await?;
            enforce(Action::JoinClass, existing.as_ref(), None)?;

            let member = Member::new(subject, class_id, Role::Student);
            match self.store.insert_member(&member).await {
                Ok(()) => {}
                // lost a race with a concurrent join for the same pair
                Err(StoreError::UniqueViolation(_)) => return Err(AppError::AlreadyEnrolled),
                Err(StoreError::RowNotFound) => return Err(AppError::not_found("class")),
                Err(err) => return Err(err.into()),
            }

            track_member_joined();
            Ok(member)
        })
        .await
    }

    /// Removes `subject` from the class, or removes `target` when it names
    /// another user.
    #[instrument(skip(self))]
    pub async fn leave_class(
        &self,
        subject: UserId,
        class_id: ClassId,
        target: Option<UserId>,
    ) -> Result<(), AppError> {
        let (actor, leaving, removed_by_other) =
            with_deadline(self.timeout, "leave_class", async {
                let actor = self.store.member_by_user_and_class(subject, class_id).await?;

                let (leaving, removed_by_other) = match target.filter(|t| *t != subject) {
                    None => {
                        enforce(Action::LeaveClass, actor.as_ref(), None)?;
                        (actor.clone(), false)
                    }
                    Some(target) => {
                        let target =
                            self.store.member_by_user_and_class(target, class_id).await?;
                        enforce(Action::RemoveMember, actor.as_ref(), target.as_ref())?;
                        (target, true)
                    }
                };
                Ok::<_, AppError>((actor, leaving, removed_by_other))
            })
            .await?;

        let (Some(actor), Some(leaving)) = (actor, leaving) else {
            return Err(AppError::not_found("member"));
        };
        self.coordinator.remove_member(&actor, &leaving).await?;

        track_member_left(removed_by_other);
        tracing::info!(user_id = %leaving.user_id, removed_by_other, "member left class");
        Ok(())
    }

    /// Changes the role of `target`. Promoting to Owner hands ownership over:
    /// the acting Owner becomes an Administrator in the same transaction.
    #[instrument(skip(self))]
    pub async fn set_role(
        &self,
        subject: UserId,
        class_id: ClassId,
        target: UserId,
        new_role: Role,
    ) -> Result<Member, AppError> {
        let (actor, target, decision) = with_deadline(self.timeout, "set_role", async {
            let actor = self.store.member_by_user_and_class(subject, class_id).await?;
            let target = self.store.member_by_user_and_class(target, class_id).await?;
            let decision = enforce(Action::SetRole(new_role), actor.as_ref(), target.as_ref())?;
            Ok::<_, AppError>((actor, target, decision))
        })
        .await?;

        let (Some(actor), Some(target)) = (actor, target) else {
            return Err(AppError::not_found("member"));
        };

        match decision {
            Decision::Handoff => {
                let promoted = self
                    .coordinator
                    .transfer_ownership(class_id, &actor, &target)
                    .await?;
                track_ownership_handoff();
                tracing::info!(from = %actor.user_id, to = %promoted.user_id, "ownership transferred");
                Ok(promoted)
            }
            Decision::AssignRole(role) => {
                let updated = self.coordinator.assign_role(&actor, &target, role).await?;
                track_role_changed(role.as_str());
                Ok(updated)
            }
            Decision::Allow => Ok(target),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_members(
        &self,
        subject: UserId,
        class_id: ClassId,
    ) -> Result<Vec<Member>, AppError> {
        with_deadline(self.timeout, "list_members", async {
            let actor = self.store.member_by_user_and_class(subject, class_id).await?;
            enforce(Action::ListMembers, actor.as_ref(), None)?;

            Ok::<_, AppError>(self.store.members_by_class(class_id).await?)
        })
        .await
    }
}
