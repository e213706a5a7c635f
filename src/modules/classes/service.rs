use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use roster_core::{Action, AppError};
use roster_models::{Class, ClassId, CreateClassDto, Member, UpdateClassDto, UserId};

use crate::access::enforce;
use crate::coordinator::{MembershipCoordinator, with_deadline};
use crate::metrics::{track_class_created, track_class_deactivated};
use crate::storage::ClassStore;

#[derive(Clone)]
pub struct ClassService {
    store: Arc<dyn ClassStore>,
    coordinator: MembershipCoordinator,
    timeout: Duration,
}

impl ClassService {
    pub fn new(store: Arc<dyn ClassStore>, timeout: Duration) -> Self {
        Self {
            coordinator: MembershipCoordinator::new(store.clone(), timeout),
            store,
            timeout,
        }
    }

    /// Returns the class if `subject` is one of its members.
    #[instrument(skip(self))]
    pub async fn get_class(&self, subject: UserId, class_id: ClassId) -> Result<Class, AppError> {
        with_deadline(self.timeout, "get_class", async {
            let actor = self.store.member_by_user_and_class(subject, class_id).await?;
            enforce(Action::ReadClass, actor.as_ref(), None)?;

            self.active_class(class_id).await
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_classes(&self, subject: UserId) -> Result<Vec<Class>, AppError> {
        with_deadline(self.timeout, "list_classes", async {
            Ok::<_, AppError>(self.store.classes_for_user(subject).await?)
        })
        .await
    }

    /// Creates a class with `subject` as its Owner.
    #[instrument(skip(self))]
    pub async fn create_class(
        &self,
        subject: UserId,
        dto: CreateClassDto,
    ) -> Result<Class, AppError> {
        let name = dto.name.trim().to_string();
        let (class, _owner) = self
            .coordinator
            .create_class_with_owner(name, subject)
            .await?;

        track_class_created();
        tracing::info!(class_id = %class.id, "class created");
        Ok(class)
    }

    #[instrument(skip(self))]
    pub async fn update_class(
        &self,
        subject: UserId,
        class_id: ClassId,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        let actor = self.authorized_actor(subject, class_id, Action::UpdateClass).await?;

        // only the fields present in the request are written
        self.coordinator
            .update_class(class_id, &actor, dto.trimmed_name(), dto.unit_change())
            .await
    }

    /// Deactivates the class and removes every member in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_class(&self, subject: UserId, class_id: ClassId) -> Result<(), AppError> {
        let actor = self.authorized_actor(subject, class_id, Action::DeleteClass).await?;

        let purged = self
            .coordinator
            .deactivate_class_and_purge_members(class_id, &actor)
            .await?;

        track_class_deactivated(purged);
        tracing::info!(%class_id, purged, "class deactivated");
        Ok(())
    }

    /// Looks up `subject`'s seat and checks it may perform `action`.
    async fn authorized_actor(
        &self,
        subject: UserId,
        class_id: ClassId,
        action: Action,
    ) -> Result<Member, AppError> {
        let actor = with_deadline(self.timeout, action.label(), async {
            Ok::<_, AppError>(self.store.member_by_user_and_class(subject, class_id).await?)
        })
        .await?;
        enforce(action, actor.as_ref(), None)?;
        actor.ok_or_else(|| AppError::not_found("class"))
    }

    async fn active_class(&self, class_id: ClassId) -> Result<Class, AppError> {
        self.store
            .class_by_id(class_id)
            .await?
            .filter(|class| class.active)
            .ok_or_else(|| AppError::not_found("class"))
    }
}
