//! All-or-nothing multi-row mutations.
//!
//! Each operation opens a [`StoreTransaction`], applies its writes in a fixed
//! order and commits. Any error, including a conditional write that matched no
//! row, rolls the transaction back before the error is returned. Operations
//! performed on another member's behalf first lock the acting seat at the
//! role it was authorized with, so a concurrent demotion cannot slip between
//! the check and the write. The whole
//! unit runs under the configured deadline; when it expires the transaction is
//! dropped, which discards its writes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use roster_core::{AppError, Role};
use roster_models::{Class, ClassId, Member, UnitId, UserId};

use crate::metrics::track_transaction_rollback;
use crate::storage::{ClassStore, StoreTransaction};

/// Runs `work` under `limit`, reporting expiry as a storage failure.
pub async fn with_deadline<T, F>(
    limit: Duration,
    operation: &'static str,
    work: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, limit_ms = limit.as_millis() as u64, "operation deadline exceeded");
            track_transaction_rollback(operation);
            Err(AppError::storage(anyhow::anyhow!(
                "operation deadline exceeded"
            )))
        }
    }
}

/// Commits on success, rolls back on failure.
async fn finish<T>(
    tx: Box<dyn StoreTransaction>,
    result: Result<T, AppError>,
    operation: &'static str,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            if let Err(err) = tx.commit().await {
                warn!(operation, error = %err, "commit failed, transaction rolled back");
                track_transaction_rollback(operation);
                return Err(err.into());
            }
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation, error = %rollback_err, "explicit rollback failed");
            }
            warn!(operation, error = %err, "transaction rolled back");
            track_transaction_rollback(operation);
            Err(err)
        }
    }
}

/// Fails with NotFound unless `actor` still holds the role it was authorized
/// with. The seat stays locked until the transaction ends.
async fn hold_seat(tx: &mut dyn StoreTransaction, actor: &Member) -> Result<(), AppError> {
    if !tx.lock_seat(actor.id, actor.role).await? {
        return Err(AppError::not_found("member"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MembershipCoordinator {
    store: Arc<dyn ClassStore>,
    timeout: Duration,
}

impl MembershipCoordinator {
    pub fn new(store: Arc<dyn ClassStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Inserts a new active class and its creator as Owner.
    #[instrument(skip(self))]
    pub async fn create_class_with_owner(
        &self,
        name: String,
        creator: UserId,
    ) -> Result<(Class, Member), AppError> {
        const OPERATION: &str = "create_class_with_owner";

        let class = Class::new(name);
        let owner = Member::new(creator, class.id, Role::Owner);

        with_deadline(self.timeout, OPERATION, async {
            let mut tx = self.store.begin().await?;
            let result = async {
                tx.insert_class(&class).await?;
                tx.insert_member(&owner).await?;
                Ok::<_, AppError>(())
            }
            .await;
            finish(tx, result, OPERATION).await
        })
        .await?;

        Ok((class, owner))
    }

    /// Writes the present fields of an active class on behalf of `actor`.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn update_class(
        &self,
        class_id: ClassId,
        actor: &Member,
        name: Option<&str>,
        current_unit: Option<Option<UnitId>>,
    ) -> Result<Class, AppError> {
        const OPERATION: &str = "update_class";

        with_deadline(self.timeout, OPERATION, async {
            let mut tx = self.store.begin().await?;
            let result = async {
                hold_seat(&mut *tx, actor).await?;
                tx.update_class(class_id, name, current_unit)
                    .await?
                    .ok_or_else(|| AppError::not_found("class"))
            }
            .await;
            finish(tx, result, OPERATION).await
        })
        .await
    }

    /// Flips the class inactive and deletes every member, `actor` included.
    /// Returns the number of members purged.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn deactivate_class_and_purge_members(
        &self,
        class_id: ClassId,
        actor: &Member,
    ) -> Result<u64, AppError> {
        const OPERATION: &str = "deactivate_class_and_purge_members";

        with_deadline(self.timeout, OPERATION, async {
            let mut tx = self.store.begin().await?;
            let result = async {
                hold_seat(&mut *tx, actor).await?;
                if !tx.deactivate_class(class_id).await? {
                    return Err(AppError::not_found("class"));
                }
                let purged = tx.delete_members_by_class(class_id).await?;
                Ok::<_, AppError>(purged)
            }
            .await;
            finish(tx, result, OPERATION).await
        })
        .await
    }

    /// Demotes `from` (the current Owner) to Administrator and promotes `to`
    /// to Owner. Both writes are conditional on the roles observed by the
    /// caller. Returns `to` as stored after the handoff.
    #[instrument(skip(self, from, to), fields(from = %from.user_id, to = %to.user_id))]
    pub async fn transfer_ownership(
        &self,
        class_id: ClassId,
        from: &Member,
        to: &Member,
    ) -> Result<Member, AppError> {
        const OPERATION: &str = "transfer_ownership";

        if from.class_id != class_id || to.class_id != class_id {
            return Err(AppError::not_found("member"));
        }

        with_deadline(self.timeout, OPERATION, async {
            let mut tx = self.store.begin().await?;
            let result = async {
                if !tx
                    .set_member_role(from.id, Role::Owner, Role::Administrator)
                    .await?
                {
                    return Err(AppError::not_found("member"));
                }
                if !tx.set_member_role(to.id, to.role, Role::Owner).await? {
                    return Err(AppError::not_found("member"));
                }
                Ok::<_, AppError>(())
            }
            .await;
            finish(tx, result, OPERATION).await
        })
        .await?;

        Ok(Member {
            role: Role::Owner,
            ..to.clone()
        })
    }

    /// Deletes `leaving`. When `actor` is someone else, their seat is held
    /// for the duration.
    #[instrument(skip(self, actor, leaving), fields(actor = %actor.user_id, leaving = %leaving.user_id))]
    pub async fn remove_member(&self, actor: &Member, leaving: &Member) -> Result<(), AppError> {
        const OPERATION: &str = "remove_member";

        with_deadline(self.timeout, OPERATION, async {
            let mut tx = self.store.begin().await?;
            let result = async {
                if actor.id != leaving.id {
                    hold_seat(&mut *tx, actor).await?;
                }
                if !tx.delete_member(leaving.id, leaving.role).await? {
                    return Err(AppError::not_found("member"));
                }
                Ok::<_, AppError>(())
            }
            .await;
            finish(tx, result, OPERATION).await
        })
        .await
    }

    /// Sets `target` to `role` (never Owner) while `actor`'s seat is held.
    #[instrument(skip(self, actor, target), fields(actor = %actor.user_id, target = %target.user_id))]
    pub async fn assign_role(
        &self,
        actor: &Member,
        target: &Member,
        role: Role,
    ) -> Result<Member, AppError> {
        const OPERATION: &str = "assign_role";

        with_deadline(self.timeout, OPERATION, async {
            let mut tx = self.store.begin().await?;
            let result = async {
                hold_seat(&mut *tx, actor).await?;
                if !tx.set_member_role(target.id, target.role, role).await? {
                    return Err(AppError::not_found("member"));
                }
                Ok::<_, AppError>(())
            }
            .await;
            finish(tx, result, OPERATION).await
        })
        .await?;

        Ok(Member {
            role,
            ..target.clone()
        })
    }
}
