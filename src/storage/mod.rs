//! Persistence of classes and memberships.
//!
//! Services talk to storage only through [`ClassStore`] (point reads and
//! single-row writes) and [`StoreTransaction`] (multi-row units used by the
//! coordinator). Two backends implement the contract:
//!
//! - [`postgres::PgClassStore`]: sqlx over a pooled Postgres connection
//! - [`memory::MemoryClassStore`]: process-local tables, used by tests and
//!   selectable with `STORAGE_BACKEND=memory`
//!
//! Every write that depends on a role read earlier (role changes, removals,
//! class updates and deactivation) goes through a [`StoreTransaction`].
//! Conditional writes report whether a row matched instead of failing, so the
//! caller decides how a lost race is surfaced.

use async_trait::async_trait;

use roster_core::{AppError, Role};
use roster_models::{Class, ClassId, Member, MemberId, UnitId, UserId};

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryClassStore};
pub use postgres::PgClassStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("row not found")]
    RowNotFound,

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::UniqueViolation(constraint);
        }
        match err {
            sqlx::Error::RowNotFound => StoreError::RowNotFound,
            other => StoreError::Database(other),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RowNotFound => AppError::not_found("record"),
            other => AppError::storage(other),
        }
    }
}

#[async_trait]
pub trait ClassStore: Send + Sync {
    async fn class_by_id(&self, id: ClassId) -> Result<Option<Class>, StoreError>;

    /// Active classes `user_id` is a member of, ordered by name.
    async fn classes_for_user(&self, user_id: UserId) -> Result<Vec<Class>, StoreError>;

    async fn member_by_user_and_class(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<Option<Member>, StoreError>;

    async fn members_by_class(&self, class_id: ClassId) -> Result<Vec<Member>, StoreError>;

    /// Inserts a member into an active class.
    ///
    /// Fails with [`StoreError::RowNotFound`] when the class is missing or
    /// inactive at insert time, and [`StoreError::UniqueViolation`] when the
    /// user already holds a seat.
    async fn insert_member(&self, member: &Member) -> Result<(), StoreError>;

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;
}

/// A unit of work. Dropping it without [`commit`](Self::commit) discards
/// every write made through it.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn insert_class(&mut self, class: &Class) -> Result<(), StoreError>;

    async fn insert_member(&mut self, member: &Member) -> Result<(), StoreError>;

    /// Locks a member row against concurrent changes for the rest of the
    /// transaction. Returns `false` if the member no longer holds `role`.
    async fn lock_seat(&mut self, member_id: MemberId, role: Role) -> Result<bool, StoreError>;

    /// Writes only the fields that are `Some` on an active class and returns
    /// the stored row, or `None` when no active class matched.
    async fn update_class(
        &mut self,
        id: ClassId,
        name: Option<&str>,
        current_unit: Option<Option<UnitId>>,
    ) -> Result<Option<Class>, StoreError>;

    /// Flips `active` to false; matches only a currently active class.
    async fn deactivate_class(&mut self, id: ClassId) -> Result<bool, StoreError>;

    async fn set_member_role(
        &mut self,
        member_id: MemberId,
        from: Role,
        to: Role,
    ) -> Result<bool, StoreError>;

    /// Deletes a member if its role still equals `role`.
    async fn delete_member(&mut self, member_id: MemberId, role: Role) -> Result<bool, StoreError>;

    async fn delete_members_by_class(&mut self, class_id: ClassId) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::RowNotFound));
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }

    #[test]
    fn test_other_errors_map_to_storage_failure() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(_)));
        assert!(matches!(AppError::from(err), AppError::Storage(_)));

        let err = StoreError::UniqueViolation("members_user_class_key".into());
        assert_eq!(AppError::from(err).code(), "storage_failure");
    }
}
