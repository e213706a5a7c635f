//! Process-local storage backend.
//!
//! All tables sit behind one `tokio::sync::Mutex`. A transaction holds the
//! lock for its whole lifetime and writes into a staged copy of the tables;
//! commit swaps the copy in, drop or rollback throws it away. Transactions are
//! therefore serializable, and an abandoned transaction (deadline expiry,
//! panic) leaves no trace.
//!
//! The store enforces the same constraints as the Postgres schema: one seat
//! per (user, class), at most one owner per class, and members only in active
//! classes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use roster_core::Role;
use roster_models::{Class, ClassId, Member, MemberId, UnitId, UserId};

use super::{ClassStore, StoreError, StoreTransaction};

/// A transactional step at which a fault can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertClass,
    InsertMember,
    LockSeat,
    UpdateClass,
    DeactivateClass,
    SetMemberRole,
    DeleteMember,
    DeleteMembers,
    Commit,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Fail,
    Stall(Duration),
}

#[derive(Debug, Clone, Default)]
struct Tables {
    classes: HashMap<ClassId, Class>,
    members: HashMap<MemberId, Member>,
}

impl Tables {
    fn insert_member(&mut self, member: &Member) -> Result<(), StoreError> {
        if !self
            .classes
            .get(&member.class_id)
            .is_some_and(|class| class.active)
        {
            return Err(StoreError::RowNotFound);
        }
        if self
            .members
            .values()
            .any(|m| m.user_id == member.user_id && m.class_id == member.class_id)
        {
            return Err(StoreError::UniqueViolation("members_user_class_key".into()));
        }
        if member.role == Role::Owner && self.owner_of(member.class_id).is_some() {
            return Err(StoreError::UniqueViolation("members_one_owner_per_class".into()));
        }
        self.members.insert(member.id, member.clone());
        Ok(())
    }

    fn set_member_role(
        &mut self,
        member_id: MemberId,
        from: Role,
        to: Role,
    ) -> Result<bool, StoreError> {
        let Some(class_id) = self
            .members
            .get(&member_id)
            .filter(|m| m.role == from)
            .map(|m| m.class_id)
        else {
            return Ok(false);
        };
        if to == Role::Owner && self.owner_of(class_id).is_some_and(|id| id != member_id) {
            return Err(StoreError::UniqueViolation("members_one_owner_per_class".into()));
        }
        if let Some(member) = self.members.get_mut(&member_id) {
            member.role = to;
        }
        Ok(true)
    }

    fn owner_of(&self, class_id: ClassId) -> Option<MemberId> {
        self.members
            .values()
            .find(|m| m.class_id == class_id && m.role == Role::Owner)
            .map(|m| m.id)
    }
}

/// In-memory [`ClassStore`]. Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryClassStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Mutex<Vec<(FailPoint, Fault)>>>,
}

impl MemoryClassStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next transactional step at `point` fail with a backend error.
    pub async fn fail_next(&self, point: FailPoint) {
        self.faults.lock().await.push((point, Fault::Fail));
    }

    /// Makes the next transactional step at `point` sleep for `delay` first.
    pub async fn stall_next(&self, point: FailPoint, delay: Duration) {
        self.faults.lock().await.push((point, Fault::Stall(delay)));
    }

    async fn take_fault(&self, point: FailPoint) -> Option<Fault> {
        let mut faults = self.faults.lock().await;
        let index = faults.iter().position(|(p, _)| *p == point)?;
        Some(faults.remove(index).1)
    }
}

#[async_trait]
impl ClassStore for MemoryClassStore {
    async fn class_by_id(&self, id: ClassId) -> Result<Option<Class>, StoreError> {
        Ok(self.tables.lock().await.classes.get(&id).cloned())
    }

    async fn classes_for_user(&self, user_id: UserId) -> Result<Vec<Class>, StoreError> {
        let tables = self.tables.lock().await;
        let mut classes: Vec<Class> = tables
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.classes.get(&m.class_id))
            .filter(|c| c.active)
            .cloned()
            .collect();
        classes.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.id.into_inner().cmp(&b.id.into_inner()))
        });
        Ok(classes)
    }

    async fn member_by_user_and_class(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<Option<Member>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .values()
            .find(|m| m.user_id == user_id && m.class_id == class_id)
            .cloned())
    }

    async fn members_by_class(&self, class_id: ClassId) -> Result<Vec<Member>, StoreError> {
        let tables = self.tables.lock().await;
        let mut members: Vec<Member> = tables
            .members
            .values()
            .filter(|m| m.class_id == class_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            b.role
                .compare(a.role)
                .then_with(|| a.id.into_inner().cmp(&b.id.into_inner()))
        });
        Ok(members)
    }

    async fn insert_member(&self, member: &Member) -> Result<(), StoreError> {
        self.tables.lock().await.insert_member(member)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            store: self.clone(),
        }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    store: MemoryClassStore,
}

impl MemoryTransaction {
    async fn step(&self, point: FailPoint) -> Result<(), StoreError> {
        match self.store.take_fault(point).await {
            Some(Fault::Fail) => Err(StoreError::Backend(format!(
                "injected failure at {point:?}"
            ))),
            Some(Fault::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_class(&mut self, class: &Class) -> Result<(), StoreError> {
        self.step(FailPoint::InsertClass).await?;
        if self.staged.classes.contains_key(&class.id) {
            return Err(StoreError::UniqueViolation("classes_pkey".into()));
        }
        self.staged.classes.insert(class.id, class.clone());
        Ok(())
    }

    async fn insert_member(&mut self, member: &Member) -> Result<(), StoreError> {
        self.step(FailPoint::InsertMember).await?;
        self.staged.insert_member(member)
    }

    async fn lock_seat(&mut self, member_id: MemberId, role: Role) -> Result<bool, StoreError> {
        self.step(FailPoint::LockSeat).await?;
        Ok(self
            .staged
            .members
            .get(&member_id)
            .is_some_and(|m| m.role == role))
    }

    async fn update_class(
        &mut self,
        id: ClassId,
        name: Option<&str>,
        current_unit: Option<Option<UnitId>>,
    ) -> Result<Option<Class>, StoreError> {
        self.step(FailPoint::UpdateClass).await?;
        let Some(class) = self.staged.classes.get_mut(&id).filter(|c| c.active) else {
            return Ok(None);
        };
        if let Some(name) = name {
            class.name = name.to_string();
        }
        if let Some(unit) = current_unit {
            class.current_unit = unit;
        }
        Ok(Some(class.clone()))
    }

    async fn deactivate_class(&mut self, id: ClassId) -> Result<bool, StoreError> {
        self.step(FailPoint::DeactivateClass).await?;
        match self.staged.classes.get_mut(&id) {
            Some(class) if class.active => {
                class.active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_member_role(
        &mut self,
        member_id: MemberId,
        from: Role,
        to: Role,
    ) -> Result<bool, StoreError> {
        self.step(FailPoint::SetMemberRole).await?;
        self.staged.set_member_role(member_id, from, to)
    }

    async fn delete_member(&mut self, member_id: MemberId, role: Role) -> Result<bool, StoreError> {
        self.step(FailPoint::DeleteMember).await?;
        if self
            .staged
            .members
            .get(&member_id)
            .is_some_and(|m| m.role == role)
        {
            self.staged.members.remove(&member_id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_members_by_class(&mut self, class_id: ClassId) -> Result<u64, StoreError> {
        self.step(FailPoint::DeleteMembers).await?;
        let before = self.staged.members.len();
        self.staged.members.retain(|_, m| m.class_id != class_id);
        Ok((before - self.staged.members.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.step(FailPoint::Commit).await?;
        let MemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
