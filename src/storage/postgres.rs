use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::instrument;

use roster_core::Role;
use roster_models::{Class, ClassId, Member, MemberId, UnitId, UserId};

use super::{ClassStore, StoreError, StoreTransaction};

const MEMBER_COLUMNS: &str = "id, user_id, class_id, role";

/// `members.role` is stored as its ordinal.
#[derive(Debug, FromRow)]
struct MemberRow {
    id: MemberId,
    user_id: UserId,
    class_id: ClassId,
    role: i16,
}

impl TryFrom<MemberRow> for Member {
    type Error = StoreError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let role = Role::try_from(row.role).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Member {
            id: row.id,
            user_id: row.user_id,
            class_id: row.class_id,
            role,
        })
    }
}

fn into_members(rows: Vec<MemberRow>) -> Result<Vec<Member>, StoreError> {
    rows.into_iter().map(Member::try_from).collect()
}

#[derive(Clone, Debug)]
pub struct PgClassStore {
    db: PgPool,
}

impl PgClassStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClassStore for PgClassStore {
    #[instrument(skip(self))]
    async fn class_by_id(&self, id: ClassId) -> Result<Option<Class>, StoreError> {
        let class = sqlx::query_as::<_, Class>(
            "SELECT id, name, current_unit, active FROM classes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(class)
    }

    #[instrument(skip(self))]
    async fn classes_for_user(&self, user_id: UserId) -> Result<Vec<Class>, StoreError> {
        let classes = sqlx::query_as::<_, Class>(
            r#"SELECT c.id, c.name, c.current_unit, c.active
               FROM classes c
               JOIN members m ON m.class_id = c.id
               WHERE m.user_id = $1 AND c.active
               ORDER BY c.name, c.id"#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(classes)
    }

    #[instrument(skip(self))]
    async fn member_by_user_and_class(
        &self,
        user_id: UserId,
        class_id: ClassId,
    ) -> Result<Option<Member>, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE user_id = $1 AND class_id = $2"
        ))
        .bind(user_id)
        .bind(class_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Member::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn members_by_class(&self, class_id: ClassId) -> Result<Vec<Member>, StoreError> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE class_id = $1 ORDER BY role DESC, id"
        ))
        .bind(class_id)
        .fetch_all(&self.db)
        .await?;

        into_members(rows)
    }

    #[instrument(skip(self), fields(class_id = %member.class_id, user_id = %member.user_id))]
    async fn insert_member(&self, member: &Member) -> Result<(), StoreError> {
        // The share lock makes a concurrent deactivation either wait for this
        // insert or be seen by it.
        let result = sqlx::query(
            r#"INSERT INTO members (id, user_id, class_id, role)
               SELECT $1, $2, $3, $4
               WHERE EXISTS (
                   SELECT 1 FROM classes WHERE id = $3 AND active FOR SHARE
               )"#,
        )
        .bind(member.id)
        .bind(member.user_id)
        .bind(member.class_id)
        .bind(member.role.ordinal())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound);
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }
}

/// Wraps a sqlx transaction; sqlx rolls back on drop.
struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn insert_class(&mut self, class: &Class) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO classes (id, name, current_unit, active) VALUES ($1, $2, $3, $4)")
            .bind(class.id)
            .bind(&class.name)
            .bind(class.current_unit)
            .bind(class.active)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_member(&mut self, member: &Member) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO members (id, user_id, class_id, role) VALUES ($1, $2, $3, $4)")
            .bind(member.id)
            .bind(member.user_id)
            .bind(member.class_id)
            .bind(member.role.ordinal())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn lock_seat(&mut self, member_id: MemberId, role: Role) -> Result<bool, StoreError> {
        // FOR SHARE blocks concurrent role updates and deletes of the row
        // until this transaction ends.
        let row = sqlx::query("SELECT id FROM members WHERE id = $1 AND role = $2 FOR SHARE")
            .bind(member_id)
            .bind(role.ordinal())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.is_some())
    }

    async fn update_class(
        &mut self,
        id: ClassId,
        name: Option<&str>,
        current_unit: Option<Option<UnitId>>,
    ) -> Result<Option<Class>, StoreError> {
        let class = sqlx::query_as::<_, Class>(
            r#"UPDATE classes
               SET name = COALESCE($2, name),
                   current_unit = CASE WHEN $4 THEN $3 ELSE current_unit END
               WHERE id = $1 AND active
               RETURNING id, name, current_unit, active"#,
        )
        .bind(id)
        .bind(name)
        .bind(current_unit.flatten())
        .bind(current_unit.is_some())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(class)
    }

    async fn deactivate_class(&mut self, id: ClassId) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE classes SET active = FALSE WHERE id = $1 AND active")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_member_role(
        &mut self,
        member_id: MemberId,
        from: Role,
        to: Role,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE members SET role = $3 WHERE id = $1 AND role = $2")
            .bind(member_id)
            .bind(from.ordinal())
            .bind(to.ordinal())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_member(&mut self, member_id: MemberId, role: Role) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1 AND role = $2")
            .bind(member_id)
            .bind(role.ordinal())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_members_by_class(&mut self, class_id: ClassId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM members WHERE class_id = $1")
            .bind(class_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
