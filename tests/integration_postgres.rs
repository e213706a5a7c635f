//! The same flows as the in-memory suites, against a real Postgres database.
//!
//! Run with `DATABASE_URL` pointing at a scratch server:
//! `cargo test --test integration_postgres -- --ignored`

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{TestUser, create_class, join, send, setup_test_app};
use roster::roster_core::Role;
use roster::roster_models::{ClassId, Member, UserId};
use roster::storage::{ClassStore, PgClassStore, StoreError, StoreTransaction};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_class_lifecycle(pool: PgPool) {
    let app = setup_test_app(Arc::new(PgClassStore::new(pool.clone())));
    let owner = TestUser::new();
    let student = TestUser::new();

    let class_id = create_class(&app, &owner, "Algebra").await;
    let class_uuid: uuid::Uuid = class_id.parse().unwrap();
    assert_eq!(join(&app, &student, &class_id).await, StatusCode::CREATED);
    assert_eq!(join(&app, &student, &class_id).await, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/classes/{class_id}/members/{}", student.id),
        Some(&owner.token),
        Some(json!({ "role": "owner" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");

    let roles: Vec<(uuid::Uuid, i16)> =
        sqlx::query_as("SELECT user_id, role FROM members WHERE class_id = $1")
            .bind(class_uuid)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(roles.len(), 2);
    assert!(roles.contains(&(owner.id, Role::Administrator.ordinal())));
    assert!(roles.contains(&(student.id, Role::Owner.ordinal())));

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/classes/{class_id}"),
        Some(&student.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (active, members): (bool, i64) = sqlx::query_as(
        r#"SELECT c.active, (SELECT COUNT(*) FROM members m WHERE m.class_id = c.id)
           FROM classes c WHERE c.id = $1"#,
    )
    .bind(class_uuid)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!active);
    assert_eq!(members, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_schema_allows_one_owner_per_class(pool: PgPool) {
    let store = PgClassStore::new(pool);
    let app = setup_test_app(Arc::new(store.clone()));
    let owner = TestUser::new();
    let class_id: ClassId = create_class(&app, &owner, "Algebra").await.parse().unwrap();

    let second_owner = Member::new(UserId::new(), class_id, Role::Owner);
    assert!(matches!(
        store.insert_member(&second_owner).await,
        Err(StoreError::UniqueViolation(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_insert_into_missing_class_is_row_not_found(pool: PgPool) {
    let store = PgClassStore::new(pool);
    let member = Member::new(UserId::new(), ClassId::new(), Role::Student);
    assert!(matches!(
        store.insert_member(&member).await,
        Err(StoreError::RowNotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_concurrent_joins_enroll_once(pool: PgPool) {
    let app = setup_test_app(Arc::new(PgClassStore::new(pool.clone())));
    let owner = TestUser::new();
    let student = TestUser::new();
    let class_id = create_class(&app, &owner, "Algebra").await;

    let (first, second) = tokio::join!(
        join(&app, &student, &class_id),
        join(&app, &student, &class_id)
    );
    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM members WHERE class_id = $1 AND user_id = $2")
            .bind(class_id.parse::<uuid::Uuid>().unwrap())
            .bind(student.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_concurrent_patches_of_different_fields_both_persist(pool: PgPool) {
    let app = setup_test_app(Arc::new(PgClassStore::new(pool)));
    let owner = TestUser::new();
    let class_id = create_class(&app, &owner, "Algebra").await;
    let unit = uuid::Uuid::new_v4();
    let path = format!("/api/classes/{class_id}");

    let (renamed, advanced) = tokio::join!(
        send(&app, "PATCH", &path, Some(&owner.token), Some(json!({ "name": "Geometry" }))),
        send(
            &app,
            "PATCH",
            &path,
            Some(&owner.token),
            Some(json!({ "current_unit": unit })),
        )
    );
    assert_eq!(renamed.0, StatusCode::OK);
    assert_eq!(advanced.0, StatusCode::OK);

    let (status, body) = send(&app, "GET", &path, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Geometry");
    assert_eq!(body["current_unit"], unit.to_string());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_join_after_delete_is_not_found(pool: PgPool) {
    let app = setup_test_app(Arc::new(PgClassStore::new(pool)));
    let owner = TestUser::new();
    let student = TestUser::new();
    let class_id = create_class(&app, &owner, "Algebra").await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/classes/{class_id}"),
        Some(&owner.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(join(&app, &student, &class_id).await, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_lock_seat_checks_current_role(pool: PgPool) {
    let store = PgClassStore::new(pool);
    let app = setup_test_app(Arc::new(store.clone()));
    let owner = TestUser::new();
    let class_id: ClassId = create_class(&app, &owner, "Algebra").await.parse().unwrap();
    let seat = store
        .member_by_user_and_class(UserId::from_uuid(owner.id), class_id)
        .await
        .unwrap()
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(tx.lock_seat(seat.id, Role::Owner).await.unwrap());
    assert!(!tx.lock_seat(seat.id, Role::Administrator).await.unwrap());
    tx.rollback().await.unwrap();
}
