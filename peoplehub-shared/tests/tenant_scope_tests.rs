/// Model-level tenant scoping tests
///
/// Requires `DATABASE_URL`; returns early without it.

mod common;

use common::*;
use peoplehub_shared::{
    models::department::Department,
    tenancy::{scope, EntityKind, Page, ScopeError},
};
use uuid::Uuid;

#[tokio::test]
async fn test_find_distinguishes_missing_from_foreign() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let eng = Department::create(&mut conn, &fx.acme, department("ENG", None)).await.unwrap();

    let own: Department = scope::find(&mut conn, &fx.acme, eng.id).await.unwrap();
    assert_eq!(own.tenant_id, fx.acme.tenant_id);

    let foreign = scope::find::<Department>(&mut conn, &fx.globex, eng.id).await;
    assert!(matches!(foreign, Err(ScopeError::Forbidden { kind: EntityKind::Department, .. })));

    let missing = scope::find::<Department>(&mut conn, &fx.acme, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(ScopeError::NotFound { .. })));

    drop(conn);
    fx.cleanup().await;
}

#[tokio::test]
async fn test_list_only_returns_own_rows() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    Department::create(&mut conn, &fx.acme, department("ENG", None)).await.unwrap();
    Department::create(&mut conn, &fx.acme, department("OPS", None)).await.unwrap();
    Department::create(&mut conn, &fx.globex, department("ENG", None)).await.unwrap();

    let acme: Vec<Department> = scope::list(&mut conn, &fx.acme, Page::default()).await.unwrap();
    let globex: Vec<Department> = scope::list(&mut conn, &fx.globex, Page::default()).await.unwrap();

    assert_eq!(acme.len(), 2);
    assert_eq!(globex.len(), 1);
    assert!(acme.iter().all(|d| d.tenant_id == fx.acme.tenant_id));

    drop(conn);
    fx.cleanup().await;
}

#[tokio::test]
async fn test_cross_tenant_parent_is_rejected() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let foreign = Department::create(&mut conn, &fx.globex, department("ENG", None)).await.unwrap();

    let result = Department::create(&mut conn, &fx.acme, department("SUB", Some(foreign.id))).await;
    assert!(matches!(
        result,
        Err(ScopeError::CrossTenantReference { field: "parent_id", .. })
    ));

    let result = Department::create(&mut conn, &fx.acme, department("SUB", Some(Uuid::new_v4()))).await;
    assert!(matches!(result, Err(ScopeError::MissingReference { .. })));

    let acme: Vec<Department> = scope::list(&mut conn, &fx.acme, Page::default()).await.unwrap();
    assert!(acme.is_empty());

    drop(conn);
    fx.cleanup().await;
}

#[tokio::test]
async fn test_deleted_rows_disappear_from_scope() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    let eng = Department::create(&mut conn, &fx.acme, department("ENG", None)).await.unwrap();

    let foreign_delete = Department::delete(&mut conn, &fx.globex, eng.id).await;
    assert!(matches!(foreign_delete, Err(ScopeError::Forbidden { .. })));

    Department::delete(&mut conn, &fx.acme, eng.id).await.unwrap();
    let gone = scope::find::<Department>(&mut conn, &fx.acme, eng.id).await;
    assert!(matches!(gone, Err(ScopeError::NotFound { .. })));

    // the code is free again
    Department::create(&mut conn, &fx.acme, department("ENG", None)).await.unwrap();

    drop(conn);
    fx.cleanup().await;
}

#[tokio::test]
async fn test_same_code_in_two_tenants_but_not_twice_in_one() {
    let Some(fx) = Fixture::new().await else { return };
    let mut conn = fx.pool.acquire().await.unwrap();

    Department::create(&mut conn, &fx.acme, department("ENG", None)).await.unwrap();
    Department::create(&mut conn, &fx.globex, department("ENG", None)).await.unwrap();

    let duplicate = Department::create(&mut conn, &fx.acme, department("ENG", None)).await;
    assert!(matches!(duplicate, Err(ScopeError::Conflict(_))));

    drop(conn);
    fx.cleanup().await;
}
