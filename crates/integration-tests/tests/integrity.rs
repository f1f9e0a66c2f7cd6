//! Integrity rules against clean and deliberately corrupted data.
//!
//! Constraints keep most rules from ever firing, so corruption here targets
//! the order arithmetic, which only application code maintains.
//!
//! Run with: cargo test -p retro-shop-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use sqlx::PgPool;

use retro_shop_db::integrity::{self, Violation};
use retro_shop_db::orders;
use retro_shop_integration_tests::{CUSTOMER_EMAIL, seed_defaults, user_by_email};

fn rules(violations: &[Violation]) -> Vec<&'static str> {
    violations.iter().map(|v| v.rule).collect()
}

#[sqlx::test(migrator = "retro_shop_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_empty_database_is_clean(pool: PgPool) {
    assert!(integrity::check(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrator = "retro_shop_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_seeded_database_is_clean(pool: PgPool) {
    seed_defaults(&pool).await.unwrap();
    let violations = integrity::check(&pool).await.unwrap();
    assert!(violations.is_empty(), "{violations:?}");
}

#[sqlx::test(migrator = "retro_shop_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_detects_wrong_total(pool: PgPool) {
    seed_defaults(&pool).await.unwrap();
    sqlx::query("UPDATE orders SET total_cents = total_cents + 1")
        .execute(&pool)
        .await
        .unwrap();

    let violations = integrity::check(&pool).await.unwrap();
    assert_eq!(rules(&violations), ["total_mismatch"]);
    assert!(violations[0].detail.contains("total_cents 1300"));
}

#[sqlx::test(migrator = "retro_shop_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_detects_wrong_line_total(pool: PgPool) {
    seed_defaults(&pool).await.unwrap();
    sqlx::query("UPDATE order_items SET line_total_cents = 1")
        .execute(&pool)
        .await
        .unwrap();

    let violations = integrity::check(&pool).await.unwrap();
    assert_eq!(rules(&violations), ["line_total_mismatch", "subtotal_mismatch"]);
}

#[sqlx::test(migrator = "retro_shop_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_recompute_repairs_stale_subtotal(pool: PgPool) {
    seed_defaults(&pool).await.unwrap();
    sqlx::query("UPDATE order_items SET quantity = 3, line_total_cents = 3897")
        .execute(&pool)
        .await
        .unwrap();

    let violations = integrity::check(&pool).await.unwrap();
    assert_eq!(rules(&violations), ["subtotal_mismatch"]);

    let customer = user_by_email(&pool, CUSTOMER_EMAIL).await.unwrap();
    let order = &orders::list_for_user(&pool, customer.id).await.unwrap()[0];
    let repaired = orders::recompute_totals(&pool, order.id).await.unwrap();
    assert_eq!(repaired.subtotal_cents.as_i32(), 3897);
    assert_eq!(repaired.total_cents.as_i32(), 3897);

    assert!(integrity::check(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrator = "retro_shop_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_detects_duplicate_carts_when_constraint_deferred(pool: PgPool) {
    seed_defaults(&pool).await.unwrap();
    let customer = user_by_email(&pool, CUSTOMER_EMAIL).await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    sqlx::query("SET CONSTRAINTS carts_user_id_status_key DEFERRED")
        .execute(&mut *tx)
        .await
        .unwrap();
    sqlx::query("INSERT INTO carts (user_id, status) VALUES ($1, 'active')")
        .bind(customer.id)
        .execute(&mut *tx)
        .await
        .unwrap();

    let violations = integrity::check_on(&mut tx).await.unwrap();
    assert_eq!(rules(&violations), ["duplicate_cart_status"]);
    assert!(violations[0].detail.contains("2 active carts"));

    tx.rollback().await.unwrap();
    assert!(integrity::check(&pool).await.unwrap().is_empty());
}
