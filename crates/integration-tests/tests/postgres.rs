//! Fulfillment properties against `PostgreSQL`.
//!
//! Each test gets a fresh database with the back-office migrations applied.
//! They need `DATABASE_URL` pointing at a server the user can create
//! databases on, so they are ignored by default.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use madziarynka_backoffice::db::PgStore;
use madziarynka_backoffice::models::{ConflictCheckInput, CreateOrderInput, ShiftInput};
use madziarynka_backoffice::services::{OrderService, ScheduleService, ServiceError};
use madziarynka_core::{OrderLineInput, OrderStatus, TimeRange, UserId};
use madziarynka_integration_tests::{seed_ingredient, seed_product, seed_user, stock_of};

fn line(product_id: madziarynka_core::ProductId, quantity: i32) -> OrderLineInput {
    OrderLineInput {
        product_id,
        quantity,
        unit_price: Decimal::from(12),
    }
}

fn hours(start: u32, end: u32) -> TimeRange {
    TimeRange::new(
        Utc.with_ymd_and_hms(2026, 3, 2, start, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 2, end, 0, 0).unwrap(),
    )
    .unwrap()
}

#[sqlx::test(migrations = "../backoffice/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_completion_conserves_stock(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let user = seed_user(&store, "Ola").await;
    let ing1 = seed_ingredient(&store, "ing1", 100).await;
    let ing2 = seed_ingredient(&store, "ing2", 100).await;
    let a = seed_product(&store, "A", 10, &[(ing1, 5)]).await;
    let b = seed_product(&store, "B", 10, &[(ing1, 2), (ing2, 1)]).await;
    let service = OrderService::new(&store);

    let order = service
        .create_order(
            user,
            CreateOrderInput {
                items: vec![line(a, 2), line(b, 3)],
            },
        )
        .await
        .unwrap()
        .order;
    let completed = service.complete_order(order.id, Some(user)).await.unwrap();

    assert_eq!(completed.status, OrderStatus::Completed);
    assert_eq!(stock_of(&store, ing1).await, Decimal::from(84));
    assert_eq!(stock_of(&store, ing2).await, Decimal::from(97));

    let actions: Vec<String> = sqlx::query_scalar("SELECT action FROM logs ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(actions, ["CREATE_ORDER", "COMPLETE_ORDER"]);
}

#[sqlx::test(migrations = "../backoffice/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_completion_deducts_once(pool: PgPool) {
    let store = PgStore::new(pool);
    let user = seed_user(&store, "Ola").await;
    let x = seed_ingredient(&store, "X", 100).await;
    let a = seed_product(&store, "A", 10, &[(x, 7)]).await;
    let order = OrderService::new(&store)
        .create_order(
            user,
            CreateOrderInput {
                items: vec![line(a, 1)],
            },
        )
        .await
        .unwrap()
        .order
        .id;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                OrderService::new(&store)
                    .complete_order(order, Some(user))
                    .await
            })
        })
        .collect();

    let mut completed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => completed += 1,
            Err(ServiceError::OrderAlreadyCompleted(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(completed, 1);
    assert_eq!(stock_of(&store, x).await, Decimal::from(93));
}

#[sqlx::test(migrations = "../backoffice/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_failed_audit_write_keeps_completion(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let user = seed_user(&store, "Ola").await;
    let x = seed_ingredient(&store, "X", 10).await;
    let a = seed_product(&store, "A", 10, &[(x, 4)]).await;
    let service = OrderService::new(&store);
    let order = service
        .create_order(
            user,
            CreateOrderInput {
                items: vec![line(a, 3)],
            },
        )
        .await
        .unwrap()
        .order
        .id;

    // Unknown acting user: the log insert violates its foreign key.
    service
        .complete_order(order, Some(UserId::new(9999)))
        .await
        .unwrap();

    assert_eq!(stock_of(&store, x).await, Decimal::from(-2));
    let logged: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM logs WHERE action = 'COMPLETE_ORDER'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(logged, 0);
}

#[sqlx::test(migrations = "../backoffice/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_empty_order_writes_nothing(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let user = seed_user(&store, "Ola").await;

    let err = OrderService::new(&store)
        .create_order(user, CreateOrderInput { items: vec![] })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[sqlx::test(migrations = "../backoffice/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_adjacent_shifts_do_not_conflict(pool: PgPool) {
    let store = PgStore::new(pool);
    let user = seed_user(&store, "Ola").await;
    let service = ScheduleService::new(&store);
    service
        .create_shift(
            ShiftInput {
                user_id: user,
                range: hours(9, 17),
            },
            Some(user),
        )
        .await
        .unwrap();

    let adjacent = service
        .has_conflict(ConflictCheckInput {
            user_id: user,
            range: hours(17, 21),
            exclude_shift_id: None,
        })
        .await
        .unwrap();
    let overlapping = service
        .has_conflict(ConflictCheckInput {
            user_id: user,
            range: hours(16, 18),
            exclude_shift_id: None,
        })
        .await
        .unwrap();

    assert!(!adjacent.has_conflict);
    assert!(overlapping.has_conflict);
}
