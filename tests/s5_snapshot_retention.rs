//! S5 — snapshot retention: once a tenant's schedule has executed for
//! several days, a retention sweep keeps only snapshots within the
//! configured window and removes everything older.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use kugel_pos_core::stock::models::{StockSnapshot, StockSnapshotLine};
use kugel_pos_core::stock::repository::StockRepository;
use kugel_pos_core::tenant::TenantId;

const RETENTION_DAYS: i64 = 3;

async fn insert_snapshot_at(pool: &sqlx::PgPool, tenant_id: &TenantId, store_code: &str, when: chrono::DateTime<Utc>) {
    let snapshot = StockSnapshot {
        snapshot_id: Uuid::new_v4(),
        tenant_id: tenant_id.clone(),
        store_code: store_code.to_string(),
        total_items: 1,
        total_quantity: Decimal::from(10),
        stocks: vec![StockSnapshotLine { item_code: "ITEM001".to_string(), current_quantity: Decimal::from(10) }],
        created_by: "snapshot-scheduler".to_string(),
        generate_date_time: when,
    };
    StockRepository::insert_snapshot(pool, &snapshot).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn retention_sweep_keeps_only_the_configured_window() {
    let pool = common::create_test_pool().await;
    common::ensure_schema(&pool).await;

    let tenant_id = TenantId::parse("S0005").unwrap();
    let now = Utc::now();
    let day1 = now - ChronoDuration::days(4);
    let day2 = now - ChronoDuration::days(3) - ChronoDuration::hours(1);
    let day3 = now - ChronoDuration::days(2);
    let day4 = now - ChronoDuration::days(1);
    let day5 = now;

    for when in [day1, day2, day3, day4, day5] {
        insert_snapshot_at(&pool, &tenant_id, "store001", when).await;
    }

    let before = StockRepository::list_snapshots(&pool, &tenant_id).await.unwrap();
    assert_eq!(before.len(), 5);

    let cutoff = now - ChronoDuration::days(RETENTION_DAYS);
    let deleted = StockRepository::delete_snapshots_older_than(&pool, &tenant_id, cutoff).await.unwrap();
    assert_eq!(deleted, 2, "days 1 and 2 fall outside the retention window");

    let remaining = StockRepository::list_snapshots(&pool, &tenant_id).await.unwrap();
    assert_eq!(remaining.len(), 3);
    let remaining_times: Vec<_> = remaining.iter().map(|s| s.generate_date_time).collect();
    assert!(remaining_times.contains(&day3));
    assert!(remaining_times.contains(&day4));
    assert!(remaining_times.contains(&day5));
}
