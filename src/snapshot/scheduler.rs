//! Snapshot Scheduler (C8): cron-like evaluator for per-tenant schedules,
//! grounded on `config_watcher.rs`'s background-interval-loop shape
//! ("never crash, log and continue") and `sentinel/worker.rs`'s
//! poll-then-iterate-targets structure (spec.md §4.4).

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Timelike, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::tenant::{TenantId, TenantRegistry, TenantStore};

use super::models::{Interval, SnapshotSchedule};
use super::repository::SnapshotScheduleRepository;
use crate::stock::models::{StockSnapshot, StockSnapshotLine};
use crate::stock::repository::StockRepository;

const LEASE_JOB_ID: &str = "snapshot";
const SNAPSHOT_PAGE_SIZE: i64 = 10_000;

pub struct SnapshotScheduler {
    registry: TenantRegistry,
    tenants: TenantStore,
    /// How often the evaluator wakes up to check for due schedules.
    tick_interval: Duration,
    /// Lease TTL: roughly 2x the expected duration of one firing
    /// (spec.md §4.4 step 1).
    lease_ttl: ChronoDuration,
    /// Unique per-process identity staked as the lease holder.
    holder: String,
}

impl SnapshotScheduler {
    pub fn new(registry: TenantRegistry, tenants: TenantStore, tick_interval: Duration, lease_ttl: ChronoDuration) -> Self {
        Self { registry, tenants, tick_interval, lease_ttl, holder: Uuid::new_v4().to_string() }
    }

    /// Runs forever, evaluating every tenant's schedule once per tick.
    /// Never returns; errors within a single tenant's firing are logged and
    /// the loop continues onto the next tenant.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.ensure_schema().await {
                error!(target: "SNAPSHOT", "failed to ensure schema: {e}");
                continue;
            }
            let tenant_ids = match self.registry.list_ids().await {
                Ok(ids) => ids,
                Err(e) => {
                    error!(target: "SNAPSHOT", "failed to list tenants: {e}");
                    continue;
                }
            };
            for tenant_id in tenant_ids {
                if let Err(e) = self.evaluate_tenant(&tenant_id).await {
                    warn!(target: "SNAPSHOT", "tenant {tenant_id}: {e}");
                }
            }
        }
    }

    async fn ensure_schema(&self) -> CoreResult<()> {
        SnapshotScheduleRepository::ensure_schema(self.registry.pool()).await
    }

    async fn evaluate_tenant(&self, tenant_id: &TenantId) -> CoreResult<()> {
        let Some(schedule) = SnapshotScheduleRepository::find(self.registry.pool(), tenant_id).await? else {
            return Ok(());
        };
        if !schedule.enabled {
            return Ok(());
        }
        let now = Utc::now();
        if !is_due(&schedule, now) {
            return Ok(());
        }

        let acquired = SnapshotScheduleRepository::try_acquire_lease(
            self.registry.pool(),
            tenant_id,
            LEASE_JOB_ID,
            &self.holder,
            self.lease_ttl,
        )
        .await?;
        if !acquired {
            info!(target: "SNAPSHOT", "tenant {tenant_id}: lease held elsewhere, skipping this tick");
            return Ok(());
        }

        let outcome = self.fire(tenant_id, &schedule, now).await;

        if let Err(e) = SnapshotScheduleRepository::release_lease(self.registry.pool(), tenant_id, LEASE_JOB_ID, &self.holder).await {
            warn!(target: "SNAPSHOT", "tenant {tenant_id}: failed to release lease: {e}");
        }
        outcome
    }

    async fn fire(&self, tenant_id: &TenantId, schedule: &SnapshotSchedule, now: DateTime<Utc>) -> CoreResult<()> {
        let pool = self.tenants.pool(tenant_id).await?;

        let stores = if schedule.targets_all_stores() {
            StockRepository::list_store_codes(&pool, tenant_id).await?
        } else {
            schedule.target_stores.clone()
        };

        for store_code in &stores {
            let snapshot = build_snapshot(&pool, tenant_id, store_code, "snapshot-scheduler").await?;
            info!(
                target: "SNAPSHOT",
                "tenant {tenant_id} store {store_code}: snapshot {} ({} items)",
                snapshot.snapshot_id, snapshot.total_items
            );
        }

        SnapshotScheduleRepository::mark_executed(self.registry.pool(), tenant_id, now).await?;

        let cutoff = now - ChronoDuration::days(schedule.retention_days as i64);
        let deleted = StockRepository::delete_snapshots_older_than(&pool, tenant_id, cutoff).await?;
        if deleted > 0 {
            info!(target: "SNAPSHOT", "tenant {tenant_id}: retention sweep removed {deleted} snapshot(s)");
        }

        Ok(())
    }
}

/// Builds and persists one snapshot for `(tenantId, storeCode)` by paging
/// through every stock row in batches of at most [`SNAPSHOT_PAGE_SIZE`]
/// (spec.md §4.4 step 3). Shared by the scheduled job and the on-demand
/// `/stock/snapshot` endpoint.
pub async fn build_snapshot(pool: &sqlx::PgPool, tenant_id: &TenantId, store_code: &str, created_by: &str) -> CoreResult<StockSnapshot> {
    let mut stocks = Vec::new();
    let mut total_quantity = Decimal::ZERO;
    let mut after: Option<String> = None;

    loop {
        let page = StockRepository::list_by_store_page(pool, tenant_id, store_code, after.as_deref(), SNAPSHOT_PAGE_SIZE).await?;
        let page_len = page.len();
        for stock in &page {
            total_quantity += stock.current_quantity;
            stocks.push(StockSnapshotLine { item_code: stock.item_code.clone(), current_quantity: stock.current_quantity });
        }
        after = page.last().map(|s| s.item_code.clone());
        if page_len < SNAPSHOT_PAGE_SIZE as usize {
            break;
        }
    }

    let snapshot = StockSnapshot {
        snapshot_id: Uuid::new_v4(),
        tenant_id: tenant_id.clone(),
        store_code: store_code.to_string(),
        total_items: stocks.len() as i64,
        total_quantity,
        stocks,
        created_by: created_by.to_string(),
        generate_date_time: Utc::now(),
    };
    StockRepository::insert_snapshot(pool, &snapshot).await?;
    Ok(snapshot)
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid calendar month arithmetic");
    (next_month_start - ChronoDuration::days(1)).day()
}

/// Whether `schedule`'s period (daily/weekly/monthly), day condition, and
/// hour/minute all match `now`, and it hasn't already fired this period.
fn is_due(schedule: &SnapshotSchedule, now: DateTime<Utc>) -> bool {
    if now.hour() != schedule.hour as u32 || now.minute() != schedule.minute as u32 {
        return false;
    }
    let day_matches = match schedule.interval {
        Interval::Daily => true,
        Interval::Weekly => {
            let target = schedule.day_of_week.unwrap_or(0);
            now.weekday().num_days_from_monday() as i32 == target
        }
        Interval::Monthly => {
            let requested = schedule.day_of_month.unwrap_or(1);
            let effective = (requested as u32).min(last_day_of_month(now.year(), now.month()));
            now.day() == effective
        }
    };
    if !day_matches {
        return false;
    }
    match schedule.last_executed_at {
        None => true,
        Some(last) => !same_period(schedule.interval, last, now),
    }
}

fn same_period(interval: Interval, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    match interval {
        Interval::Daily => a.date_naive() == b.date_naive(),
        Interval::Weekly => a.iso_week().year() == b.iso_week().year() && a.iso_week().week() == b.iso_week().week(),
        Interval::Monthly => a.year() == b.year() && a.month() == b.month(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule(interval: Interval, hour: i32, minute: i32, day_of_week: Option<i32>, day_of_month: Option<i32>) -> SnapshotSchedule {
        SnapshotSchedule {
            tenant_id: TenantId::parse("A1234").unwrap(),
            interval,
            hour,
            minute,
            day_of_week,
            day_of_month,
            retention_days: 3,
            target_stores: vec!["all".to_string()],
            enabled: true,
            last_executed_at: None,
            etag: crate::tenant::Etag::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn daily_fires_at_matching_hour_minute() {
        let s = schedule(Interval::Daily, 2, 0, None, None);
        let now = Utc.with_ymd_and_hms(2026, 7, 27, 2, 0, 0).unwrap();
        assert!(is_due(&s, now));
    }

    #[test]
    fn daily_does_not_refire_same_day() {
        let mut s = schedule(Interval::Daily, 2, 0, None, None);
        let now = Utc.with_ymd_and_hms(2026, 7, 27, 2, 0, 0).unwrap();
        s.last_executed_at = Some(now);
        assert!(!is_due(&s, now));
    }

    #[test]
    fn monthly_clamps_to_last_day_of_february() {
        let s = schedule(Interval::Monthly, 2, 0, None, Some(31));
        // 2026-02-28 is the last day of February (2026 is not a leap year).
        let last_day = Utc.with_ymd_and_hms(2026, 2, 28, 2, 0, 0).unwrap();
        assert!(is_due(&s, last_day));
        let day_before = Utc.with_ymd_and_hms(2026, 2, 27, 2, 0, 0).unwrap();
        assert!(!is_due(&s, day_before));
    }

    #[test]
    fn weekly_matches_configured_day_of_week() {
        let s = schedule(Interval::Weekly, 3, 30, Some(0), None);
        // 2026-07-27 is a Monday.
        let monday = Utc.with_ymd_and_hms(2026, 7, 27, 3, 30, 0).unwrap();
        assert!(is_due(&s, monday));
        let tuesday = Utc.with_ymd_and_hms(2026, 7, 28, 3, 30, 0).unwrap();
        assert!(!is_due(&s, tuesday));
    }
}
