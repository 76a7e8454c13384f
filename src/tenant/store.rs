//! Generic optimistic-concurrency helpers shared by every entity repository.
//!
//! spec.md §9 asks for a store API shaped as `loadWithTag` /
//! `casSave(oldTag, newState) -> newTag | conflict`. Because each entity has
//! its own table and column set, the concrete `loadWithTag` lives on each
//! repository (`TerminalRepository`, `CartRepository`, `StockRepository`,
//! …); this module carries the one truly generic piece: the CAS primitive
//! itself, built on a Postgres `UPDATE ... WHERE etag = $old RETURNING
//! etag` which reports how many rows were touched.

use sqlx::PgPool;
use std::sync::Arc;

use super::etag::Etag;
use super::pool_cache::TenantPoolCache;
use super::models::TenantId;
use crate::error::{CoreError, CoreResult};

/// Facade every engine holds to reach its tenant's database. Wraps the pool
/// cache (C1) so call sites never talk to `sqlx` connection strings
/// directly.
#[derive(Clone)]
pub struct TenantStore {
    pools: Arc<TenantPoolCache>,
}

impl TenantStore {
    pub fn new(pools: Arc<TenantPoolCache>) -> Self {
        Self { pools }
    }

    pub async fn pool(&self, tenant_id: &TenantId) -> CoreResult<PgPool> {
        self.pools.get(tenant_id).await
    }
}

/// Applies a single-column CAS write: `UPDATE <table> SET etag = $new_etag,
/// updated_at = now() WHERE id = $id AND etag = $old_etag`. Returns the
/// fresh `Etag` on success, or `CoreError::Conflict` if zero rows matched
/// (either the row moved on or it never existed — callers distinguish by a
/// prior `NotFound` check if they need to).
pub async fn cas_update_etag(
    pool: &PgPool,
    table: &str,
    id_column: &str,
    id: &str,
    old_etag: &Etag,
) -> CoreResult<Etag> {
    let new_etag = Etag::new();
    let sql = format!(
        "UPDATE {table} SET etag = $1, updated_at = now() WHERE {id_column} = $2 AND etag = $3"
    );
    let result = sqlx::query(&sql)
        .bind(new_etag.as_str())
        .bind(id)
        .bind(old_etag.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::Conflict(format!(
            "etag mismatch on {table}.{id_column} = {id}"
        )));
    }
    Ok(new_etag)
}
