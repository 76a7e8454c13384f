//! Stock Engine (C6): atomic update, threshold evaluation, cooldown-guarded
//! alert fan-out, exactly per spec.md §4.3.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::error::CoreResult;
use crate::tenant::{TenantId, TenantStore};
use crate::ws::{GroupKey, WsHub, WsOutboundMessage};

use super::models::Stock;
use super::repository::StockRepository;
use super::state::{AlertType, UpdateType};

/// Default suppression window for a given `(tenantId, storeCode, itemCode,
/// alertType)`; configurable per deployment, 0 disables cooldown entirely.
pub const DEFAULT_ALERT_COOLDOWN_SECS: i64 = 60;

pub struct StockEngine {
    tenants: TenantStore,
    ws_hub: Arc<WsHub>,
    alert_cooldown_secs: i64,
}

impl StockEngine {
    pub fn new(tenants: TenantStore, ws_hub: Arc<WsHub>) -> Self {
        Self { tenants, ws_hub, alert_cooldown_secs: DEFAULT_ALERT_COOLDOWN_SECS }
    }

    pub fn with_alert_cooldown_secs(mut self, secs: i64) -> Self {
        self.alert_cooldown_secs = secs;
        self
    }

    pub async fn get(&self, tenant_id: &TenantId, store_code: &str, item_code: &str) -> CoreResult<Stock> {
        let pool = self.tenants.pool(tenant_id).await?;
        StockRepository::find(&pool, tenant_id, store_code, item_code)
            .await?
            .ok_or_else(|| crate::error::CoreError::NotFound(format!("stock {store_code}/{item_code} not found")))
    }

    pub async fn list(&self, tenant_id: &TenantId, store_code: &str) -> CoreResult<Vec<Stock>> {
        let pool = self.tenants.pool(tenant_id).await?;
        StockRepository::list_by_store(&pool, tenant_id, store_code).await
    }

    pub async fn list_low(&self, tenant_id: &TenantId, store_code: &str) -> CoreResult<Vec<Stock>> {
        let pool = self.tenants.pool(tenant_id).await?;
        StockRepository::list_low(&pool, tenant_id, store_code).await
    }

    pub async fn list_reorder_alerts(&self, tenant_id: &TenantId, store_code: &str) -> CoreResult<Vec<Stock>> {
        let pool = self.tenants.pool(tenant_id).await?;
        StockRepository::list_reorder_alerts(&pool, tenant_id, store_code).await
    }

    pub async fn history(&self, tenant_id: &TenantId, store_code: &str, item_code: &str, limit: i64) -> CoreResult<Vec<super::models::StockUpdate>> {
        let pool = self.tenants.pool(tenant_id).await?;
        StockRepository::history(&pool, tenant_id, store_code, item_code, limit).await
    }

    pub async fn update_minimum(&self, tenant_id: &TenantId, store_code: &str, item_code: &str, minimum_quantity: Decimal) -> CoreResult<()> {
        let pool = self.tenants.pool(tenant_id).await?;
        StockRepository::update_minimum(&pool, tenant_id, store_code, item_code, minimum_quantity).await
    }

    pub async fn update_reorder(&self, tenant_id: &TenantId, store_code: &str, item_code: &str, reorder_point: Decimal, reorder_quantity: Decimal) -> CoreResult<()> {
        let pool = self.tenants.pool(tenant_id).await?;
        StockRepository::update_reorder(&pool, tenant_id, store_code, item_code, reorder_point, reorder_quantity).await
    }

    /// The single Update operation spec.md §4.3 specifies: CAS the
    /// quantity, append the audit row, evaluate both thresholds, broadcast
    /// whichever alerts survive cooldown.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        tenant_id: &TenantId,
        store_code: &str,
        item_code: &str,
        update_type: UpdateType,
        quantity_change: Decimal,
        reference_id: Option<&str>,
        operator_id: Option<&str>,
        note: Option<&str>,
    ) -> CoreResult<Stock> {
        let pool = self.tenants.pool(tenant_id).await?;
        let (before, after) = StockRepository::apply_update(&pool, tenant_id, store_code, item_code, quantity_change, reference_id).await?;
        StockRepository::record_update(
            &pool, tenant_id, store_code, item_code, update_type, quantity_change, before, after, reference_id, operator_id, note,
        )
        .await?;

        let minimum = StockRepository::find(&pool, tenant_id, store_code, item_code)
            .await?
            .map(|s| (s.minimum_quantity, s.reorder_point))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));

        if minimum.0 > Decimal::ZERO && after < minimum.0 {
            self.maybe_alert(tenant_id, store_code, item_code, AlertType::MinimumStock, after, minimum.0).await?;
        }
        if minimum.1 > Decimal::ZERO && after <= minimum.1 {
            self.maybe_alert(tenant_id, store_code, item_code, AlertType::ReorderPoint, after, minimum.1).await?;
        }

        self.get(tenant_id, store_code, item_code).await
    }

    async fn maybe_alert(
        &self,
        tenant_id: &TenantId,
        store_code: &str,
        item_code: &str,
        alert_type: AlertType,
        current_quantity: Decimal,
        threshold: Decimal,
    ) -> CoreResult<()> {
        let pool = self.tenants.pool(tenant_id).await?;
        let may_fire = StockRepository::try_start_cooldown(&pool, tenant_id, store_code, item_code, alert_type, self.alert_cooldown_secs).await?;
        if !may_fire {
            return Ok(());
        }
        let message = WsOutboundMessage::StockAlert {
            alert_type: alert_type.wire_name(),
            tenant_id: tenant_id.to_string(),
            store_code: store_code.to_string(),
            item_code: item_code.to_string(),
            current_quantity,
            threshold,
            timestamp: chrono::Utc::now(),
        };
        let key = GroupKey { tenant_id: tenant_id.to_string(), store_code: store_code.to_string() };
        self.ws_hub.broadcast(&key, message);
        Ok(())
    }

    /// "Catch-up" alerts sent to a socket on connect (spec.md §4.6 step 4):
    /// every currently-violating threshold in the store, still subject to
    /// the same cooldown as a live alert would be.
    pub async fn catch_up_alerts(&self, tenant_id: &TenantId, store_code: &str) -> Vec<WsOutboundMessage> {
        let Ok(pool) = self.tenants.pool(tenant_id).await else { return Vec::new() };
        let mut out = Vec::new();
        if let Ok(low) = StockRepository::list_low(&pool, tenant_id, store_code).await {
            for stock in low {
                out.push(WsOutboundMessage::StockAlert {
                    alert_type: AlertType::MinimumStock.wire_name(),
                    tenant_id: tenant_id.to_string(),
                    store_code: store_code.to_string(),
                    item_code: stock.item_code,
                    current_quantity: stock.current_quantity,
                    threshold: stock.minimum_quantity,
                    timestamp: chrono::Utc::now(),
                });
            }
        }
        if let Ok(reorder) = StockRepository::list_reorder_alerts(&pool, tenant_id, store_code).await {
            for stock in reorder {
                out.push(WsOutboundMessage::StockAlert {
                    alert_type: AlertType::ReorderPoint.wire_name(),
                    tenant_id: tenant_id.to_string(),
                    store_code: store_code.to_string(),
                    item_code: stock.item_code,
                    current_quantity: stock.current_quantity,
                    threshold: stock.reorder_point,
                    timestamp: chrono::Utc::now(),
                });
            }
        }
        out
    }
}
